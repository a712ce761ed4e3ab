use async_trait::async_trait;
use orgchart_layout::layout::{BlockId, LayoutRequest, SolvedLayout};
use orgchart_layout::{
    ChartFilter, ChartSession, CollapseState, Config, DagreSolver, Department, Entity,
    LayoutConfig, LayoutSolver, OrgData, Position, SolverError, compute_chart_layout,
    prepare_layout,
};

/// Places blocks left to right on a single row, in request order.
struct RowSolver;

#[async_trait]
impl LayoutSolver for RowSolver {
    async fn solve(&self, request: &LayoutRequest) -> Result<SolvedLayout, SolverError> {
        let mut solved = SolvedLayout::default();
        let mut x = 0.0;
        for block in &request.blocks {
            solved.positions.insert(block.id.clone(), Position::new(x, 0.0));
            x += block.width + request.options.node_spacing;
        }
        Ok(solved)
    }
}

struct BrokenSolver;

#[async_trait]
impl LayoutSolver for BrokenSolver {
    async fn solve(&self, _request: &LayoutRequest) -> Result<SolvedLayout, SolverError> {
        Err(SolverError::Failed("engine unavailable".to_string()))
    }
}

fn big_team() -> Vec<Entity> {
    let mut org = vec![Entity::new("A", "Alice")];
    for id in ["B", "C", "D", "E", "F", "G"] {
        org.push(Entity::new(id, id).with_manager("A"));
    }
    org
}

fn expanded() -> CollapseState {
    CollapseState::new()
}

#[tokio::test]
async fn large_team_is_stacked_vertically() {
    let org = big_team();
    let config = LayoutConfig::default();

    let prepared = prepare_layout(&org, &expanded(), &config);
    let stack = prepared
        .request
        .block(&BlockId::Stack("A".to_string()))
        .expect("stack block");
    assert_eq!(stack.height, 700.0);
    assert_eq!(prepared.request.blocks.len(), 2);
    assert_eq!(prepared.request.edges.len(), 1);

    let layout = compute_chart_layout(&org, &expanded(), &config, &RowSolver).await;
    let top = layout.position("B").unwrap();
    for (slot, id) in ["B", "C", "D", "E", "F", "G"].iter().enumerate() {
        let pos = layout.position(id).unwrap();
        assert_eq!(pos.x, top.x, "{id} left the column");
        assert_eq!(pos.y, top.y + slot as f32 * 120.0, "{id} slot");
        assert_eq!(layout.nodes[*id].stacked_in.as_deref(), Some("A"));
    }
    assert_eq!(layout.edges.len(), 6);
    assert!(layout.edges.iter().all(|edge| edge.source == "A"));
}

#[tokio::test]
async fn small_team_keeps_individual_blocks() {
    let org: Vec<Entity> = big_team().into_iter().take(6).collect();
    let prepared = prepare_layout(&org, &expanded(), &LayoutConfig::default());
    assert!(prepared.request.stacks.is_empty());
    assert_eq!(prepared.request.blocks.len(), 6);
    assert_eq!(prepared.request.edges.len(), 5);
}

#[tokio::test]
async fn department_filter_lays_out_subset() {
    let departments = vec![Department::new("d1", "Eng"), Department::new("d2", "Ops")];
    let org = vec![
        Entity::new("cto", "Carla").with_department("d1"),
        Entity::new("dev", "Dan").with_manager("cto").with_department("d1"),
        Entity::new("coo", "Olga").with_department("d2"),
        Entity::new("ops", "Otto").with_manager("coo").with_department("d2"),
        Entity::new("ceo", "Cleo"),
    ];

    let mut session = ChartSession::new(Config::default());
    session.set_filter(ChartFilter::new().with_department("Eng"));
    let layout = session
        .layout(&org, &departments, &RowSolver)
        .await
        .into_layout()
        .unwrap();
    assert_eq!(layout.nodes.keys().collect::<Vec<_>>(), vec!["cto", "dev"]);
    assert_eq!(layout.edges.len(), 1);
}

#[tokio::test]
async fn dangling_manager_becomes_root() {
    let org = vec![
        Entity::new("A", "A"),
        Entity::new("B", "B").with_manager("nobody"),
    ];
    let layout = compute_chart_layout(&org, &expanded(), &LayoutConfig::default(), &RowSolver).await;
    assert_eq!(layout.nodes.len(), 2);
    assert!(layout.edges.is_empty());
    assert!(!layout.nodes["B"].has_subordinates);
}

#[tokio::test]
async fn solver_failure_degrades_to_origin() {
    let org = big_team();
    let layout =
        compute_chart_layout(&org, &expanded(), &LayoutConfig::default(), &BrokenSolver).await;
    assert!(layout.is_degraded());
    assert_eq!(layout.nodes.len(), 7);
    assert!(
        layout
            .nodes
            .values()
            .all(|node| node.position() == Position::ORIGIN)
    );
    assert_eq!(layout.edges.len(), 6);
}

#[tokio::test]
async fn collapsed_manager_hides_subtree() {
    let mut org = big_team();
    org.push(Entity::new("H", "H").with_manager("B"));
    let collapsed: CollapseState = ["B"].into_iter().collect();
    let layout = compute_chart_layout(&org, &collapsed, &LayoutConfig::default(), &RowSolver).await;
    assert!(!layout.nodes.contains_key("H"));
    assert!(layout.nodes["B"].collapsed);
    assert!(layout.nodes["B"].has_subordinates);
    assert!(!layout.nodes["A"].collapsed);
}

#[tokio::test]
async fn layout_is_deterministic() {
    let org = big_team();
    let config = LayoutConfig::default();
    let first = compute_chart_layout(&org, &expanded(), &config, &RowSolver).await;
    let second = compute_chart_layout(&org, &expanded(), &config, &RowSolver).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn cyclic_org_terminates() {
    let org = vec![
        Entity::new("A", "A").with_manager("C"),
        Entity::new("B", "B").with_manager("A"),
        Entity::new("C", "C").with_manager("B"),
        Entity::new("D", "D").with_manager("A"),
    ];
    let collapsed: CollapseState = ["A"].into_iter().collect();
    let layout = compute_chart_layout(&org, &collapsed, &LayoutConfig::default(), &RowSolver).await;
    assert!(layout.nodes.len() <= org.len());

    let open = compute_chart_layout(&org, &expanded(), &LayoutConfig::default(), &RowSolver).await;
    assert_eq!(open.nodes.len(), 4);
}

#[tokio::test]
async fn dagre_places_reports_below_manager() {
    let org = vec![
        Entity::new("ceo", "CEO"),
        Entity::new("a", "A").with_manager("ceo"),
        Entity::new("b", "B").with_manager("ceo"),
    ];
    let layout =
        compute_chart_layout(&org, &expanded(), &LayoutConfig::default(), &DagreSolver::new())
            .await;
    assert!(!layout.is_degraded(), "{:?}", layout.degraded);
    let ceo = layout.position("ceo").unwrap();
    let a = layout.position("a").unwrap();
    let b = layout.position("b").unwrap();
    assert!(a.y > ceo.y);
    assert_eq!(a.y, b.y);
    assert!((a.x - b.x).abs() >= 300.0);
}

#[tokio::test]
async fn session_starts_collapsed() {
    let org = big_team();
    let mut session = ChartSession::new(Config::default());
    session.load(&org);
    let layout = session
        .layout(&org, &[], &RowSolver)
        .await
        .into_layout()
        .unwrap();
    assert_eq!(layout.nodes.keys().collect::<Vec<_>>(), vec!["A"]);
    assert!(layout.nodes["A"].collapsed);
}

#[test]
fn org_export_parses() {
    let json = r#"{
        "profiles": [
            {"id": "1", "full_name": "Ana", "position": "CEO", "tags": null},
            {"id": "2", "full_name": "Bo", "manager_id": "1", "department_id": "d",
             "departments": {"id": "d", "name": "Eng", "color": "blue"},
             "tags": ["rust"], "is_advisor": true}
        ],
        "departments": [{"id": "d", "name": "Eng"}]
    }"#;
    let org: OrgData = serde_json::from_str(json).unwrap();
    assert_eq!(org.profiles.len(), 2);
    assert!(org.profiles[0].tags.is_empty());
    assert_eq!(org.profiles[1].department_name(&org.departments), Some("Eng"));
    assert!(org.profiles[1].is_advisor);
}

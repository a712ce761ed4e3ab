pub mod classify;
pub mod graph;
pub mod reconcile;
pub mod request;
pub mod solver;
pub(crate) mod types;
pub mod visibility;
pub use classify::{classify, visible_report_count};
pub use graph::{OrgGraph, StructuralIssue, children_by_manager};
pub use reconcile::{ReconcileInput, real_edges, reconcile};
pub use request::{BlockAssignment, build_request};
pub use solver::{DagreSolver, LayoutSolver, SolverError};
pub use types::*;
pub use visibility::{CollapseState, VisibleSet, compute_visible};

use crate::config::LayoutConfig;
use crate::ir::Entity;
use std::collections::BTreeSet;
use std::time::Duration;

/// Synchronous half of a layout run: everything up to the solver request.
#[derive(Debug, Clone)]
pub struct PreparedLayout<'a> {
    pub graph: OrgGraph<'a>,
    pub visible: VisibleSet,
    pub large: BTreeSet<usize>,
    pub request: LayoutRequest,
    pub assignment: BlockAssignment,
}

impl PreparedLayout<'_> {
    pub fn large_team_managers(&self) -> impl Iterator<Item = &str> + '_ {
        self.large.iter().map(|&idx| self.graph.id(idx))
    }
}

pub fn prepare_layout<'a>(
    entities: &'a [Entity],
    collapsed: &CollapseState,
    config: &LayoutConfig,
) -> PreparedLayout<'a> {
    let graph = OrgGraph::build(entities);
    for issue in graph.diagnose() {
        tracing::warn!(?issue, "org structure issue");
    }
    let visible = compute_visible(&graph, collapsed);
    let large = classify(&graph, &visible, config.large_team_threshold);
    let (request, assignment) = build_request(&graph, &visible, &large, config);
    tracing::debug!(
        entities = graph.len(),
        visible = visible.len(),
        large_teams = large.len(),
        blocks = request.blocks.len(),
        edges = request.edges.len(),
        "prepared layout request"
    );
    PreparedLayout {
        graph,
        visible,
        large,
        request,
        assignment,
    }
}

/// Runs the whole pipeline over an already filtered entity list.
///
/// Solver failures and timeouts never escape: they come back as a layout with
/// every visible node at the origin and [`ChartLayout::degraded`] set.
pub async fn compute_chart_layout<S>(
    entities: &[Entity],
    collapsed: &CollapseState,
    config: &LayoutConfig,
    solver: &S,
) -> ChartLayout
where
    S: LayoutSolver + ?Sized,
{
    let prepared = prepare_layout(entities, collapsed, config);
    if prepared.visible.is_empty() {
        return ChartLayout::default();
    }

    let solved = if config.solver_timeout_ms == 0 {
        solver.solve(&prepared.request).await
    } else {
        let limit = Duration::from_millis(config.solver_timeout_ms);
        match tokio::time::timeout(limit, solver.solve(&prepared.request)).await {
            Ok(result) => result,
            Err(_) => Err(SolverError::Timeout {
                after_ms: config.solver_timeout_ms,
            }),
        }
    };

    let input = ReconcileInput {
        graph: &prepared.graph,
        visible: &prepared.visible,
        collapsed,
        request: &prepared.request,
        assignment: &prepared.assignment,
        config,
    };
    reconcile(&input, solved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LayoutSolver for CountingSolver {
        async fn solve(&self, _request: &LayoutRequest) -> Result<SolvedLayout, SolverError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SolvedLayout::default())
        }
    }

    struct SleepySolver;

    #[async_trait]
    impl LayoutSolver for SleepySolver {
        async fn solve(&self, _request: &LayoutRequest) -> Result<SolvedLayout, SolverError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(SolvedLayout::default())
        }
    }

    #[tokio::test]
    async fn empty_input_skips_solver() {
        let solver = CountingSolver {
            calls: AtomicUsize::new(0),
        };
        let layout =
            compute_chart_layout(&[], &CollapseState::new(), &LayoutConfig::default(), &solver)
                .await;
        assert!(layout.nodes.is_empty());
        assert!(layout.edges.is_empty());
        assert!(!layout.is_degraded());
        assert_eq!(solver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_solver_times_out_into_degraded_layout() {
        let org = vec![
            Entity::new("A", "A"),
            Entity::new("B", "B").with_manager("A"),
        ];
        let config = LayoutConfig {
            solver_timeout_ms: 20,
            ..LayoutConfig::default()
        };
        let layout = compute_chart_layout(&org, &CollapseState::new(), &config, &SleepySolver).await;
        assert_eq!(layout.degraded, Some(SolverError::Timeout { after_ms: 20 }));
        assert_eq!(layout.nodes.len(), 2);
        assert_eq!(layout.edges.len(), 1);
    }

    #[tokio::test]
    async fn blocking_dagre_run_times_out_into_degraded_layout() {
        // Balanced tree, fanout 3, five levels deep: 364 entities.
        let mut org = vec![Entity::new("n0", "n0")];
        let mut frontier = vec!["n0".to_string()];
        for _ in 0..5 {
            let mut next = Vec::new();
            for manager in &frontier {
                for _ in 0..3 {
                    let id = format!("n{}", org.len());
                    org.push(Entity::new(&id, &id).with_manager(manager));
                    next.push(id);
                }
            }
            frontier = next;
        }
        let config = LayoutConfig {
            solver_timeout_ms: 1,
            ..LayoutConfig::default()
        };
        let layout =
            compute_chart_layout(&org, &CollapseState::new(), &config, &DagreSolver::new()).await;
        assert_eq!(layout.degraded, Some(SolverError::Timeout { after_ms: 1 }));
        assert_eq!(layout.nodes.len(), org.len());
        assert!(
            layout
                .nodes
                .values()
                .all(|node| node.position() == crate::ir::Position::ORIGIN)
        );
    }

    #[test]
    fn prepared_layout_reports_large_managers() {
        let mut org = vec![Entity::new("A", "A")];
        for idx in 0..7 {
            org.push(Entity::new(&format!("R{idx}"), "R").with_manager("A"));
        }
        let prepared = prepare_layout(&org, &CollapseState::new(), &LayoutConfig::default());
        assert_eq!(prepared.large_team_managers().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(prepared.request.blocks.len(), 2);
    }
}

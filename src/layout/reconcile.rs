use super::graph::OrgGraph;
use super::request::BlockAssignment;
use super::solver::SolverError;
use super::types::{BlockId, ChartEdge, ChartLayout, LayoutRequest, NodePlacement, SolvedLayout};
use super::visibility::{CollapseState, VisibleSet};
use crate::config::LayoutConfig;
use crate::ir::Position;
use std::collections::{BTreeMap, HashMap};

/// Everything the reconciler needs from the run that produced `request`.
pub struct ReconcileInput<'r, 'a> {
    pub graph: &'r OrgGraph<'a>,
    pub visible: &'r VisibleSet,
    pub collapsed: &'r CollapseState,
    pub request: &'r LayoutRequest,
    pub assignment: &'r BlockAssignment,
    pub config: &'r LayoutConfig,
}

/// Reporting lines between visible entities, taken from the real manager links.
pub fn real_edges(graph: &OrgGraph<'_>, visible: &VisibleSet) -> Vec<ChartEdge> {
    visible
        .indices()
        .filter_map(|idx| {
            let manager = graph.parent(idx)?;
            if !visible.contains(manager) {
                return None;
            }
            let report = graph.entity(idx);
            Some(ChartEdge {
                source: graph.id(manager).to_string(),
                target: report.id.clone(),
                dashed: report.is_advisor,
            })
        })
        .collect()
}

pub fn reconcile(
    input: &ReconcileInput<'_, '_>,
    solved: Result<SolvedLayout, SolverError>,
) -> ChartLayout {
    let edges = real_edges(input.graph, input.visible);
    let outcome = solved.and_then(|solved| entity_positions(input, &solved));

    let (positions, degraded) = match outcome {
        Ok(positions) => (positions, None),
        Err(err) => {
            tracing::warn!(error = %err, "layout degraded, placing nodes at origin");
            let origin = input
                .visible
                .indices()
                .map(|idx| (idx, Position::ORIGIN))
                .collect();
            (origin, Some(err))
        }
    };

    let mut nodes = BTreeMap::new();
    let mut width: f32 = 0.0;
    let mut height: f32 = 0.0;
    for idx in input.visible.indices() {
        let Some(position) = positions.get(&idx) else {
            continue;
        };
        let id = input.graph.id(idx);
        let stacked_in = match input.assignment.block_of(idx) {
            Some(BlockId::Stack(manager)) => Some(manager.clone()),
            _ => None,
        };
        width = width.max(position.x + input.config.node_width);
        height = height.max(position.y + input.config.node_height);
        nodes.insert(
            id.to_string(),
            NodePlacement {
                id: id.to_string(),
                x: position.x,
                y: position.y,
                width: input.config.node_width,
                height: input.config.node_height,
                collapsed: input.collapsed.is_collapsed(id),
                has_subordinates: input.graph.has_subordinates(idx),
                stacked_in,
            },
        );
    }

    ChartLayout {
        nodes,
        edges,
        width,
        height,
        degraded,
    }
}

fn entity_positions(
    input: &ReconcileInput<'_, '_>,
    solved: &SolvedLayout,
) -> Result<HashMap<usize, Position>, SolverError> {
    let missing: Vec<String> = input
        .request
        .blocks
        .iter()
        .filter(|block| !solved.positions.contains_key(&block.id))
        .map(|block| block.id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SolverError::Incomplete { missing });
    }

    let step = input.config.stack_step();
    let mut out = HashMap::with_capacity(input.visible.len());
    for block in &input.request.blocks {
        let origin = solved.positions[&block.id];
        match &block.id {
            BlockId::Entity(id) => {
                if let Some(idx) = input.graph.index_of(id) {
                    out.insert(idx, origin);
                }
            }
            BlockId::Stack(_) => {
                let Some(stack) = input.request.stack(&block.id) else {
                    continue;
                };
                for (slot, member) in stack.members.iter().enumerate() {
                    let Some(idx) = input.graph.index_of(member) else {
                        continue;
                    };
                    out.insert(idx, Position::new(origin.x, origin.y + slot as f32 * step));
                }
            }
        }
    }
    Ok(out)
}

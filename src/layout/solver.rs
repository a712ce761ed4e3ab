use super::types::{LayoutDirection, LayoutRequest, SolvedLayout};
use crate::ir::Position;
use async_trait::async_trait;
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::any::Any;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("layout solver failed: {0}")]
    Failed(String),
    #[error("layout solver timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error("layout solver returned no position for {missing:?}")]
    Incomplete { missing: Vec<String> },
}

/// External hierarchical layout engine.
///
/// Implementations receive the block graph and return the top-left corner of
/// every block. They may be slow or fail; callers bound and absorb both.
#[async_trait]
pub trait LayoutSolver: Send + Sync {
    async fn solve(&self, request: &LayoutRequest) -> Result<SolvedLayout, SolverError>;
}

/// Layered top-down layout backed by dagre.
#[derive(Debug, Clone, Copy)]
pub struct DagreSolver {
    pub margin: f32,
}

impl DagreSolver {
    pub fn new() -> Self {
        Self { margin: 8.0 }
    }
}

impl Default for DagreSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LayoutSolver for DagreSolver {
    async fn solve(&self, request: &LayoutRequest) -> Result<SolvedLayout, SolverError> {
        // dagre is CPU bound and must not run on the async thread.
        let request = request.clone();
        let margin = self.margin;
        match tokio::task::spawn_blocking(move || run_dagre(&request, margin)).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(SolverError::Failed(format!(
                "dagre panicked: {}",
                panic_message(err.into_panic().as_ref())
            ))),
            Err(err) => Err(SolverError::Failed(err.to_string())),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn dagre_rankdir(direction: LayoutDirection) -> &'static str {
    match direction {
        LayoutDirection::TopToBottom => "tb",
    }
}

// dagre keys are positional so entity ids never collide with stack ids.
fn block_key(idx: usize) -> String {
    format!("b{idx}")
}

fn run_dagre(request: &LayoutRequest, margin: f32) -> Result<SolvedLayout, SolverError> {
    if request.blocks.is_empty() {
        return Ok(SolvedLayout::default());
    }

    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(dagre_rankdir(request.options.direction).to_string());
    graph_config.nodesep = Some(request.options.node_spacing);
    graph_config.ranksep = Some(request.options.layer_spacing);
    graph_config.marginx = Some(margin);
    graph_config.marginy = Some(margin);
    dagre_graph.set_graph(graph_config);

    let mut keys = std::collections::HashMap::with_capacity(request.blocks.len());
    for (idx, block) in request.blocks.iter().enumerate() {
        let mut node = DagreNode::default();
        node.width = block.width;
        node.height = block.height;
        let key = block_key(idx);
        dagre_graph.set_node(key.clone(), Some(node));
        keys.insert(&block.id, key);
    }

    for edge in &request.edges {
        let (Some(from), Some(to)) = (keys.get(&edge.from), keys.get(&edge.to)) else {
            continue;
        };
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(from, to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let mut solved = SolvedLayout::default();
    let mut missing = Vec::new();
    for (idx, block) in request.blocks.iter().enumerate() {
        let Some(dagre_node) = dagre_graph.node(&block_key(idx)) else {
            missing.push(block.id.to_string());
            continue;
        };
        if !dagre_node.x.is_finite() || !dagre_node.y.is_finite() {
            missing.push(block.id.to_string());
            continue;
        }
        solved.positions.insert(
            block.id.clone(),
            Position::new(
                dagre_node.x - block.width / 2.0,
                dagre_node.y - block.height / 2.0,
            ),
        );
    }

    if !missing.is_empty() {
        return Err(SolverError::Incomplete { missing });
    }
    Ok(solved)
}

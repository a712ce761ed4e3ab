use std::collections::BTreeMap;
use std::fmt;

use crate::ir::Position;

use super::solver::SolverError;

/// Identity of a block handed to the layout solver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockId {
    Entity(String),
    /// Virtual block holding the stacked team of the named manager.
    Stack(String),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Entity(id) => write!(f, "{id}"),
            BlockId::Stack(manager) => write!(f, "stack:{manager}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockEdge {
    pub from: BlockId,
    pub to: BlockId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackGroup {
    pub manager: String,
    pub block: BlockId,
    /// Members top to bottom.
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutAlgorithm {
    Layered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutDirection {
    TopToBottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    pub algorithm: LayoutAlgorithm,
    pub direction: LayoutDirection,
    pub node_spacing: f32,
    pub layer_spacing: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRequest {
    pub blocks: Vec<Block>,
    pub edges: Vec<BlockEdge>,
    pub stacks: Vec<StackGroup>,
    pub options: SolverOptions,
}

impl LayoutRequest {
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| &block.id == id)
    }

    pub fn stack(&self, block: &BlockId) -> Option<&StackGroup> {
        self.stacks.iter().find(|stack| &stack.block == block)
    }
}

/// Top-left corner of every block, as returned by a solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolvedLayout {
    pub positions: BTreeMap<BlockId, Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodePlacement {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub collapsed: bool,
    pub has_subordinates: bool,
    /// Manager whose stacked team this node is drawn in.
    pub stacked_in: Option<String>,
}

impl NodePlacement {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// A real reporting line, drawn from manager to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartEdge {
    pub source: String,
    pub target: String,
    pub dashed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartLayout {
    pub nodes: BTreeMap<String, NodePlacement>,
    pub edges: Vec<ChartEdge>,
    pub width: f32,
    pub height: f32,
    /// Set when the solver failed and nodes were parked at the origin.
    pub degraded: Option<SolverError>,
}

impl ChartLayout {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.nodes.get(id).map(NodePlacement::position)
    }
}

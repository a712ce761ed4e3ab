use super::graph::OrgGraph;
use super::types::{
    Block, BlockEdge, BlockId, LayoutAlgorithm, LayoutDirection, LayoutRequest, SolverOptions,
    StackGroup,
};
use super::visibility::VisibleSet;
use crate::config::LayoutConfig;
use std::collections::{BTreeSet, HashSet};

/// Block each visible entity is laid out in, indexed like the graph.
#[derive(Debug, Clone)]
pub struct BlockAssignment {
    blocks: Vec<Option<BlockId>>,
}

impl BlockAssignment {
    pub fn assign(graph: &OrgGraph<'_>, visible: &VisibleSet, large: &BTreeSet<usize>) -> Self {
        let mut blocks = vec![None; graph.len()];
        for idx in visible.indices() {
            let stacked_under = graph
                .parent(idx)
                .filter(|manager| large.contains(manager) && !large.contains(&idx));
            blocks[idx] = Some(match stacked_under {
                Some(manager) => BlockId::Stack(graph.id(manager).to_string()),
                None => BlockId::Entity(graph.id(idx).to_string()),
            });
        }
        Self { blocks }
    }

    pub fn block_of(&self, idx: usize) -> Option<&BlockId> {
        self.blocks.get(idx).and_then(Option::as_ref)
    }

    pub fn is_stacked(&self, idx: usize) -> bool {
        matches!(self.block_of(idx), Some(BlockId::Stack(_)))
    }
}

pub fn solver_options(config: &LayoutConfig) -> SolverOptions {
    SolverOptions {
        algorithm: LayoutAlgorithm::Layered,
        direction: LayoutDirection::TopToBottom,
        node_spacing: config.node_spacing,
        layer_spacing: config.layer_spacing,
    }
}

pub fn build_request(
    graph: &OrgGraph<'_>,
    visible: &VisibleSet,
    large: &BTreeSet<usize>,
    config: &LayoutConfig,
) -> (LayoutRequest, BlockAssignment) {
    let assignment = BlockAssignment::assign(graph, visible, large);

    let mut blocks = Vec::new();
    for idx in visible.indices() {
        if assignment.is_stacked(idx) {
            continue;
        }
        blocks.push(Block {
            id: BlockId::Entity(graph.id(idx).to_string()),
            width: config.node_width,
            height: config.node_height,
        });
    }

    let mut stacks = Vec::new();
    for &manager in large {
        let members: Vec<String> = graph
            .children(manager)
            .iter()
            .copied()
            .filter(|&child| visible.contains(child) && assignment.is_stacked(child))
            .map(|child| graph.id(child).to_string())
            .collect();
        // Every visible report is itself a large manager.
        if members.is_empty() {
            continue;
        }
        let block = BlockId::Stack(graph.id(manager).to_string());
        blocks.push(Block {
            id: block.clone(),
            width: config.node_width,
            height: config.stack_height(members.len()),
        });
        stacks.push(StackGroup {
            manager: graph.id(manager).to_string(),
            block,
            members,
        });
    }

    let mut edges = Vec::new();
    let mut seen: HashSet<BlockEdge> = HashSet::new();
    let mut push_edge = |from: &BlockId, to: &BlockId| {
        if from == to {
            return;
        }
        let edge = BlockEdge {
            from: from.clone(),
            to: to.clone(),
        };
        if seen.insert(edge.clone()) {
            edges.push(edge);
        }
    };

    for idx in visible.indices() {
        let Some(manager) = graph.parent(idx) else {
            continue;
        };
        let (Some(from), Some(to)) = (assignment.block_of(manager), assignment.block_of(idx))
        else {
            continue;
        };
        push_edge(from, to);
    }
    for stack in &stacks {
        let Some(manager) = graph.index_of(&stack.manager) else {
            continue;
        };
        let Some(from) = assignment.block_of(manager) else {
            continue;
        };
        push_edge(from, &stack.block);
    }

    let request = LayoutRequest {
        blocks,
        edges,
        stacks,
        options: solver_options(config),
    };
    (request, assignment)
}

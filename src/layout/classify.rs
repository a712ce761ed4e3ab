use super::graph::OrgGraph;
use super::visibility::VisibleSet;
use std::collections::BTreeSet;

pub fn visible_report_count(graph: &OrgGraph<'_>, visible: &VisibleSet, manager: usize) -> usize {
    graph
        .children(manager)
        .iter()
        .filter(|&&child| visible.contains(child))
        .count()
}

/// Visible managers whose visible team is strictly larger than `threshold`.
pub fn classify(graph: &OrgGraph<'_>, visible: &VisibleSet, threshold: usize) -> BTreeSet<usize> {
    visible
        .indices()
        .filter(|&idx| visible_report_count(graph, visible, idx) > threshold)
        .collect()
}

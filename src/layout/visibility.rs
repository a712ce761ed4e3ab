use super::graph::OrgGraph;
use std::collections::BTreeSet;

/// Collapsed entity ids for one chart session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseState {
    collapsed: BTreeSet<String>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entity that manages somebody starts collapsed.
    pub fn all_managers(graph: &OrgGraph<'_>) -> Self {
        let collapsed = (0..graph.len())
            .filter(|&idx| graph.has_subordinates(idx))
            .map(|idx| graph.id(idx).to_string())
            .collect();
        Self { collapsed }
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }

    /// Flips the state of `id` and returns whether it is collapsed afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.collapsed.remove(id) {
            false
        } else {
            self.collapsed.insert(id.to_string());
            true
        }
    }

    pub fn collapse(&mut self, id: &str) {
        self.collapsed.insert(id.to_string());
    }

    pub fn expand(&mut self, id: &str) {
        self.collapsed.remove(id);
    }

    pub fn clear(&mut self) {
        self.collapsed.clear();
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.collapsed.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CollapseState {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            collapsed: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Visibility flags indexed like the [`OrgGraph`] they were computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSet {
    flags: Vec<bool>,
}

impl VisibleSet {
    pub fn contains(&self, idx: usize) -> bool {
        self.flags.get(idx).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.flags.iter().filter(|v| **v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.flags.iter().any(|v| *v)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(idx, visible)| visible.then_some(idx))
    }

    pub fn ids<'a>(&'a self, graph: &'a OrgGraph<'_>) -> impl Iterator<Item = &'a str> + 'a {
        self.indices().map(move |idx| graph.id(idx))
    }
}

pub fn compute_visible(graph: &OrgGraph<'_>, collapsed: &CollapseState) -> VisibleSet {
    visible_after(graph, collapsed.iter())
}

/// Hides the proper descendants of every collapsed id, in whatever order the
/// ids arrive.
///
/// A collapsed node that is already hidden is skipped unless it sits on a
/// manager cycle: off a cycle its subtree is contained in the subtree that hid
/// it, so skipping cannot change the outcome.
pub(crate) fn visible_after<'s>(
    graph: &OrgGraph<'_>,
    collapsed: impl IntoIterator<Item = &'s str>,
) -> VisibleSet {
    let mut flags = vec![true; graph.len()];
    for id in collapsed {
        let Some(idx) = graph.index_of(id) else {
            continue;
        };
        if !flags[idx] && !graph.is_on_cycle(idx) {
            continue;
        }
        if !graph.has_subordinates(idx) {
            continue;
        }
        for hidden in graph.descendants(idx) {
            flags[hidden] = false;
        }
    }
    VisibleSet { flags }
}

use crate::ir::Entity;
use std::collections::{BTreeMap, HashMap};

/// Problems in the manager relation that the pipeline tolerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralIssue {
    DuplicateId(String),
    SelfManaged(String),
    DanglingManager { entity: String, manager: String },
    Cycle(Vec<String>),
}

/// Arena view over a flat entity list, indexed by position.
///
/// Parent and child links are resolved once by id; everything downstream walks
/// indices, so dangling or cyclic manager references never turn into unbounded
/// traversals.
#[derive(Debug, Clone)]
pub struct OrgGraph<'a> {
    entities: Vec<&'a Entity>,
    index: HashMap<&'a str, usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    on_cycle: Vec<bool>,
    issues: Vec<StructuralIssue>,
}

impl<'a> OrgGraph<'a> {
    pub fn build(source: &'a [Entity]) -> Self {
        let mut entities: Vec<&'a Entity> = Vec::with_capacity(source.len());
        let mut index: HashMap<&'a str, usize> = HashMap::with_capacity(source.len());
        let mut issues = Vec::new();

        for entity in source {
            if index.contains_key(entity.id.as_str()) {
                issues.push(StructuralIssue::DuplicateId(entity.id.clone()));
                continue;
            }
            index.insert(entity.id.as_str(), entities.len());
            entities.push(entity);
        }

        let mut parent = vec![None; entities.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); entities.len()];
        for (idx, entity) in entities.iter().enumerate() {
            let Some(manager_id) = entity.manager_id.as_deref() else {
                continue;
            };
            if manager_id == entity.id {
                issues.push(StructuralIssue::SelfManaged(entity.id.clone()));
                continue;
            }
            let Some(&manager_idx) = index.get(manager_id) else {
                issues.push(StructuralIssue::DanglingManager {
                    entity: entity.id.clone(),
                    manager: manager_id.to_string(),
                });
                continue;
            };
            parent[idx] = Some(manager_idx);
            children[manager_idx].push(idx);
        }

        let (on_cycle, cycles) = find_cycles(&parent);
        for cycle in cycles {
            let ids = cycle
                .into_iter()
                .map(|idx| entities[idx].id.clone())
                .collect();
            issues.push(StructuralIssue::Cycle(ids));
        }

        Self {
            entities,
            index,
            parent,
            children,
            on_cycle,
            issues,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, idx: usize) -> &'a Entity {
        self.entities[idx]
    }

    pub fn id(&self, idx: usize) -> &'a str {
        self.entities[idx].id.as_str()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Resolved manager; `None` for roots, dangling and self references.
    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.parent[idx]
    }

    /// Direct reports in input order.
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    pub fn has_subordinates(&self, idx: usize) -> bool {
        !self.children[idx].is_empty()
    }

    pub fn is_on_cycle(&self, idx: usize) -> bool {
        self.on_cycle[idx]
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&idx| self.parent[idx].is_none())
    }

    pub fn diagnose(&self) -> &[StructuralIssue] {
        &self.issues
    }

    /// Every entity reachable below `idx`, breadth first.
    ///
    /// The start node is never part of the result, even when a cycle leads back
    /// to it. Each node is enqueued at most once.
    pub fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut seen = vec![false; self.len()];
        seen[idx] = true;
        let mut out = Vec::new();
        let mut queue = std::collections::VecDeque::from([idx]);
        while let Some(current) = queue.pop_front() {
            for &child in &self.children[current] {
                if seen[child] {
                    continue;
                }
                seen[child] = true;
                out.push(child);
                queue.push_back(child);
            }
        }
        out
    }

    pub fn children_by_manager(&self) -> BTreeMap<String, Vec<String>> {
        let mut out = BTreeMap::new();
        for (idx, kids) in self.children.iter().enumerate() {
            if kids.is_empty() {
                continue;
            }
            out.insert(
                self.id(idx).to_string(),
                kids.iter().map(|&kid| self.id(kid).to_string()).collect(),
            );
        }
        out
    }
}

/// Groups entities under their manager, skipping managers that are not in the list.
pub fn children_by_manager(entities: &[Entity]) -> BTreeMap<String, Vec<String>> {
    OrgGraph::build(entities).children_by_manager()
}

// Each node has at most one parent, so walking parent chains with a three
// state marker finds every cycle in linear time.
fn find_cycles(parent: &[Option<usize>]) -> (Vec<bool>, Vec<Vec<usize>>) {
    const NEW: u8 = 0;
    const ACTIVE: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![NEW; parent.len()];
    let mut on_cycle = vec![false; parent.len()];
    let mut cycles = Vec::new();

    for start in 0..parent.len() {
        if state[start] != NEW {
            continue;
        }
        let mut trail = Vec::new();
        let mut current = Some(start);
        while let Some(node) = current {
            match state[node] {
                NEW => {
                    state[node] = ACTIVE;
                    trail.push(node);
                    current = parent[node];
                }
                ACTIVE => {
                    let Some(pos) = trail.iter().position(|&n| n == node) else {
                        break;
                    };
                    let cycle: Vec<usize> = trail[pos..].to_vec();
                    for &member in &cycle {
                        on_cycle[member] = true;
                    }
                    cycles.push(cycle);
                    break;
                }
                _ => break,
            }
        }
        for node in trail {
            state[node] = DONE;
        }
    }

    (on_cycle, cycles)
}

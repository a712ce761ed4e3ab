use crate::ir::{Department, Entity};
use std::collections::BTreeSet;

/// Department and tag selection applied before layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartFilter {
    pub department: Option<String>,
    /// Entities carrying any of these tags pass.
    pub tags: BTreeSet<String>,
}

impl ChartFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.department.is_none() && self.tags.is_empty()
    }

    pub fn matches(&self, entity: &Entity, departments: &[Department]) -> bool {
        passes(entity, departments, self.department.as_deref(), &self.tags)
    }

    pub fn apply(&self, entities: &[Entity], departments: &[Department]) -> Vec<Entity> {
        filter_entities(entities, departments, self.department.as_deref(), &self.tags)
    }
}

pub fn filter_entities(
    entities: &[Entity],
    departments: &[Department],
    department: Option<&str>,
    tags: &BTreeSet<String>,
) -> Vec<Entity> {
    entities
        .iter()
        .filter(|entity| passes(entity, departments, department, tags))
        .cloned()
        .collect()
}

fn passes(
    entity: &Entity,
    departments: &[Department],
    department: Option<&str>,
    tags: &BTreeSet<String>,
) -> bool {
    if let Some(wanted) = department {
        if entity.department_name(departments) != Some(wanted) {
            return false;
        }
    }
    tags.is_empty() || entity.tags.iter().any(|tag| tags.contains(tag))
}

/// Department names present in the org, in first-seen order.
pub fn department_names(entities: &[Entity], departments: &[Department]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for entity in entities {
        let Some(name) = entity.department_name(departments) else {
            continue;
        };
        if seen.insert(name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Every tag in use, sorted.
pub fn all_tags(entities: &[Entity]) -> Vec<String> {
    entities
        .iter()
        .flat_map(|entity| entity.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Candidates for the manager picker of `employee_id`, sorted by name.
///
/// Matches the query case-insensitively against name and role; an empty
/// query lists everyone but the employee.
pub fn search_manager_candidates<'a>(
    entities: &'a [Entity],
    employee_id: &str,
    query: &str,
) -> Vec<&'a Entity> {
    let needle = query.trim().to_lowercase();
    let mut out: Vec<&Entity> = entities
        .iter()
        .filter(|entity| entity.id != employee_id)
        .filter(|entity| {
            needle.is_empty()
                || entity.full_name.to_lowercase().contains(&needle)
                || entity.position.to_lowercase().contains(&needle)
        })
        .collect();
    out.sort_by(|a, b| a.full_name.cmp(&b.full_name).then_with(|| a.id.cmp(&b.id)));
    out
}

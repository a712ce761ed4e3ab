//! Changes the chart asks the persistence layer to make.
//!
//! The core never writes anything itself. Gestures on the chart are validated
//! against the current entity list and turned into [`Intent`] values that the
//! caller forwards to whatever owns the data.

use crate::ir::{Entity, EntityId};
use crate::layout::OrgGraph;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    SetManager {
        employee_id: EntityId,
        manager_id: Option<EntityId>,
        is_advisor: bool,
    },
    SetTags {
        employee_id: EntityId,
        tags: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error("unknown employee {0}")]
    UnknownEmployee(EntityId),
    #[error("unknown manager {0}")]
    UnknownManager(EntityId),
    #[error("{0} cannot manage themselves")]
    SelfManagement(EntityId),
    #[error("{manager} reports to {employee}; assigning would create a cycle")]
    WouldCreateCycle { employee: EntityId, manager: EntityId },
}

pub fn set_manager(
    entities: &[Entity],
    employee_id: &str,
    manager_id: Option<&str>,
    is_advisor: bool,
) -> Result<Intent, IntentError> {
    let graph = OrgGraph::build(entities);
    let employee = graph
        .index_of(employee_id)
        .ok_or_else(|| IntentError::UnknownEmployee(employee_id.to_string()))?;

    if let Some(manager_id) = manager_id {
        if manager_id == employee_id {
            return Err(IntentError::SelfManagement(employee_id.to_string()));
        }
        let manager = graph
            .index_of(manager_id)
            .ok_or_else(|| IntentError::UnknownManager(manager_id.to_string()))?;
        if graph.descendants(employee).contains(&manager) {
            return Err(IntentError::WouldCreateCycle {
                employee: employee_id.to_string(),
                manager: manager_id.to_string(),
            });
        }
    }

    Ok(Intent::SetManager {
        employee_id: employee_id.to_string(),
        manager_id: manager_id.map(str::to_string),
        is_advisor: manager_id.is_some() && is_advisor,
    })
}

pub fn remove_manager(entities: &[Entity], employee_id: &str) -> Result<Intent, IntentError> {
    set_manager(entities, employee_id, None, false)
}

/// Drag from `source` onto `target`: `source` becomes `target`'s direct manager.
pub fn connect(entities: &[Entity], source: &str, target: &str) -> Result<Intent, IntentError> {
    set_manager(entities, target, Some(source), false)
}

pub fn set_tags<I, S>(entities: &[Entity], employee_id: &str, tags: I) -> Result<Intent, IntentError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if !entities.iter().any(|entity| entity.id == employee_id) {
        return Err(IntentError::UnknownEmployee(employee_id.to_string()));
    }
    Ok(Intent::SetTags {
        employee_id: employee_id.to_string(),
        tags: normalize_tags(tags),
    })
}

/// Trims tags, collapses inner whitespace and drops empties and repeats.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let cleaned = WHITESPACE_RE.replace_all(tag.as_ref().trim(), " ");
        if cleaned.is_empty() || out.iter().any(|existing| **existing == *cleaned) {
            continue;
        }
        out.push(cleaned.into_owned());
    }
    out
}

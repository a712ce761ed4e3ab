use serde::{Deserialize, Deserializer, Serialize};

pub type EntityId = String;

/// An employee profile as handed over by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub full_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub manager_id: Option<EntityId>,
    #[serde(default)]
    pub department_id: Option<String>,
    /// Department row joined onto the profile, when the export includes it.
    #[serde(default, rename = "departments", skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_advisor: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub manager_id: Option<EntityId>,
}

/// Snapshot of the organization as exported by the persistence layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgData {
    #[serde(default)]
    pub profiles: Vec<Entity>,
    #[serde(default)]
    pub departments: Vec<Department>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Entity {
    pub fn new(id: &str, full_name: &str) -> Self {
        Self {
            id: id.to_string(),
            full_name: full_name.to_string(),
            position: String::new(),
            email: None,
            manager_id: None,
            department_id: None,
            department: None,
            tags: Vec::new(),
            is_advisor: false,
        }
    }

    pub fn with_position(mut self, position: &str) -> Self {
        self.position = position.to_string();
        self
    }

    pub fn with_manager(mut self, manager_id: &str) -> Self {
        self.manager_id = Some(manager_id.to_string());
        self
    }

    pub fn with_department(mut self, department_id: &str) -> Self {
        self.department_id = Some(department_id.to_string());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn advisor(mut self) -> Self {
        self.is_advisor = true;
        self
    }

    /// Resolves the department name, preferring the joined row over a lookup.
    pub fn department_name<'a>(&'a self, departments: &'a [Department]) -> Option<&'a str> {
        if let Some(dept) = &self.department {
            return Some(dept.name.as_str());
        }
        let dept_id = self.department_id.as_deref()?;
        departments
            .iter()
            .find(|dept| dept.id == dept_id)
            .map(|dept| dept.name.as_str())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl Department {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: String::new(),
            description: None,
            manager_id: None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_profile_rows_with_nulls() {
        let raw = r#"{
            "id": "p1",
            "full_name": "Ana Souza",
            "position": "CTO",
            "manager_id": null,
            "department_id": "d1",
            "tags": null,
            "is_advisor": false
        }"#;
        let entity: Entity = serde_json::from_str(raw).unwrap();
        assert_eq!(entity.id, "p1");
        assert!(entity.manager_id.is_none());
        assert!(entity.tags.is_empty());
    }

    #[test]
    fn department_name_prefers_joined_row() {
        let departments = vec![Department::new("d1", "Eng"), Department::new("d2", "Ops")];
        let mut entity = Entity::new("p1", "Ana").with_department("d1");
        assert_eq!(entity.department_name(&departments), Some("Eng"));

        entity.department = Some(Department::new("d2", "Ops"));
        assert_eq!(entity.department_name(&departments), Some("Ops"));

        let orphan = Entity::new("p2", "Bia").with_department("missing");
        assert_eq!(orphan.department_name(&departments), None);
    }
}

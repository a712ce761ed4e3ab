use crate::ir::Entity;
use crate::layout::ChartLayout;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub degraded: Option<String>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub name: String,
    pub position: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub collapsed: bool,
    pub has_subordinates: bool,
    pub stacked_in: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub source: String,
    pub target: String,
    pub dashed: bool,
}

impl LayoutDump {
    pub fn from_layout(layout: &ChartLayout, entities: &[Entity]) -> Self {
        let by_id: HashMap<&str, &Entity> = entities
            .iter()
            .map(|entity| (entity.id.as_str(), entity))
            .collect();

        let nodes = layout
            .nodes
            .values()
            .map(|node| {
                let entity = by_id.get(node.id.as_str());
                NodeDump {
                    id: node.id.clone(),
                    name: entity.map(|e| e.full_name.clone()).unwrap_or_default(),
                    position: entity.map(|e| e.position.clone()).unwrap_or_default(),
                    x: node.x,
                    y: node.y,
                    width: node.width,
                    height: node.height,
                    collapsed: node.collapsed,
                    has_subordinates: node.has_subordinates,
                    stacked_in: node.stacked_in.clone(),
                }
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                source: edge.source.clone(),
                target: edge.target.clone(),
                dashed: edge.dashed,
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            degraded: layout.degraded.as_ref().map(ToString::to_string),
            nodes,
            edges,
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or stdout when `path` is `None`.
pub fn write_layout_dump(
    path: Option<&Path>,
    layout: &ChartLayout,
    entities: &[Entity],
) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout, entities);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

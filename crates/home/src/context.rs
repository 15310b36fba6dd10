//! Device context: a plain-text inventory for the system prompt.

use crate::inventory::{normalize_area, Device, DeviceInventory};
use async_trait::async_trait;
use homeclaw_core::device::DeviceContext;
use homeclaw_core::error::ContextError;
use std::collections::BTreeMap;
use std::sync::Arc;

const UNASSIGNED: &str = "unassigned";

/// Renders the inventory grouped by area.
pub struct InventoryContext {
    inventory: Arc<DeviceInventory>,
}

impl InventoryContext {
    pub fn new(inventory: Arc<DeviceInventory>) -> Self {
        Self { inventory }
    }
}

fn render_device(device: &Device) -> String {
    let mut line = format!(
        "- {} ({}): {}",
        device.name,
        device.entity_id,
        device.state()
    );
    if let (true, Some(b)) = (device.on, device.brightness) {
        line.push_str(&format!(", brightness {b}%"));
    }
    line
}

/// Render devices grouped by area, areas sorted, unassigned last.
pub fn render_inventory(devices: &[Device], area_filter: Option<&[String]>) -> String {
    let wanted: Option<Vec<String>> =
        area_filter.map(|areas| areas.iter().map(|a| normalize_area(a)).collect());

    let mut by_area: BTreeMap<String, Vec<&Device>> = BTreeMap::new();
    let mut unassigned: Vec<&Device> = Vec::new();

    for device in devices {
        let area = device.area.as_deref().map(normalize_area);
        if let Some(wanted) = &wanted {
            match &area {
                Some(a) if wanted.contains(a) => {}
                _ => continue,
            }
        }
        match area {
            Some(a) => by_area.entry(a).or_default().push(device),
            None => unassigned.push(device),
        }
    }

    let mut sections: Vec<String> = by_area
        .into_iter()
        .map(|(area, devices)| {
            let lines: Vec<String> = devices.into_iter().map(render_device).collect();
            format!("Area: {area}\n{}", lines.join("\n"))
        })
        .collect();

    if !unassigned.is_empty() {
        let lines: Vec<String> = unassigned.into_iter().map(render_device).collect();
        sections.push(format!("Area: {UNASSIGNED}\n{}", lines.join("\n")));
    }

    sections.join("\n\n")
}

#[async_trait]
impl DeviceContext for InventoryContext {
    async fn build_context(&self, area_filter: Option<&[String]>) -> Result<String, ContextError> {
        let devices = self.inventory.snapshot().await;
        Ok(render_inventory(&devices, area_filter))
    }
}

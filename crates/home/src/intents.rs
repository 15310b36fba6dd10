//! Built-in intent tools: `HassTurnOn`, `HassTurnOff`, `HassLightSet`.
//!
//! Each targets devices by `name` and/or `area`, optionally narrowed by
//! `domain`, and returns the resulting device states.

use crate::inventory::{Device, DeviceInventory, Target};
use async_trait::async_trait;
use homeclaw_core::error::ToolError;
use homeclaw_core::tool::Tool;
use std::sync::Arc;

fn target_properties() -> serde_json::Map<String, serde_json::Value> {
    let props = serde_json::json!({
        "name": {
            "type": "string",
            "description": "Device name or entity id"
        },
        "area": {
            "type": "string",
            "description": "Area id, e.g. kitchen or living_room"
        },
        "domain": {
            "type": "string",
            "description": "Restrict to a device domain, e.g. light or switch"
        }
    });
    match props {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

fn report(devices: &[Device]) -> serde_json::Value {
    let targets: Vec<serde_json::Value> = devices
        .iter()
        .map(|d| {
            let mut v = serde_json::json!({
                "entity_id": d.entity_id,
                "name": d.name,
                "state": d.state(),
            });
            if let Some(b) = d.brightness {
                v["brightness"] = serde_json::json!(b);
            }
            v
        })
        .collect();
    serde_json::json!({ "success": true, "targets": targets })
}

/// Switch matching devices on.
pub struct TurnOnTool {
    inventory: Arc<DeviceInventory>,
}

impl TurnOnTool {
    pub fn new(inventory: Arc<DeviceInventory>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl Tool for TurnOnTool {
    fn name(&self) -> &str {
        "HassTurnOn"
    }

    fn description(&self) -> &str {
        "Turn on a device or every device in an area."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": target_properties(),
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let target = Target::from_arguments(&arguments)?;
        let changed = self.inventory.update(&target, |d| d.on = true).await?;
        tracing::info!(count = changed.len(), "Turned on devices");
        Ok(report(&changed))
    }
}

/// Switch matching devices off.
pub struct TurnOffTool {
    inventory: Arc<DeviceInventory>,
}

impl TurnOffTool {
    pub fn new(inventory: Arc<DeviceInventory>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl Tool for TurnOffTool {
    fn name(&self) -> &str {
        "HassTurnOff"
    }

    fn description(&self) -> &str {
        "Turn off a device or every device in an area."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": target_properties(),
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let target = Target::from_arguments(&arguments)?;
        let changed = self.inventory.update(&target, |d| d.on = false).await?;
        tracing::info!(count = changed.len(), "Turned off devices");
        Ok(report(&changed))
    }
}

/// Set brightness on matching lights. Zero brightness switches them off.
pub struct LightSetTool {
    inventory: Arc<DeviceInventory>,
}

impl LightSetTool {
    pub fn new(inventory: Arc<DeviceInventory>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl Tool for LightSetTool {
    fn name(&self) -> &str {
        "HassLightSet"
    }

    fn description(&self) -> &str {
        "Set the brightness of a light or every light in an area."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let mut props = target_properties();
        props.remove("domain");
        props.insert(
            "brightness".into(),
            serde_json::json!({
                "type": "integer",
                "minimum": 0,
                "maximum": 100,
                "description": "Brightness percentage"
            }),
        );
        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": ["brightness"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let brightness = arguments
            .get("brightness")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'brightness' argument".into()))?;
        if brightness > 100 {
            return Err(ToolError::InvalidArguments(format!(
                "brightness must be 0-100, got {brightness}"
            )));
        }
        let brightness = brightness as u8;

        let mut target = Target::from_arguments(&arguments)?;
        target.domain = Some("light".into());

        let changed = self
            .inventory
            .update(&target, |d| {
                if d.supports_brightness() {
                    d.brightness = Some(brightness);
                    d.on = brightness > 0;
                }
            })
            .await?;
        Ok(report(&changed))
    }
}

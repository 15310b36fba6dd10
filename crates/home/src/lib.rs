//! Home collaborators for homeclaw.
//!
//! An in-process device inventory, the device-context builder that renders
//! it for the system prompt, and the intent tools that act on it.

pub mod context;
pub mod intents;
pub mod inventory;

use homeclaw_core::tool::ToolRegistry;
use std::sync::Arc;

pub use context::{render_inventory, InventoryContext};
pub use intents::{LightSetTool, TurnOffTool, TurnOnTool};
pub use inventory::{Device, DeviceInventory, Target};

/// A registry holding every intent tool bound to `inventory`.
pub fn intent_registry(inventory: Arc<DeviceInventory>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(TurnOnTool::new(inventory.clone())));
    registry.register(Box::new(TurnOffTool::new(inventory.clone())));
    registry.register(Box::new(LightSetTool::new(inventory)));
    registry
}

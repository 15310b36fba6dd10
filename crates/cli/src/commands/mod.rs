pub mod chat;
pub mod doctor;
pub mod memory;
pub mod models;
pub mod onboard;
pub mod prompt;

use homeclaw_agent::ConversationEntity;
use homeclaw_config::AppConfig;
use homeclaw_home::{intent_registry, DeviceInventory, InventoryContext};
use homeclaw_memory::FileMemory;
use homeclaw_providers::AnthropicProvider;
use std::sync::Arc;

/// Everything a session needs, wired from config.
pub struct Session {
    pub entity: ConversationEntity,
    pub memory: Arc<FileMemory>,
    pub inventory: Arc<DeviceInventory>,
}

pub fn build_session(config: &AppConfig) -> Session {
    let provider = Arc::new(AnthropicProvider::from_config(config));
    let memory = Arc::new(FileMemory::new(config.memory.resolved_path()));
    let inventory = Arc::new(DeviceInventory::from_config(&config.home.devices));
    tracing::debug!(
        memory = %memory.path().display(),
        devices = config.home.devices.len(),
        "Session wired"
    );

    let entity = ConversationEntity::new(provider, config.agent.clone())
        .with_tools(Arc::new(intent_registry(inventory.clone())))
        .with_devices(Arc::new(InventoryContext::new(inventory.clone())))
        .with_memory(memory.clone());

    Session {
        entity,
        memory,
        inventory,
    }
}

/// Print setup instructions and fail when no API key is configured.
pub fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.has_api_key() {
        return Ok(());
    }
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    HOMECLAW_API_KEY = '...'");
    eprintln!("    ZAI_API_KEY      = '...'");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

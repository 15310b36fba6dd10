//! `homeclaw models`: List known chat models.

use homeclaw_config::{AppConfig, DEFAULT_CHAT_MODEL};
use homeclaw_core::provider::Provider;
use homeclaw_providers::AnthropicProvider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let active = config.agent.model_params().model;

    let provider = AnthropicProvider::from_config(&config);
    let models = provider.list_models().await?;

    println!("🤖 Known chat models ({})", config.base_url);
    println!();
    for model in models {
        let mut tags = Vec::new();
        if model == DEFAULT_CHAT_MODEL {
            tags.push("recommended");
        }
        if model == active {
            tags.push("active");
        }
        if tags.is_empty() {
            println!("    {model}");
        } else {
            println!("  • {model}  ({})", tags.join(", "));
        }
    }
    println!();
    println!("  Set agent.recommended = false and agent.chat_model to pick another.");

    Ok(())
}

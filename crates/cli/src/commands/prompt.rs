//! `homeclaw prompt`: Show the system prompt a turn would send.

use super::build_session;
use homeclaw_agent::context::{build_system_prompt, PromptSources};
use homeclaw_config::AppConfig;
use homeclaw_core::persona::{OutputLanguage, Personality};
use homeclaw_home::InventoryContext;

pub async fn run(
    personality: Option<String>,
    language: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(p) = personality {
        config.agent.personality = Personality::parse_lossy(&p);
    }
    if let Some(lang) = language {
        config.agent.output_language = OutputLanguage::parse_lossy(&lang);
    }

    let session = build_session(&config);
    let host_text = session.entity.host_prompt();
    let devices = InventoryContext::new(session.inventory.clone());

    let built = build_system_prompt(&PromptSources {
        options: &config.agent,
        host_text: Some(&host_text),
        devices: Some(&devices),
        memory: Some(session.memory.as_ref()),
    })
    .await;

    println!("📝 System prompt (tier: {})", built.tier.as_str());
    for demotion in &built.demotions {
        println!("  ⚠️  {} tier skipped: {}", demotion.from.as_str(), demotion.reason);
    }
    for (i, part) in built.system.parts.iter().enumerate() {
        println!("\n──── block {} ────\n{part}", i + 1);
    }

    Ok(())
}

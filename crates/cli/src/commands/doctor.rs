//! `homeclaw doctor`: Diagnose config and credentials.

use homeclaw_config::AppConfig;
use homeclaw_core::error::{ProviderError, ProviderErrorKind};
use homeclaw_core::provider::Provider;
use homeclaw_providers::AnthropicProvider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 homeclaw Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — run `homeclaw onboard` (using defaults)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config file and re-run doctor.");
            return Ok(());
        }
    };

    let params = config.agent.model_params();
    println!("  ✅ Model: {} (max_tokens {}, temperature {})", params.model, params.max_tokens, params.temperature);

    if config.home.devices.is_empty() {
        println!("  ⚠️  No devices configured — add [[home.devices]] entries");
        issues += 1;
    } else {
        println!("  ✅ {} device(s) configured", config.home.devices.len());
    }

    let memory_path = config.memory.resolved_path();
    if config.agent.memory_enabled {
        println!("  ✅ Memory file: {}", memory_path.display());
    } else {
        println!("  ⚠️  Memory disabled");
    }

    // Check credentials
    if !config.has_api_key() {
        println!("  ❌ No API key configured — set HOMECLAW_API_KEY or add api_key to config.toml");
        issues += 1;
    } else {
        let provider = AnthropicProvider::from_config(&config);
        match provider.health_check().await {
            Ok(()) => println!("  ✅ API key accepted by {}", config.base_url),
            Err(e) => {
                println!("  ❌ {}", describe_failure(&e, &config.base_url));
                issues += 1;
            }
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

fn describe_failure(error: &ProviderError, base_url: &str) -> String {
    match error.kind() {
        ProviderErrorKind::Authentication => "Invalid API key".to_string(),
        ProviderErrorKind::Timeout => format!("Connection to {base_url} timed out"),
        ProviderErrorKind::Connection => format!("Cannot connect to {base_url}"),
        ProviderErrorKind::Generic => format!("Credential check failed: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_described_by_kind() {
        let url = "https://api.z.ai/api/anthropic";
        assert_eq!(
            describe_failure(&ProviderError::Authentication("401".into()), url),
            "Invalid API key"
        );
        assert!(describe_failure(&ProviderError::Timeout("slow".into()), url).contains("timed out"));
        assert!(describe_failure(&ProviderError::Connection("refused".into()), url)
            .starts_with("Cannot connect"));
    }
}

//! `homeclaw memory`: Inspect or reset the assistant's long-term memory.

use homeclaw_config::AppConfig;
use homeclaw_core::memory::AssistantMemory;
use homeclaw_memory::FileMemory;

fn open() -> Result<FileMemory, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(FileMemory::new(config.memory.resolved_path()))
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let memory = open()?;
    print!("{}", describe(&memory).await?);
    Ok(())
}

pub async fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let memory = open()?;
    let facts = memory.fact_count().await;
    memory.clear().await?;
    println!("🧹 Cleared {facts} facts from {}", memory.path().display());
    Ok(())
}

pub async fn delete(yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    let memory = open()?;
    if !yes {
        println!("  This removes {} for good.", memory.path().display());
        println!("  Re-run with --yes to confirm.");
        return Ok(());
    }
    memory.delete_storage().await?;
    println!("🗑️  Deleted {}", memory.path().display());
    Ok(())
}

/// Summary block printed by `memory show`.
async fn describe(memory: &FileMemory) -> Result<String, Box<dyn std::error::Error>> {
    let mut out = String::new();
    out.push_str("🧠 Memory\n");
    out.push_str("=========\n");
    let location = if memory.path().exists() {
        memory.path().display().to_string()
    } else {
        format!("{} (not created yet)", memory.path().display())
    };
    out.push_str(&format!("  File:   {location}\n"));
    out.push_str(&format!("  Facts:  {}\n", memory.fact_count().await));

    let prompt = memory.build_prompt().await?;
    if prompt.is_empty() {
        out.push_str("\n  (nothing remembered yet)\n");
    } else {
        out.push('\n');
        for line in prompt.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn describe_lists_remembered_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let memory = FileMemory::new(dir.path().join("memory.json"));
        memory
            .record_interaction("I prefer the porch light on after sunset")
            .await
            .unwrap();

        let text = describe(&memory).await.unwrap();
        assert!(text.contains("Facts:  1"));
        assert!(text.contains("I prefer the porch light on after sunset"));
        assert!(!text.contains("not created yet"));
    }

    #[tokio::test]
    async fn describe_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let memory = FileMemory::new(dir.path().join("memory.json"));

        let text = describe(&memory).await.unwrap();
        assert!(text.contains("not created yet"));
        assert!(text.contains("nothing remembered yet"));
    }
}

//! `homeclaw chat`: Interactive or single-message chat mode.

use super::{build_session, require_api_key, Session};
use homeclaw_agent::TurnResult;
use homeclaw_config::AppConfig;
use homeclaw_core::event::{DomainEvent, EventBus};
use homeclaw_core::message::{Attachment, ChatLog};
use homeclaw_core::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

pub async fn run(
    message: Option<String>,
    attachment_paths: Vec<PathBuf>,
    areas: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    require_api_key(&config)?;

    if !areas.is_empty() {
        config.agent.area_filter = areas;
    }

    let attachments = attachment_paths
        .iter()
        .map(|p| load_attachment(p))
        .collect::<Result<Vec<_>, _>>()?;

    let session = build_session(&config);

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = run_turn(&session, &msg, attachments, ChatLog::new()).await;
        eprint!("\r              \r");
        match result {
            Ok(turn) if turn.summary.is_error() => return Err(turn.summary.response.into()),
            Ok(turn) => println!("{}", turn.summary.response),
            Err(Error::Cancelled) => eprintln!("  [Cancelled]"),
            Err(e) => return Err(e.into()),
        }
        return Ok(());
    }

    // Interactive mode
    let params = config.agent.model_params();
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        homeclaw — Interactive Mode           ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Endpoint:     {}", config.base_url);
    println!("  Model:        {}", params.model);
    println!("  Personality:  {}", config.agent.personality);
    println!("  Language:     {}", config.agent.output_language);
    println!("  Devices:      {}", session.inventory.snapshot().await.len());
    println!("  Memory:       {} facts", session.memory.fact_count().await);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Ctrl+C cancels a running turn. Type 'exit' to quit.");
    println!();

    let usage = Arc::new(Mutex::new(UsageTally::default()));
    let usage_task = spawn_usage_counter(session.entity.event_bus(), usage.clone());

    let mut log = ChatLog::new();
    let mut pending_attachments = attachments;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let result = run_turn(
            &session,
            line,
            std::mem::take(&mut pending_attachments),
            log.clone(),
        )
        .await;
        eprint!("\r     \r");

        match result {
            Ok(turn) => {
                println!();
                if turn.summary.is_error() {
                    eprintln!("  [Error] {}", turn.summary.response);
                } else {
                    for text_line in turn.summary.response.lines() {
                        println!("  Assistant > {text_line}");
                    }
                }
                println!();
                log = turn.log;
            }
            Err(Error::Cancelled) => {
                eprintln!("  [Cancelled]");
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    usage_task.abort();
    if let Ok(tally) = usage.lock() {
        println!();
        println!(
            "  Session: {} turns, {} model calls, {} tool calls, {} tokens",
            tally.turns, tally.model_calls, tally.tool_calls, tally.tokens
        );
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

/// Run one turn, cancelling it on Ctrl+C.
async fn run_turn(
    session: &Session,
    text: &str,
    attachments: Vec<Attachment>,
    prior: ChatLog,
) -> Result<TurnResult, Error> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = session
        .entity
        .handle_turn(text, attachments, prior, &cancel)
        .await;
    watcher.abort();
    result
}

/// Running totals for the interactive session, fed from the event bus.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct UsageTally {
    turns: u32,
    model_calls: u32,
    tool_calls: u32,
    tokens: u64,
}

impl UsageTally {
    fn observe(&mut self, event: &DomainEvent) {
        match event {
            DomainEvent::TurnCompleted { .. } => self.turns += 1,
            DomainEvent::ModelInvoked { tokens_used, .. } => {
                self.model_calls += 1;
                self.tokens += u64::from(tokens_used.unwrap_or(0));
            }
            DomainEvent::ToolExecuted { .. } => self.tool_calls += 1,
            DomainEvent::TurnStarted { .. } | DomainEvent::PromptDegraded { .. } => {}
        }
    }
}

fn spawn_usage_counter(
    bus: &EventBus,
    tally: Arc<Mutex<UsageTally>>,
) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Ok(mut tally) = tally.lock() {
                        tally.observe(&event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Usage counter lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn load_attachment(path: &Path) -> Result<Attachment, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read attachment {}: {e}", path.display()))?;
    let mut attachment = Attachment::from_bytes(media_type_for(path), &bytes);
    if let Some(name) = path.file_name() {
        attachment = attachment.with_name(name.to_string_lossy());
    }
    Ok(attachment)
}

/// Guess a MIME type from the file extension.
fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

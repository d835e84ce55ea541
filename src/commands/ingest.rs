//! Ingest command - load ticket rows and build the search index

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use tracing::info;

use support_assist::embeddings::{Embedder, OllamaEmbedder};
use support_assist::ingest::load_tickets;
use support_assist::{paths, Config, TicketStorage};

use super::report_failure;

pub fn execute(file: &Path, rebuild: bool) -> Result<i32> {
    let config = Config::load()?;
    if let Err(e) = config.validate() {
        return Ok(report_failure(&e));
    }

    let tickets_dir = paths::tickets_dir();
    let mut storage = TicketStorage::open(&tickets_dir)
        .with_context(|| format!("Failed to open ticket storage at {}", tickets_dir.display()))?;

    if storage.is_indexed() && !rebuild {
        println!(
            "Index already holds {} tickets. Use {} to replace it.",
            storage.count()?,
            "--rebuild".bold()
        );
        return Ok(0);
    }

    println!("📥 Loading tickets from {}", file.display());
    let tickets = match load_tickets(file) {
        Ok(t) => t,
        Err(e) => return Ok(report_failure(&e)),
    };
    if tickets.is_empty() {
        println!("{}", "No ticket rows with an id were found.".yellow());
        return Ok(1);
    }
    println!("  {} tickets", tickets.len());

    let embedder = match OllamaEmbedder::from_config(&config.ollama) {
        Ok(e) => e,
        Err(e) => return Ok(report_failure(&e)),
    };
    println!("🧮 Embedding problem descriptions with {}...", embedder.model_name());

    let texts: Vec<String> = tickets.iter().map(|t| t.problem_text.clone()).collect();
    let embeddings = match embedder.embed_batch(&texts) {
        Ok(e) => e,
        Err(e) => return Ok(report_failure(&e)),
    };

    storage.rebuild(&tickets, &embeddings)?;
    info!(tickets = tickets.len(), "ingest complete");

    println!("{} Indexed {} tickets", "✓".green(), tickets.len());
    Ok(0)
}

//! Stats command - feedback counters and current ranking for one ticket

use anyhow::Result;
use colored::*;
use serde::Serialize;

use support_assist::{AppContext, Config, FeedbackRecord, RankedSolution};

use super::report_failure;

#[derive(Serialize)]
struct StatsOutput<'a> {
    ticket_id: &'a str,
    levels: &'a [LevelStats],
    orphaned: &'a [FeedbackRecord],
}

#[derive(Serialize)]
struct LevelStats {
    #[serde(flatten)]
    record: FeedbackRecord,
    confidence: f64,
    final_score: f64,
}

pub fn execute(ticket_id: &str, json_output: bool) -> Result<i32> {
    let config = Config::load()?;
    let ctx = AppContext::open(&config)?;

    let ticket = match ctx.ticket(ticket_id) {
        Ok(Some(t)) => t,
        Ok(None) => {
            eprintln!("{} Unknown ticket: {}", "✗".red(), ticket_id);
            return Ok(1);
        }
        Err(e) => return Ok(report_failure(&e)),
    };

    let ranked: Vec<RankedSolution> = match ctx.rank(&ticket) {
        Ok(r) => r,
        Err(e) => return Ok(report_failure(&e)),
    };

    let mut records = match ctx.feedback().records_for_ticket(&ticket.id) {
        Ok(r) => r,
        Err(e) => return Ok(report_failure(&e)),
    };

    let stats: Vec<LevelStats> = ranked
        .iter()
        .map(|solution| {
            let record = match records.iter().position(|r| r.level == solution.level) {
                Some(i) => records.swap_remove(i),
                None => FeedbackRecord::zero(&ticket.id, solution.level),
            };
            LevelStats {
                record,
                confidence: solution.confidence,
                final_score: solution.final_score,
            }
        })
        .collect();
    // Whatever is left was rated for levels the ticket no longer has
    let mut orphaned = records;
    orphaned.sort_by_key(|r| r.level);

    if json_output {
        let output = StatsOutput {
            ticket_id: &ticket.id,
            levels: &stats,
            orphaned: &orphaned,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(0);
    }

    println!("📊 Feedback for ticket {} ({})", ticket.id.cyan().bold(), ticket.system);
    println!(
        "{:<7} {:>8} {:>9} {:>11} {:>8}  LAST UPDATED",
        "LEVEL", "SUCCESS", "ATTEMPTS", "CONFIDENCE", "SCORE"
    );
    println!("{}", "─".repeat(70));
    for s in &stats {
        let updated = s
            .record
            .last_updated
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<7} {:>8} {:>9} {:>11.3} {:>8.3}  {}",
            s.record.level,
            s.record.success_count,
            s.record.attempt_count,
            s.confidence,
            s.final_score,
            updated.dimmed()
        );
    }

    if !orphaned.is_empty() {
        let levels: Vec<u32> = orphaned.iter().map(|r| r.level).collect();
        println!(
            "\n{} feedback stored for levels {:?}, which this ticket no longer has",
            "⚠".yellow(),
            levels
        );
    }
    Ok(0)
}

//! Feedback commands - record operator verdicts on solutions

use anyhow::Result;
use colored::*;

use support_assist::error::ESCALATION_GUIDANCE;
use support_assist::{AppContext, Config, Ticket};

use super::report_failure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Worked,
    Failed,
}

pub fn execute(ticket_id: &str, level: u32, outcome: Outcome) -> Result<i32> {
    let config = Config::load()?;
    let ctx = AppContext::open(&config)?;

    let ticket = match lookup(&ctx, ticket_id) {
        Ok(Some(t)) => t,
        Ok(None) => return Ok(1),
        Err(code) => return Ok(code),
    };
    if !ticket.levels().contains(&level) {
        eprintln!(
            "{} Ticket {} has no level {} solution (levels: {:?})",
            "✗".red(),
            ticket.id,
            level,
            ticket.levels()
        );
        return Ok(1);
    }

    if let Err(e) = ctx.submit_feedback(ticket_id, level, outcome == Outcome::Worked) {
        return Ok(report_failure(&e));
    }

    let record = ctx.feedback().record(ticket_id, level);
    match outcome {
        Outcome::Worked => println!("{} Marked level {} as worked", "✓".green(), level),
        Outcome::Failed => println!("{} Marked level {} as failed", "✓".green(), level),
    }
    if let Ok(r) = record {
        println!(
            "  {}",
            format!("{} of {} attempts succeeded", r.success_count, r.attempt_count).dimmed()
        );
    }
    Ok(0)
}

pub fn execute_none_worked(ticket_id: &str) -> Result<i32> {
    let config = Config::load()?;
    let ctx = AppContext::open(&config)?;

    let ticket = match lookup(&ctx, ticket_id) {
        Ok(Some(t)) => t,
        Ok(None) => return Ok(1),
        Err(code) => return Ok(code),
    };

    let recorded = ctx
        .rank(&ticket)
        .and_then(|ranked| ctx.mark_none_worked(&ticket.id, &ranked));
    match recorded {
        Ok(levels) => {
            println!(
                "{} Recorded a failure for levels {:?}",
                "✓".green(),
                levels
            );
            println!("{}", ESCALATION_GUIDANCE.yellow());
            Ok(0)
        }
        Err(e) => Ok(report_failure(&e)),
    }
}

/// `Ok(None)` after reporting an unknown id, `Err(exit_code)` on failure
fn lookup(ctx: &AppContext, ticket_id: &str) -> std::result::Result<Option<Ticket>, i32> {
    match ctx.ticket(ticket_id) {
        Ok(Some(ticket)) => Ok(Some(ticket)),
        Ok(None) => {
            eprintln!("{} Unknown ticket: {}", "✗".red(), ticket_id);
            Ok(None)
        }
        Err(e) => Err(report_failure(&e)),
    }
}

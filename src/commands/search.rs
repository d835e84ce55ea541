//! Search command - best matching ticket plus ranked solutions

use anyhow::Result;
use colored::*;
use serde::Serialize;

use support_assist::error::NO_MATCH_GUIDANCE;
use support_assist::{AppContext, Config, Match};

use super::report_failure;

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    #[serde(rename = "match")]
    best: Option<&'a Match>,
    response: Option<String>,
}

pub fn execute(query: &str, json_output: bool, generate: bool) -> Result<i32> {
    let config = Config::load()?;
    let ctx = AppContext::open(&config)?;

    let best = match ctx.search_and_rank(query) {
        Ok(best) => best,
        Err(e) => return Ok(report_failure(&e)),
    };

    let response = match (&best, generate) {
        (Some(m), true) => Some(ctx.generate_response(m)),
        _ => None,
    };

    if json_output {
        let output = SearchOutput {
            query,
            best: best.as_ref(),
            response,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(0);
    }

    let Some(m) = best else {
        println!("{}", NO_MATCH_GUIDANCE.yellow());
        return Ok(0);
    };

    print_match(&m);
    if let Some(text) = response {
        println!("\n{}", "Troubleshooting response:".blue().bold());
        println!("{}", text);
    }
    println!(
        "\n{}",
        format!(
            "Report outcomes with `support-assist feedback {} <LEVEL> --worked|--failed` \
             or `support-assist none-worked {}`",
            m.ticket().id,
            m.ticket().id
        )
        .dimmed()
    );

    Ok(0)
}

fn print_match(m: &Match) {
    let ticket = m.ticket();
    println!("🔍 Closest ticket: {}", ticket.id.cyan().bold());
    println!("   System: {}", ticket.system);
    println!(
        "   Similarity-Recency score: {:.3} {}",
        m.result.blended_score,
        format!(
            "(similarity {:.3}, recency {:.3})",
            m.result.similarity, m.result.recency
        )
        .dimmed()
    );
    println!("{}", "─".repeat(60));

    if m.solutions.is_empty() {
        println!("{}", "This ticket has no recorded solutions.".yellow());
        return;
    }

    println!("{}", "Recommended solutions:".green().bold());
    for (rank, s) in m.solutions.iter().enumerate() {
        println!(
            "  {}. [level {}] {} {}",
            rank + 1,
            s.level,
            s.text,
            format!(
                "(recency: {:.2}, confidence: {:.2})",
                s.recency, s.confidence
            )
            .dimmed()
        );
    }
}

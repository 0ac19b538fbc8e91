//! Interactive question session over one knowledge base.

use super::load_knowledge_base;
use crate::answer::format_hits_for_display;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::info;

/// Run the interactive chat command.
///
/// Each question is answered independently against the knowledge base loaded
/// at startup. `refresh` rebuilds it from the latest report mid-session.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.answer.model = model;
    }
    let k = settings.answer.top_k;

    let pipeline = Pipeline::new(&settings)?;
    let mut kb = load_knowledge_base(&pipeline, false).await?;

    println!("\n{}", style("Watchpost Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the latest report, 'refresh' to reload it, or 'exit' to quit.").dim()
    );
    Output::kv("Report", kb.source());
    Output::kv("Created time", kb.created_time());
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("refresh") {
            match load_knowledge_base(&pipeline, true).await {
                Ok(fresh) => {
                    kb = fresh;
                    Output::success(&format!("Reloaded {} excerpts", kb.index.len()));
                }
                Err(e) => Output::error(&format!("Refresh failed: {}", e)),
            }
            continue;
        }

        info!("Chat question: {}", input);
        match pipeline.ask(&kb, input, k).await {
            Ok(result) => {
                println!(
                    "\n{} {}\n",
                    style("Watchpost:").cyan().bold(),
                    result.answer.text.trim()
                );
                if !result.answer.is_not_available() && !result.hits.is_empty() {
                    println!("{}\n", style(format_hits_for_display(&result.hits)).dim());
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

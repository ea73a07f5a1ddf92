//! Command handlers for CLI operations
//!
//! - interview: run an interview interactively in the terminal
//! - serve: start the HTTP API
//! - catalog: show levels, plans and question budgets
//! - config show / config path: inspect configuration

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::catalog;
use crate::config::Config;
use crate::interviewer;
use crate::llm::router::LLMRouter;
use crate::server;
use crate::session::{InterviewSession, QuestionView};
use sdk::report::{AssessmentReport, ScoreSummary};
use sdk::types::{ChoiceLabel, PositionLevel};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run one interview against stdin/stdout and print the report
pub async fn handle_interview(
    name: String,
    level: String,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let name = name.trim().to_string();
    anyhow::ensure!(!name.is_empty(), "Candidate name must not be empty");

    let level = catalog::resolve_level(&level);
    let router = Arc::new(LLMRouter::from_config(&config.llm));
    tracing::info!(
        "Interview for {} at {} level using providers {:?}",
        name,
        level,
        router.provider_names()
    );

    let mut session = InterviewSession::for_level(
        &name,
        level,
        &config.interview,
        interviewer::collaborators(router),
    );

    let started = match session.start().await {
        Ok(started) => started,
        Err(e) => {
            print_partial(&session, format)?;
            return Err(e).context("Failed to start the interview");
        }
    };
    println!("{}\n", started.welcome_message);
    println!("{}", render_question(&started.question));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt();
        let answer = lines
            .next_line()
            .await
            .context("Failed to read answer from stdin")?
            .context("Input closed before the interview finished")?;

        if answer.trim().is_empty() {
            println!("Please type an answer (or a letter for multiple choice).");
            continue;
        }

        let outcome = match session.submit_answer(&answer).await {
            Ok(outcome) => outcome,
            Err(e) => {
                print_partial(&session, format)?;
                return Err(e).context("Failed to evaluate answer");
            }
        };

        println!("\n{} (score {:.0}%)", outcome.message, outcome.score * 100.0);
        if let Some(transition) = &outcome.transition {
            println!("{}", transition);
        }

        if outcome.is_complete {
            break;
        }
        if let Some(question) = &outcome.next_question {
            println!("\n{}", render_question(question));
        }
    }

    let report = match session.finalize().await {
        Ok(report) => report,
        Err(e) => {
            print_partial(&session, format)?;
            return Err(e).context("Failed to compile the assessment report");
        }
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            );
        }
        OutputFormat::Text => println!("\n{}", render_report(&report)),
    }

    Ok(())
}

/// Serve the HTTP API until Ctrl+C
pub async fn handle_serve(mut config: Config, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let router = Arc::new(LLMRouter::from_config(&config.llm));
    tracing::info!("Registered LLM providers: {:?}", router.provider_names());

    server::serve(&config, interviewer::collaborators(router))
        .await
        .context("API server failed")
}

/// Print each level's starting difficulty, question budget and skill plan
pub fn handle_catalog(format: OutputFormat) -> Result<()> {
    let profiles: Vec<_> = PositionLevel::ALL.iter().map(|l| catalog::profile(*l)).collect();

    match format {
        OutputFormat::Json => {
            let levels: Vec<_> = profiles
                .iter()
                .map(|p| {
                    json!({
                        "level": p.level,
                        "initial_difficulty": p.initial_difficulty,
                        "max_questions": p.max_questions,
                        "plan": p.plan,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "levels": levels }))?);
        }
        OutputFormat::Text => {
            for p in &profiles {
                println!(
                    "{} (difficulty {:.2}, up to {} questions)",
                    p.level, p.initial_difficulty, p.max_questions
                );
                for area in &p.plan {
                    println!("  - {}", area.display_name());
                }
            }
        }
    }

    Ok(())
}

/// Print the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(config).context("Failed to serialize config")?
            );
        }
        OutputFormat::Text => {
            print!(
                "{}",
                toml::to_string_pretty(config).context("Failed to serialize config")?
            );
        }
    }
    Ok(())
}

/// Print the configuration file in use
pub fn handle_config_path(custom: Option<&Path>, format: OutputFormat) -> Result<()> {
    let path = match custom {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path().context("Failed to resolve config path")?,
    };

    match format {
        OutputFormat::Json => println!("{}", json!({ "path": path.display().to_string() })),
        OutputFormat::Text => println!("{}", path.display()),
    }
    Ok(())
}

/// Print whatever scores the session has gathered before it stopped
fn print_partial(session: &InterviewSession, format: OutputFormat) -> Result<()> {
    let summary = session.summary();
    match format {
        OutputFormat::Json => {
            let partial = json!({
                "session_id": session.id().to_string(),
                "state": session.state(),
                "summary": summary,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&partial).context("Failed to serialize summary")?
            );
        }
        OutputFormat::Text => println!("\n{}", render_summary(&summary)),
    }
    Ok(())
}

fn print_prompt() {
    use std::io::Write;

    print!("> ");
    std::io::stdout().flush().ok();
}

/// Terminal rendering of a question, options included
pub fn render_question(question: &QuestionView) -> String {
    let mut out = format!(
        "Question {} [{}]: {}",
        question.index + 1,
        question.skill_area.display_name(),
        question.text
    );
    if let Some(options) = &question.options {
        for (label, option) in ChoiceLabel::ALL.iter().zip(options.iter()) {
            out.push_str(&format!("\n  {}) {}", label, option));
        }
    }
    out
}

/// Terminal rendering of the scores gathered so far
pub fn render_summary(summary: &ScoreSummary) -> String {
    if summary.total_evaluations == 0 {
        return "Interview stopped before any answer was scored.".to_string();
    }

    let mut out = format!(
        "Interview stopped early. Partial results over {} answers:\nOverall: {:.0}% ({})\n",
        summary.total_evaluations,
        summary.overall_score * 100.0,
        summary.overall_level,
    );
    for entry in &summary.skill_breakdown {
        out.push_str(&format!(
            "  {:<22} {:>4.0}%  {}\n",
            entry.skill_area.display_name(),
            entry.score * 100.0,
            entry.level
        ));
    }
    out
}

/// Terminal rendering of the final report
pub fn render_report(report: &AssessmentReport) -> String {
    let summary = &report.summary;
    let mut out = format!(
        "Assessment for {} ({} level)\nOverall: {:.0}% ({})\nQuestions answered: {} in {:.0}s\n",
        report.candidate_name,
        report.position_level,
        summary.overall_score * 100.0,
        summary.overall_level,
        report.questions_asked,
        report.duration_secs,
    );

    out.push_str("\nSkill breakdown:\n");
    for entry in &summary.skill_breakdown {
        out.push_str(&format!(
            "  {:<22} {:>4.0}%  {}\n",
            entry.skill_area.display_name(),
            entry.score * 100.0,
            entry.level
        ));
    }

    let narrative = &report.narrative;
    for (title, items) in [
        ("Key strengths", &narrative.key_strengths),
        ("Recommendations", &narrative.improvement_recommendations),
        ("Next steps", &narrative.next_steps),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}:\n", title));
        for item in items {
            out.push_str(&format!("  - {}\n", item));
        }
    }

    if !narrative.interview_summary.is_empty() {
        out.push_str(&format!("\n{}\n", narrative.interview_summary));
    }
    out
}

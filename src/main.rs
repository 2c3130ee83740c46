//! Terminal surface for HybridOne Coach.
//!
//! Plain lines are chat messages. Slash commands drive the builder:
//! `/builder`, `/chat`, `/submit`, `/new`, `/set <field> <value>`,
//! `/export <dir>`, `/quit`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use hybridone_coach::coach_core::prompts::SYSTEM_INSTRUCTION;
use hybridone_coach::coach_core::{
    BuilderView, ChatOutcome, CoordinatorSettings, DaysPerWeek, FitnessLevel, Mode,
    ModeCoordinator, PlanDocument, SynthesisOutcome,
};
use hybridone_coach::inference::config::load_or_builtin;
use hybridone_coach::inference::GeminiClient;
use hybridone_coach::render::MarkdownRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    hybridone_coach::init_tracing();

    let cwd = std::env::current_dir().context("cannot read working directory")?;
    let config = load_or_builtin(&cwd).context("failed to load coach configuration")?;
    let client = GeminiClient::from_config(&config, SYSTEM_INSTRUCTION)
        .context("failed to create generation client")?;

    tracing::info!(model = client.current_model_name(), "generation client ready");
    println!("HybridOne Coach ({})", client.current_model_name());

    let settings =
        CoordinatorSettings::from_config(&config).context("invalid default_plan in config")?;
    let mut coach = ModeCoordinator::new(Arc::new(client), settings);
    for turn in coach.turns() {
        println!("coach> {}", turn.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(coach.mode());
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match line.strip_prefix('/') {
            Some(command) => {
                if command == "quit" {
                    break;
                }
                run_command(&mut coach, command).await
            }
            None => chat(&mut coach, line).await,
        };
        if let Err(e) = result {
            println!("error: {e:#}");
        }
    }

    tracing::info!("session ended");
    Ok(())
}

fn prompt(mode: Mode) {
    use std::io::Write;

    let label = match mode {
        Mode::Chat => "you",
        Mode::Builder => "builder",
    };
    print!("{label}> ");
    let _ = std::io::stdout().flush();
}

async fn chat(coach: &mut ModeCoordinator, text: &str) -> Result<()> {
    if coach.mode() != Mode::Chat {
        bail!("switch to chat with /chat first");
    }
    let seen = coach.turns().len() + 1;
    let handled = coach.handle_message(text).await?;

    for turn in &coach.turns()[seen.min(coach.turns().len())..] {
        println!("coach> {}", turn.text);
    }

    if let ChatOutcome::Degraded(e) = &handled.chat {
        tracing::debug!(error = %e, "degraded reply shown");
    }
    if let Some(outcome) = handled.synthesis {
        report_synthesis(coach, outcome);
    }
    Ok(())
}

async fn run_command(coach: &mut ModeCoordinator, command: &str) -> Result<()> {
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    match name {
        "chat" => coach.navigate(Mode::Chat),
        "builder" => {
            coach.navigate(Mode::Builder);
            show_form(coach);
        }
        "submit" => {
            println!("generating plan...");
            let outcome = coach.submit_form().await?;
            report_synthesis(coach, outcome);
        }
        "new" => {
            coach.start_new_plan();
            show_form(coach);
        }
        "set" => {
            set_field(coach, rest)?;
            show_form(coach);
        }
        "export" => {
            let dir = rest.trim();
            if dir.is_empty() {
                bail!("usage: /export <dir>");
            }
            for artifact in coach.export_plan(&MarkdownRenderer)? {
                let path = artifact.write_to(Path::new(dir))?;
                println!("wrote {}", path.display());
            }
        }
        other => bail!("unknown command /{other}"),
    }
    Ok(())
}

fn set_field(coach: &mut ModeCoordinator, args: &str) -> Result<()> {
    let (field, value) = args
        .trim()
        .split_once(' ')
        .context("usage: /set <goal|level|days|equipment|injuries> <value>")?;
    let value = value.trim();

    let mut form = coach.form().clone();
    match field {
        "goal" => form.goal = value.to_string(),
        "level" => form.fitness_level = value.parse::<FitnessLevel>()?,
        "days" => {
            let days: u8 = value.parse().context("days must be a number")?;
            form.days_per_week = DaysPerWeek::new(days)?;
        }
        "equipment" => form.equipment = value.to_string(),
        "injuries" => form.injuries = value.to_string(),
        other => bail!("unknown field '{other}'"),
    }
    coach.update_form(form);
    Ok(())
}

fn show_form(coach: &ModeCoordinator) {
    if let BuilderView::Result(plan) = coach.builder_view() {
        show_plan(plan);
        return;
    }
    let form = coach.form();
    println!("  goal:      {}", form.goal);
    println!("  level:     {}", form.fitness_level);
    println!("  days:      {}", form.days_per_week);
    println!("  equipment: {}", form.equipment);
    println!(
        "  injuries:  {}",
        if form.injuries.is_empty() { "-" } else { form.injuries.as_str() }
    );
}

fn report_synthesis(coach: &ModeCoordinator, outcome: SynthesisOutcome) {
    match outcome {
        SynthesisOutcome::Ready(plan) => show_plan(&plan),
        SynthesisOutcome::Failed(e) => {
            println!("{}", coach.notice().unwrap_or_default());
            tracing::debug!(error = %e, "synthesis failure shown");
        }
    }
}

fn show_plan(plan: &PlanDocument) {
    println!("{} ({} weeks): {}", plan.title, plan.duration_weeks, plan.goal);
    for session in &plan.sessions {
        println!("  {}: {}", session.day, session.focus);
        for item in &session.main_work {
            println!("    - {item}");
        }
    }
    println!("use /export <dir> to save the schedule and analysis");
}

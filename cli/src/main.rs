//! CLI entrypoint for maker
//!
//! This is the main binary that wires together all layers using
//! dependency injection. Every command prints one result to stdout; logs go
//! to stderr.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use maker_application::{
    CastVoteUseCase, DecideStepInput, DecideStepUseCase, ExecutionLedger, InitializeInput,
    UpdateStepInput,
};
use maker_domain::{DEFAULT_MARGIN_K, MarginRule, SessionId, reliability};
use maker_infrastructure::{
    ConfigLoader, FileConfig, FileStateStore, JsonlStepAuditLog, JsonlVoteLog,
};
use maker_presentation::output::json::{
    error_json, margin_json, minimum_k_json, null_json, probability_json, to_json,
};
use maker_presentation::{
    Cli, Command, GlobalArgs, LedgerCommand, MathCommand, ReportFormatter, TextReport,
};
use serde_json::Value;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

type Ledger = ExecutionLedger<FileStateStore, JsonlStepAuditLog>;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            _ => {
                println!("{}", error_json(&usage_message(&e)));
                return ExitCode::FAILURE;
            }
        },
    };

    init_logging(cli.global.verbose);

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            println!("{}", error_json(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// First line of a clap error without its `error: ` prefix
fn usage_message(e: &clap::Error) -> String {
    let rendered = e.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

fn load_config(global: &GlobalArgs) -> Result<FileConfig> {
    if global.show_config {
        ConfigLoader::print_config_sources(global.config.as_deref());
    }

    let config = if global.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(global.config.as_deref())
            .map_err(|e| anyhow!("invalid configuration: {}", e))?
    };
    config.validate()?;
    debug!(?config, "Configuration loaded");
    Ok(config)
}

fn run(cli: Cli) -> Result<String> {
    let config = load_config(&cli.global)?;

    match cli.command {
        Command::Decide {
            vote_source,
            clear,
            k,
        } => decide(&vote_source, clear, k, &config),
        Command::Vote {
            vote_source,
            record,
        } => {
            let use_case = CastVoteUseCase::new(Arc::new(JsonlVoteLog::new(&vote_source)));
            let line = use_case.execute(&record)?;
            Ok(line)
        }
        Command::Ledger { session, command } => {
            // === Dependency Injection ===
            let state_dir = config
                .ledger
                .resolve_state_dir(cli.global.state_dir.as_deref());
            info!(state_dir = %state_dir.display(), session = %session, "Opening ledger");
            let ledger = ExecutionLedger::new(
                Arc::new(FileStateStore::new(&state_dir)),
                Arc::new(JsonlStepAuditLog::new(&state_dir)),
            )
            .with_policy(config.ledger.policy());
            ledger_command(&ledger, session, command)
        }
        Command::Math { command } => math(command),
    }
}

fn decide(
    vote_source: &Path,
    clear: bool,
    rule: Option<MarginRule>,
    config: &FileConfig,
) -> Result<String> {
    let rule = match rule {
        Some(rule) => rule,
        None => config.voting.margin_rule()?,
    };

    let use_case = DecideStepUseCase::new(Arc::new(JsonlVoteLog::new(vote_source)));
    let mut input = DecideStepInput::new(rule);
    if clear {
        input = input.clearing();
    }

    let decision = use_case.execute(input)?;
    Ok(to_json(&decision))
}

fn ledger_command(ledger: &Ledger, session: SessionId, command: LedgerCommand) -> Result<String> {
    match command {
        LedgerCommand::Init {
            total_steps,
            task_description,
            k,
        } => {
            let input = InitializeInput::new(session, total_steps, task_description)
                .with_k(k.unwrap_or(DEFAULT_MARGIN_K));
            Ok(to_json(&ledger.initialize(input)?))
        }
        LedgerCommand::Update {
            step_id,
            status,
            winner,
            votes,
            margin,
            red_flags,
        } => {
            let mut input = UpdateStepInput::new(session, step_id, status)
                .with_counts(votes, margin, red_flags);
            if let Some(winner) = parse_winner(winner.as_deref())? {
                input = input.with_winner(winner);
            }
            Ok(to_json(&ledger.update_step(input)?))
        }
        LedgerCommand::Load => Ok(match ledger.load(&session)? {
            Some(state) => to_json(&state),
            None => null_json(),
        }),
        LedgerCommand::GetK => Ok(margin_json(ledger.margin_k(&session)?)),
        LedgerCommand::Resume => Ok(match ledger.resume_point(&session)? {
            Some(resume) => to_json(&resume),
            None => null_json(),
        }),
        LedgerCommand::Report => {
            let state = ledger.load(&session)?;
            Ok(TextReport.format_report(state.as_ref()))
        }
        LedgerCommand::Complete { success } => {
            Ok(to_json(&ledger.mark_complete(&session, success)?))
        }
    }
}

/// `None` for an absent or `null` winner, otherwise the decoded JSON
fn parse_winner(raw: Option<&str>) -> Result<Option<Value>> {
    match raw {
        None | Some("null") => Ok(None),
        Some(raw) => {
            let value: Value = serde_json::from_str(raw).context("winner is not valid JSON")?;
            Ok((!value.is_null()).then_some(value))
        }
    }
}

fn math(command: MathCommand) -> Result<String> {
    let output = match command {
        MathCommand::StepProbability { p, k } => {
            probability_json(reliability::per_step_success_probability(p, k)?)
        }
        MathCommand::FullProbability { p, k, s, m } => {
            probability_json(reliability::full_task_success_probability(p, k, s, m)?)
        }
        MathCommand::MinimumK { p, s, target, m } => {
            minimum_k_json(reliability::minimum_k_for_target(p, s, target, m)?, target)
        }
        MathCommand::CostEstimate {
            p,
            k,
            s,
            cost_per_call,
        } => to_json(&reliability::expected_cost_estimate(p, k, s, cost_per_call)?),
        MathCommand::RecommendK { p, s, task_type } => {
            to_json(&reliability::recommend_k(p, s, task_type)?)
        }
    };
    Ok(output)
}

//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use maker_domain::{MarginRule, SessionId, StepStatus, TaskType};
use std::path::PathBuf;

/// CLI arguments for maker
#[derive(Parser, Debug)]
#[command(name = "maker")]
#[command(author, version, about = "K-ahead voting and execution ledger for multi-step tasks")]
#[command(long_about = r#"
maker picks one answer per step out of many noisy proposals and keeps a
durable ledger of a multi-step run so it can be resumed.

Per step, a driver:
1. Appends proposals with `maker vote <dir> <record>`
2. Calls `maker decide <dir> --clear` until a winner is declared
3. Records the outcome with `maker ledger <session> update ...`

Configuration files are loaded from (in priority order):
1. MAKER_* environment variables   (e.g. MAKER_VOTING__K=5)
2. --config <path>                 Explicit config file
3. ./maker.toml                    Project-level config
4. ~/.config/maker/config.toml     Global config

Example:
  maker vote ./votes '{"action":"move","result":"A->C"}'
  maker decide ./votes --clear --k 3
  maker ledger run-42 init 10 "Towers of Hanoi"
  maker ledger run-42 update step-1 decided '{"action":"move"}' 5 3 0
  maker math recommend-k 0.9 1000 high-stakes
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Flags accepted by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations on stderr
    #[arg(long, global = true)]
    pub show_config: bool,

    /// Root directory for session state (overrides ledger.state_dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub state_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tally the votes in a vote source and report whether a winner emerged
    Decide {
        /// Directory holding votes.jsonl
        vote_source: PathBuf,

        /// Clear the votes once a winner is declared
        #[arg(long)]
        clear: bool,

        /// Required lead over the runner-up, `N` or `k=N` (defaults to voting.k)
        #[arg(long, value_name = "N")]
        k: Option<MarginRule>,
    },

    /// Append one JSON proposal to a vote source
    Vote {
        /// Directory holding votes.jsonl
        vote_source: PathBuf,

        /// JSON record with `action` and `result` fields
        record: String,
    },

    /// Read or update a session's execution ledger
    Ledger {
        /// Session identifier
        session: SessionId,

        #[command(subcommand)]
        command: LedgerCommand,
    },

    /// Reliability and cost estimates for choosing k
    Math {
        #[command(subcommand)]
        command: MathCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// Start a session, discarding any previous state for it
    Init {
        total_steps: u32,
        task_description: String,
        /// Voting margin for the session
        k: Option<u32>,
    },

    /// Record the outcome of one step
    Update {
        step_id: String,
        /// voting, decided or failed
        status: StepStatus,
        /// Winning record as JSON, or `null`
        winner: Option<String>,
        #[arg(default_value_t = 0)]
        votes: u64,
        #[arg(default_value_t = 0)]
        margin: u64,
        #[arg(default_value_t = 0)]
        red_flags: u64,
    },

    /// Print the whole state document (`null` if absent)
    Load,

    /// Print the session's voting margin
    #[command(name = "get-k")]
    GetK,

    /// Print where to resume (`null` if absent)
    Resume,

    /// Print a human-readable report
    Report,

    /// Finalize the session
    Complete {
        /// `true` for success, `false` for failure
        #[arg(default_value = "true", value_parser = parse_success, action = clap::ArgAction::Set)]
        success: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum MathCommand {
    /// Probability that one step picks the correct answer
    #[command(alias = "step_probability")]
    StepProbability { p: f64, k: u32 },

    /// Probability that every step of a task is correct
    #[command(alias = "full_probability")]
    FullProbability {
        p: f64,
        k: u32,
        s: u32,
        /// Steps decided per voting round
        #[arg(long, default_value_t = 1)]
        m: u32,
    },

    /// Smallest k reaching a target task success probability
    #[command(alias = "minimum_k")]
    MinimumK {
        p: f64,
        s: u32,
        target: f64,
        #[arg(long, default_value_t = 1)]
        m: u32,
    },

    /// Expected number of calls and cost of a task
    #[command(alias = "cost_estimate")]
    CostEstimate {
        p: f64,
        k: u32,
        s: u32,
        cost_per_call: f64,
    },

    /// Recommended k for a task profile
    #[command(alias = "recommend_k")]
    RecommendK {
        p: f64,
        s: u32,
        /// fast, standard or high-stakes
        #[arg(default_value = "standard")]
        task_type: TaskType,
    },
}

fn parse_success(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" | "success" => Ok(true),
        "false" | "failed" => Ok(false),
        _ => Err(format!("expected true or false, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("maker").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_decide_args() {
        let cli = parse(&["decide", "/tmp/v", "--clear", "--k", "5", "-vv"]).unwrap();
        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Command::Decide {
                vote_source,
                clear,
                k,
            } => {
                assert_eq!(vote_source, PathBuf::from("/tmp/v"));
                assert!(clear);
                assert_eq!(k.map(|rule| rule.k()), Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        match parse(&["decide", "/tmp/v", "--k", "k=2"]).unwrap().command {
            Command::Decide { k, .. } => assert_eq!(k, MarginRule::new(2).ok()),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(parse(&["decide", "/tmp/v", "--k", "0"]).is_err());
        assert!(parse(&["decide", "/tmp/v", "--k", "many"]).is_err());
    }

    #[test]
    fn test_ledger_update_defaults() {
        let cli = parse(&["ledger", "s1", "update", "step-1", "decided"]).unwrap();
        match cli.command {
            Command::Ledger {
                session,
                command:
                    LedgerCommand::Update {
                        status,
                        winner,
                        votes,
                        red_flags,
                        ..
                    },
            } => {
                assert_eq!(session.as_str(), "s1");
                assert_eq!(status, StepStatus::Decided);
                assert!(winner.is_none());
                assert_eq!(votes, 0);
                assert_eq!(red_flags, 0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_ledger_get_k_and_global_flag_after_subcommand() {
        let cli = parse(&["ledger", "s1", "get-k", "--state-dir", "/srv/state"]).unwrap();
        assert_eq!(cli.global.state_dir, Some(PathBuf::from("/srv/state")));
        assert!(matches!(
            cli.command,
            Command::Ledger {
                command: LedgerCommand::GetK,
                ..
            }
        ));
    }

    #[test]
    fn test_complete_success_flag() {
        let cli = parse(&["ledger", "s1", "complete"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Ledger {
                command: LedgerCommand::Complete { success: true },
                ..
            }
        ));

        let cli = parse(&["ledger", "s1", "complete", "False"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Ledger {
                command: LedgerCommand::Complete { success: false },
                ..
            }
        ));

        assert!(parse(&["ledger", "s1", "complete", "maybe"]).is_err());
    }

    #[test]
    fn test_invalid_arguments_are_rejected() {
        assert!(parse(&["ledger", "../etc", "load"]).is_err());
        assert!(parse(&["ledger", "s1", "update", "step-1", "finished"]).is_err());
        assert!(parse(&["ledger", "s1", "init", "-3", "task"]).is_err());
        assert!(parse(&["math", "recommend-k", "0.9", "10", "reckless"]).is_err());
    }

    #[test]
    fn test_math_aliases() {
        let cli = parse(&["math", "full_probability", "0.9", "3", "100"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Math {
                command: MathCommand::FullProbability { k: 3, s: 100, m: 1, .. }
            }
        ));

        let cli = parse(&["math", "recommend-k", "0.9", "100", "high-stakes"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Math {
                command: MathCommand::RecommendK {
                    task_type: TaskType::HighStakes,
                    ..
                }
            }
        ));
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    judge::{Judge, VisionJudgeClient},
    orchestrator::{spawn_signal_listener, Orchestrator, RunSummary, StartupError},
    settings::{AppConfig, LoggingSettings},
    utils::logging,
};

#[derive(Parser, Debug)]
#[command(name = "angeleyes")]
#[command(about = "Watches your screen and posture and reminds you out loud when you drift")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start focus and posture monitoring
    Start {
        /// What you are working on (prompted for when omitted)
        #[arg(short, long)]
        goal: Option<String>,

        /// Config file (default: ~/.angeleyes/config.yaml, then ./angeleyes.yaml)
        #[arg(short, long, env = "ANGELEYES_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Check that the vision model server is reachable
    Check {
        #[arg(short, long, env = "ANGELEYES_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration as YAML
    Config {
        #[arg(short, long, env = "ANGELEYES_CONFIG")]
        config: Option<PathBuf>,

        /// Write the configuration to this path instead of printing it
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Start { goal, config } => run_start(goal, config.as_deref()).await,
        Commands::Check { config } => run_check(config.as_deref()).await,
        Commands::Config { config, write } => run_config(config.as_deref(), write.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = AppConfig::load(path).context("Failed to load configuration")?;
    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Warning: file logging disabled: {err:#}");
        let console_only = LoggingSettings {
            log_dir: None,
            ..config.logging.clone()
        };
        let _ = logging::init(&console_only);
    }
    Ok(config)
}

async fn run_start(goal: Option<String>, config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;

    let goal = match goal {
        Some(goal) => normalize_goal(&goal),
        None => prompt_goal().await?,
    };
    let Some(goal) = goal else {
        eprintln!("No goal provided. Exiting.");
        return Ok(ExitCode::FAILURE);
    };

    println!("{}", monitoring_summary(&config, &goal));

    let orchestrator = Orchestrator::from_config(&config, goal)?;
    let listener = spawn_signal_listener(orchestrator.shutdown_token());
    let result = orchestrator.run().await;
    listener.abort();

    session_exit_code(result, &config.judge.base_url)
}

/// 0 after a requested shutdown, 1 when startup failed; other errors propagate.
fn session_exit_code(result: Result<RunSummary>, base_url: &str) -> Result<ExitCode> {
    match result {
        Ok(summary) => {
            log::info!(
                "Session ended: {} focus checks ({} alerts), {} posture checks ({} alerts)",
                summary.focus.judged,
                summary.focus.alerts,
                summary.posture.judged,
                summary.posture.alerts
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is::<StartupError>() => {
            eprintln!("Error: {err}");
            eprintln!("Start the model server at {base_url} and try again.");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err),
    }
}

async fn run_check(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let judge = VisionJudgeClient::new(config.judge.clone())?;

    let reachable = judge.verify_reachable().await;
    judge.close().await;

    if reachable {
        println!("Vision judge reachable at {}", config.judge.base_url);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Vision judge NOT reachable at {}", config.judge.base_url);
        Ok(ExitCode::FAILURE)
    }
}

fn run_config(config_path: Option<&Path>, write: Option<&Path>) -> Result<ExitCode> {
    let config = AppConfig::load(config_path).context("Failed to load configuration")?;
    match write {
        Some(path) => {
            config.save(path)?;
            println!("Configuration written to {}", path.display());
        }
        None => print!("{}", config.to_yaml()?),
    }
    Ok(ExitCode::SUCCESS)
}

async fn prompt_goal() -> Result<Option<String>> {
    print!("What's your goal for this session? ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read goal from stdin")?;
    Ok(normalize_goal(&line))
}

fn normalize_goal(raw: &str) -> Option<String> {
    let goal = raw.trim();
    (!goal.is_empty()).then(|| goal.to_string())
}

fn monitoring_summary(config: &AppConfig, goal: &str) -> String {
    format!(
        "Goal: {goal}\n\
         Focus check every {}s, posture check every {}s ({} images)\n\
         Vision model: {} at {}\n\
         Press Ctrl+C to stop.",
        config.focus.check_interval,
        config.posture.check_interval,
        config.posture.images_per_check,
        config.judge.model,
        config.judge.base_url,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn start_accepts_goal_and_config() {
        let cli = Cli::try_parse_from([
            "angeleyes",
            "start",
            "--goal",
            "write report",
            "--config",
            "/etc/angeleyes.yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Start { goal, config } => {
                assert_eq!(goal.as_deref(), Some("write report"));
                assert_eq!(config, Some(PathBuf::from("/etc/angeleyes.yaml")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["angeleyes"]).is_err());
    }

    #[test]
    fn blank_goal_is_rejected() {
        assert_eq!(normalize_goal("   \n"), None);
        assert_eq!(normalize_goal("  fix bug 42\n").as_deref(), Some("fix bug 42"));
    }

    #[test]
    fn summary_mentions_goal_and_cadence() {
        let summary = monitoring_summary(&AppConfig::default(), "write report");
        assert!(summary.contains("Goal: write report"));
        assert!(summary.contains("every 60s"));
        assert!(summary.contains("http://localhost:1234/v1"));
    }

    #[test]
    fn config_write_produces_loadable_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("angeleyes.yaml");

        run_config(None, Some(&path)).unwrap();
        assert!(AppConfig::load(Some(&path)).is_ok());
    }

    fn same_code(a: ExitCode, b: ExitCode) -> bool {
        format!("{a:?}") == format!("{b:?}")
    }

    #[test]
    fn requested_shutdown_exits_zero() {
        let code = session_exit_code(Ok(RunSummary::default()), "http://localhost:1234/v1").unwrap();
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn unreachable_judge_exits_one() {
        let code = session_exit_code(
            Err(StartupError::JudgeUnreachable.into()),
            "http://localhost:1234/v1",
        )
        .unwrap();
        assert!(same_code(code, ExitCode::FAILURE));
    }

    #[test]
    fn other_failures_propagate() {
        let result = session_exit_code(Err(anyhow::anyhow!("disk full")), "http://x");
        assert!(result.is_err());
    }
}

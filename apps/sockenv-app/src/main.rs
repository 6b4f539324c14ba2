//! Remote socket environment CLI.
//!
//! Provides two modes of operation:
//! - `run`: Connect to a peer, run N episodes with a constant action and
//!   print per-episode statistics
//! - `config`: Print the effective client configuration as TOML

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sockenv_client::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Client for environments served over a socket.
#[derive(Parser)]
#[command(name = "sockenv", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run episodes against a peer and print statistics.
    Run {
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the configured host.
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port.
        #[arg(short, long)]
        port: Option<u16>,

        /// Number of episodes to run.
        #[arg(short = 'n', long, default_value_t = 1)]
        episodes: u32,

        /// Maximum steps per episode.
        #[arg(short, long, default_value_t = 100)]
        steps: u32,

        /// Constant action sent on every step.
        #[arg(short, long, num_args = 1.., allow_negative_numbers = true, default_value = "0.0")]
        action: Vec<f64>,

        /// Length of the reported state vector.
        #[arg(long, default_value_t = 1)]
        state_dim: usize,
    },

    /// Print the effective configuration as TOML.
    Config {
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<ClientConfig, ClientError> {
    Ok(match path {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    })
}

/// Per-episode result of [`run_episodes`].
#[derive(Debug, Clone, PartialEq)]
struct EpisodeSummary {
    steps: u32,
    reward: f64,
    terminal: bool,
}

fn run_episodes(
    env: &mut RemoteEnvironment,
    episodes: u32,
    max_steps: u32,
    action: &[f64],
) -> Result<Vec<EpisodeSummary>, ClientError> {
    let mut summaries = Vec::new();
    for ep in 0..episodes {
        env.reset()?;
        let mut summary = EpisodeSummary {
            steps: 0,
            reward: 0.0,
            terminal: false,
        };
        for _ in 0..max_steps {
            let outcome = env.execute(action)?;
            summary.steps += 1;
            summary.reward += outcome.reward_value().unwrap_or(0.0);
            if outcome.is_terminal() {
                summary.terminal = true;
                break;
            }
        }
        println!(
            "episode {}: steps={}, reward={:.3}{}",
            ep + 1,
            summary.steps,
            summary.reward,
            if summary.terminal { ", terminal" } else { "" }
        );
        summaries.push(summary);
    }
    Ok(summaries)
}

fn run(
    config: &ClientConfig,
    episodes: u32,
    steps: u32,
    action: &[f64],
    state_dim: usize,
) -> Result<(), ClientError> {
    let description = StaticDescription::new(
        SpaceSpec::float(vec![state_dim]),
        SpaceSpec::float(vec![action.len()]),
    )
    .with_max_episode_timesteps(steps);

    info!("running {episodes} episode(s) against {}", config.address());
    let summaries = with_environment(config, description, |env| {
        run_episodes(env, episodes, steps, action)
    })?;

    let total_steps: u32 = summaries.iter().map(|s| s.steps).sum();
    println!("\ntotal: episodes={}, steps={total_steps}", summaries.len());
    Ok(())
}

fn print_config(config: &ClientConfig) -> Result<(), ClientError> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Filter used when `RUST_LOG` is unset: payload logging (verbosity 2+) needs
/// `debug`, lifecycle messages need `info`, and silent still shows warnings.
const fn default_directive(verbosity: Verbosity) -> &'static str {
    if verbosity.payloads() {
        "sockenv=debug"
    } else if verbosity.lifecycle() {
        "sockenv=info"
    } else {
        "sockenv=warn"
    }
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = match &cli.command {
        Commands::Run { config, .. } | Commands::Config { config } => config.clone(),
    };
    let loaded = load_config(config_path.as_deref());
    init_tracing(
        loaded
            .as_ref()
            .map_or(Verbosity::LIFECYCLE, |cfg| cfg.verbosity),
    );

    let result = loaded.and_then(|mut cfg| match cli.command {
        Commands::Run {
            host,
            port,
            episodes,
            steps,
            action,
            state_dim,
            ..
        } => {
            if host.is_some() {
                cfg.host = host;
            }
            if let Some(port) = port {
                cfg.port = port;
            }
            run(&cfg, episodes, steps, &action, state_dim)
        }
        Commands::Config { .. } => print_config(&cfg),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use sockenv_test_utils::{CountingEnv, spawn_peer};

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_negative_actions() {
        let cli = Cli::parse_from(["sockenv", "run", "--action", "-0.5", "0.25"]);
        match cli.command {
            Commands::Run { action, .. } => assert_eq!(action, vec![-0.5, 0.25]),
            Commands::Config { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn default_filter_follows_verbosity() {
        assert_eq!(default_directive(Verbosity::SILENT), "sockenv=warn");
        assert_eq!(default_directive(Verbosity::LIFECYCLE), "sockenv=info");
        assert_eq!(default_directive(Verbosity::PAYLOADS), "sockenv=debug");
        assert_eq!(default_directive(Verbosity(5)), "sockenv=debug");
    }

    #[test]
    fn default_config_without_file() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn episodes_stop_at_terminal() {
        let peer = spawn_peer(Framing::Raw, CountingEnv::new(3));
        let config = ClientConfig::new("127.0.0.1", peer.port()).with_verbosity(Verbosity::SILENT);
        let description = StaticDescription::new(SpaceSpec::float(vec![2]), SpaceSpec::float(vec![1]));

        let summaries = with_environment(&config, description, |env| {
            run_episodes(env, 2, 10, &[0.5])
        })
        .unwrap();

        assert_eq!(summaries.len(), 2);
        for summary in &summaries {
            assert_eq!(summary.steps, 3);
            assert!(summary.terminal);
            assert!((summary.reward - 3.0).abs() < 1e-9);
        }
        let tags = peer.join();
        assert_eq!(tags.len(), 2 * (2 + 3 * 5) + 1);
        assert_eq!(tags.last().map(String::as_str), Some("CLOSE"));
    }
}

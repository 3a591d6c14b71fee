//! Run every poll scenario against a simulated node.
//!
//! # Usage
//!
//! ```sh
//! cargo run --release --bin avalanche-harness -- --seed 7 --log-level debug
//! ```
//!
//! The process exits with a non-zero status at the first failed check. Use `--behavior` to make
//! the simulated node misbehave and watch the harness catch it.

use avalanche_cryptography::ed25519::PrivateKey;
use avalanche_harness::{
    client::{self, Client},
    mocks::{self, Behavior},
    node::wait_for_rpc,
    orchestrator::{self, Orchestrator},
    transport::memory,
    Error,
};
use clap::{value_parser, Arg, ArgAction, Command};
use std::{process::ExitCode, str::FromStr, time::Duration};
use tracing::{error, info, Level};

/// Frames buffered in each direction of the in-memory connection.
const CHANNEL_CAPACITY: usize = 64;

fn main() -> ExitCode {
    // Parse arguments
    let matches = Command::new("avalanche-harness")
        .about("poll a node for avalanche votes and check every response")
        .arg(
            Arg::new("seed")
                .long("seed")
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Seed for the node key, genesis, and unknown identifiers"),
        )
        .arg(
            Arg::new("response-timeout-ms")
                .long("response-timeout-ms")
                .default_value("10000")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("cooldown")
                .long("cooldown")
                .default_value("0")
                .value_parser(value_parser!(u32))
                .help("Cooldown (ms) the simulated node advertises"),
        )
        .arg(
            Arg::new("warmup-ms")
                .long("warmup-ms")
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("How long the simulated node rejects calls after starting"),
        )
        .arg(
            Arg::new("behavior")
                .long("behavior")
                .default_value("honest")
                .value_parser(["honest", "truncate", "corrupt", "silent"]),
        )
        .arg(
            Arg::new("worker-threads")
                .long("worker-threads")
                .default_value("2")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .default_value("info")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .get_matches();

    // Create logger
    let level = matches
        .get_one::<String>("log-level")
        .and_then(|level| Level::from_str(level).ok())
        .unwrap_or(Level::INFO);
    let logger = tracing_subscriber::fmt().with_max_level(level);
    if matches.get_flag("json") {
        logger.json().init();
    } else {
        logger.init();
    }

    // Collect configuration
    let seed = matches.get_one::<u64>("seed").copied().unwrap_or_default();
    let response_timeout = matches
        .get_one::<u64>("response-timeout-ms")
        .copied()
        .map(Duration::from_millis)
        .unwrap_or_default();
    let behavior = match matches.get_one::<String>("behavior").map(String::as_str) {
        Some("truncate") => Behavior::TruncateVotes,
        Some("corrupt") => Behavior::CorruptSignature,
        Some("silent") => Behavior::Silent,
        _ => Behavior::Honest,
    };
    let mut node_cfg = mocks::Config::new(PrivateKey::from_seed(seed));
    node_cfg.seed = seed;
    node_cfg.cooldown = matches.get_one::<u32>("cooldown").copied().unwrap_or_default();
    node_cfg.warmup = matches
        .get_one::<u64>("warmup-ms")
        .copied()
        .map(Duration::from_millis)
        .unwrap_or_default();
    node_cfg.behavior = behavior;
    let orchestrator_cfg = orchestrator::Config {
        response_timeout,
        seed,
        ..Default::default()
    };
    let client_cfg = client::Config {
        ping_timeout: response_timeout,
        ..Default::default()
    };
    info!(seed, ?behavior, ?response_timeout, "configured harness");

    // Start runtime
    let worker_threads = matches
        .get_one::<usize>("worker-threads")
        .copied()
        .unwrap_or(2);
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(?err, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(async move {
        let node = mocks::Node::new(node_cfg);
        let ((sender, receiver), (peer_sender, peer_receiver)) = memory::channel(CHANNEL_CAPACITY);
        node.attach(peer_sender, peer_receiver);
        wait_for_rpc(&node, Duration::from_secs(60)).await?;

        let mut client = Client::new(client_cfg, sender);
        client.connect(receiver).await?;
        let mut orchestrator = Orchestrator::new(orchestrator_cfg, node, client).await?;
        orchestrator.run().await?;
        Ok::<_, Error>(())
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(?err, "harness failed");
            ExitCode::FAILURE
        }
    }
}

//! Console front end for the call-center dispatcher.
//!
//! Reads one command per line from stdin:
//!
//! - `<n>`    dispatch `n` calls with fresh 8-character ids
//! - `status` print a JSON snapshot of the dispatcher
//! - `exit`   stop reading (EOF does the same)
//!
//! Anything else is ignored and the loop continues. Once input ends, every
//! accepted call is drained before the total is printed. Ctrl-C cancels
//! in-progress calls instead of waiting for them.
//!
//! ```bash
//! CALL_CENTER_OPERATOR_COUNT=5 call-center --max-concurrent-calls 4
//! RUST_LOG=call_center=debug call-center --admission-permits 2
//! ```

use anyhow::{Context, Result};
use call_center::{CallCenterConfig, DispatchError, Dispatcher};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Command-line arguments. Each flag overrides its `CALL_CENTER_*`
/// environment variable.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Shortest simulated call, in seconds
    #[arg(long)]
    min_call_duration: Option<u64>,

    /// Longest simulated call, in seconds
    #[arg(long)]
    max_call_duration: Option<u64>,

    /// Worker pool size
    #[arg(long)]
    max_concurrent_calls: Option<usize>,

    #[arg(long)]
    operators: Option<usize>,

    #[arg(long)]
    supervisors: Option<usize>,

    #[arg(long)]
    directors: Option<usize>,

    /// Calls allowed in active handling at once (defaults to staff total)
    #[arg(long)]
    admission_permits: Option<usize>,
}

impl Args {
    fn apply(&self, mut config: CallCenterConfig) -> CallCenterConfig {
        if let Some(v) = self.min_call_duration {
            config.min_call_duration_seconds = v;
        }
        if let Some(v) = self.max_call_duration {
            config.max_call_duration_seconds = v;
        }
        if let Some(v) = self.max_concurrent_calls {
            config.max_concurrent_calls = v;
        }
        if let Some(v) = self.operators {
            config.operator_count = v;
        }
        if let Some(v) = self.supervisors {
            config.supervisor_count = v;
        }
        if let Some(v) = self.directors {
            config.director_count = v;
        }
        if self.admission_permits.is_some() {
            config.admission_permits = self.admission_permits;
        }
        config
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Dispatch(u64),
    Status,
    Exit,
    Ignored,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") {
        Command::Exit
    } else if line.eq_ignore_ascii_case("status") {
        Command::Status
    } else {
        line.parse().map(Command::Dispatch).unwrap_or(Command::Ignored)
    }
}

/// Dispatches between yields while a batch is submitted, so Ctrl-C is
/// serviced even for very large counts.
const DISPATCH_BATCH: u64 = 1024;

fn new_call_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

async fn dispatch_calls(dispatcher: &Dispatcher, count: u64) -> Result<u64, DispatchError> {
    for sent in 0..count {
        if sent > 0 && sent % DISPATCH_BATCH == 0 {
            tokio::task::yield_now().await;
        }
        dispatcher.dispatch(new_call_id())?;
    }
    Ok(count)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = args.apply(CallCenterConfig::from_env());
    let dispatcher =
        Dispatcher::from_config(&config).context("invalid call-center configuration")?;
    info!(
        operators = config.operator_count,
        supervisors = config.supervisor_count,
        directors = config.director_count,
        "Call center open"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interrupt = std::pin::pin!(tokio::signal::ctrl_c());
    let mut interrupted = false;
    loop {
        println!("Number of calls to process ('exit' to finish) : ");
        let line = tokio::select! {
            _ = &mut interrupt => {
                interrupted = true;
                break;
            }
            line = lines.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else { break };

        match parse_command(&line) {
            Command::Exit => break,
            Command::Status => {
                println!("{}", serde_json::to_string_pretty(&dispatcher.snapshot())?);
            }
            Command::Dispatch(n) => {
                tokio::select! {
                    biased;
                    _ = &mut interrupt => {
                        interrupted = true;
                        break;
                    }
                    sent = dispatch_calls(&dispatcher, n) => {
                        let sent = sent?;
                        debug!(calls = sent, "batch dispatched");
                    }
                }
            }
            Command::Ignored => debug!(input = %line, "ignoring input"),
        }
    }

    if interrupted {
        dispatcher.cancel_now().await;
    } else {
        tokio::select! {
            _ = dispatcher.stop_and_drain() => {}
            _ = &mut interrupt => dispatcher.cancel_now().await,
        }
    }

    println!("Total calls processed = {}", dispatcher.calls_answered());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counts_and_keywords() {
        assert_eq!(parse_command("12"), Command::Dispatch(12));
        assert_eq!(parse_command("  3 \n"), Command::Dispatch(3));
        assert_eq!(parse_command("EXIT"), Command::Exit);
        assert_eq!(parse_command("Status"), Command::Status);
    }

    #[test]
    fn malformed_input_is_ignored() {
        assert_eq!(parse_command("ten"), Command::Ignored);
        assert_eq!(parse_command("-4"), Command::Ignored);
        assert_eq!(parse_command(""), Command::Ignored);
    }

    #[test]
    fn call_ids_are_eight_hex_chars() {
        let id = new_call_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test(start_paused = true)]
    async fn large_batch_yields_to_other_tasks() {
        let dispatcher = Dispatcher::from_config(&CallCenterConfig::default()).unwrap();
        let ticks = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    tokio::task::yield_now().await;
                }
            })
        };

        let sent = dispatch_calls(&dispatcher, DISPATCH_BATCH * 4).await.unwrap();

        assert_eq!(sent, DISPATCH_BATCH * 4);
        assert!(ticks.load(std::sync::atomic::Ordering::Relaxed) > 0);
        ticker.abort();
        dispatcher.cancel_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_wins_over_a_running_batch() {
        let dispatcher = Dispatcher::from_config(&CallCenterConfig::default()).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = tx.send(());
        });

        let finished = tokio::select! {
            biased;
            _ = rx => false,
            _ = dispatch_calls(&dispatcher, u64::MAX) => true,
        };

        assert!(!finished);
        assert!(dispatcher.stats().submitted() <= DISPATCH_BATCH * 2);
        dispatcher.cancel_now().await;
    }

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from(["call-center", "--operators", "7", "--admission-permits", "4"]);
        let config = args.apply(CallCenterConfig::default());
        assert_eq!(config.operator_count, 7);
        assert_eq!(config.admission_permits, Some(4));
        assert_eq!(config.supervisor_count, 2);
    }
}

//! chainwatch CLI — run observer operations against a chain gateway.
//!
//! Usage:
//! ```bash
//! # Latest committed height
//! chainwatch height --url https://greenfield-chain.bnbchain.org
//!
//! # Wait for a transaction to be included (two endpoints, failover)
//! chainwatch confirm --tx 9F3A… --url https://a.example --url https://b.example
//!
//! # Wait for an object to seal, at most 20 polls
//! chainwatch seal --object-id 7731 --iterations 20 --url https://a.example
//! ```

use std::env;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use chainwatch_core::{CallContext, CancellationToken, ChainObserver, ObserverConfig, ObserverError};
use chainwatch_http::{EndpointPool, PoolConfig};
use chainwatch_observability::{init_tracing, LogConfig};

const DEFAULT_ITERATIONS: u32 = 10;

enum Failure {
    Usage(String),
    Observer(ObserverError),
}

impl From<ObserverError> for Failure {
    fn from(e: ObserverError) -> Self {
        Self::Observer(e)
    }
}

impl Failure {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Observer(e) if e.is_timeout() => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "{msg}"),
            Self::Observer(e) => write!(f, "{e}"),
        }
    }
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "version" | "--version" | "-V" => {
            println!("chainwatch {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        _ => {}
    }

    let flags = &args[2..];
    init_tracing(&LogConfig {
        level: parse_flag(flags, "--log").unwrap_or_else(|| "warn".into()),
        json: has_flag(flags, "--json-logs"),
        ..Default::default()
    });

    if let Err(e) = run(&args[1], flags).await {
        eprintln!("Error: {e}");
        if matches!(e, Failure::Usage(_)) {
            print_usage();
        }
        process::exit(e.exit_code());
    }
}

async fn run(command: &str, flags: &[String]) -> Result<(), Failure> {
    let observer = build_observer(flags)?;
    let ctx = build_context(flags)?;

    match command {
        "height" => {
            let height = observer.current_height(&ctx).await?;
            println!("{height}");
        }
        "wait-block" => {
            let height = observer.wait_for_next_block(&ctx).await?;
            println!("new block at height {height}");
        }
        "confirm" => {
            let tx_hash = parse_flag(flags, "--tx").ok_or_else(|| usage("--tx is required"))?;
            let result = observer.confirm_transaction(&ctx, &tx_hash).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&result).unwrap_or_else(|_| format!("{result:?}"))
            );
        }
        "seal" => {
            let (object_id, iterations) = object_args(flags)?;
            observer.listen_object_seal(&ctx, object_id, iterations).await?;
            println!("object {object_id} sealed");
        }
        "reject" => {
            let (object_id, iterations) = object_args(flags)?;
            observer
                .listen_reject_unseal_object(&ctx, object_id, iterations)
                .await?;
            println!("object {object_id} rejected");
        }
        other => return Err(usage(&format!("Unknown command: {other}"))),
    }
    Ok(())
}

fn print_usage() {
    println!("chainwatch {}", env!("CARGO_PKG_VERSION"));
    println!("Observe chain state transitions by polling a REST gateway\n");
    println!("USAGE:");
    println!("    chainwatch <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    height       Print the latest committed block height");
    println!("    wait-block   Wait for the next block");
    println!("    confirm      Wait for a transaction to be included");
    println!("    seal         Wait for an object to be sealed");
    println!("    reject       Wait for an unsealed object to be rejected");
    println!("    version      Print version");
    println!("    help         Print this help\n");
    println!("FLAGS:");
    println!("    --url <URL>          Gateway URL, repeat for failover  [required]");
    println!("    --config <FILE>      JSON observer config");
    println!("    --timeout-ms <MS>    Overall deadline for the call");
    println!("    --tx <HASH>          Transaction hash (confirm)");
    println!("    --object-id <ID>     Object id (seal, reject)");
    println!("    --iterations <N>     Poll budget (seal, reject)  [default: {DEFAULT_ITERATIONS}]");
    println!("    --log <LEVEL>        Log level  [default: warn]");
    println!("    --json-logs          Emit JSON logs\n");
    println!("EXIT CODES:");
    println!("    0 success, 1 error, 2 timed out");
}

fn usage(msg: &str) -> Failure {
    Failure::Usage(msg.to_string())
}

fn build_observer(flags: &[String]) -> Result<ChainObserver, Failure> {
    let urls = parse_flags(flags, "--url");
    if urls.is_empty() {
        return Err(usage("--url is required"));
    }
    let config = match parse_flag(flags, "--config") {
        Some(path) => ObserverConfig::from_json_file(path)?,
        None => ObserverConfig::default(),
    };
    let pool = EndpointPool::http(urls, PoolConfig::default()).map_err(ObserverError::from)?;
    Ok(ChainObserver::new(Arc::new(pool), config)?)
}

/// Caller context cancelled by Ctrl-C and bounded by `--timeout-ms`.
fn build_context(flags: &[String]) -> Result<CallContext, Failure> {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let ctx = CallContext::with_cancel(token);
    match parse_flag(flags, "--timeout-ms") {
        Some(ms) => {
            let ms: u64 = ms
                .parse()
                .map_err(|_| usage(&format!("invalid --timeout-ms: {ms}")))?;
            Ok(ctx.with_timeout(Duration::from_millis(ms)))
        }
        None => Ok(ctx),
    }
}

fn object_args(flags: &[String]) -> Result<(u64, u32), Failure> {
    let object_id = parse_flag(flags, "--object-id")
        .ok_or_else(|| usage("--object-id is required"))?
        .parse()
        .map_err(|_| usage("--object-id must be an unsigned integer"))?;
    let iterations = match parse_flag(flags, "--iterations") {
        Some(n) => n
            .parse()
            .map_err(|_| usage("--iterations must be a positive integer"))?,
        None => DEFAULT_ITERATIONS,
    };
    Ok((object_id, iterations))
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

fn parse_flags(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn repeated_url_flags() {
        let a = args(&["--url", "https://a", "--tx", "AB", "--url", "https://b"]);
        assert_eq!(parse_flags(&a, "--url"), vec!["https://a", "https://b"]);
        assert_eq!(parse_flag(&a, "--tx").as_deref(), Some("AB"));
        assert!(parse_flag(&a, "--config").is_none());
    }

    #[test]
    fn object_args_defaults_iterations() {
        let a = args(&["--object-id", "42"]);
        let (id, iterations) = object_args(&a).ok().unwrap();
        assert_eq!(id, 42);
        assert_eq!(iterations, DEFAULT_ITERATIONS);
        assert!(object_args(&args(&["--object-id", "x"])).is_err());
    }

    #[test]
    fn timeouts_exit_with_two() {
        let timeout = Failure::Observer(ObserverError::SealTimeout {
            object_id: 1,
            iterations: 1,
        });
        assert_eq!(timeout.exit_code(), 2);
        assert_eq!(Failure::Observer(ObserverError::Cancelled).exit_code(), 1);
        assert_eq!(usage("x").exit_code(), 1);
    }
}

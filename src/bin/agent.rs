//! ctxbridge-agent
//!
//! Reads newline-delimited envelopes `{"topic": ..., "body": ...}` from a file
//! or stdin and dispatches each one to the context broker.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ctxbridge::{
    Config, ContextStore, DispatchOutcome, Dispatcher, HttpContextStore, InboundMessage,
    MemContextStore, MessageKind, Registry,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "ctxbridge-agent", version, about)]
struct Args {
    /// Base URL of the NGSI-LD context broker
    #[arg(long, env = "CONTEXT_BROKER_URL", default_value = "http://localhost:8080")]
    broker_url: String,

    /// Timeout of a single broker request in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    request_timeout_secs: u64,

    /// Messages dispatched concurrently
    #[arg(long, env = "CONCURRENCY", default_value_t = 16)]
    concurrency: usize,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Envelope file, stdin when omitted
    #[arg(long, env = "INPUT")]
    input: Option<PathBuf>,

    /// Upsert into an in-memory store instead of the broker
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            broker_url: self.broker_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            concurrency: self.concurrency.max(1),
            ..Default::default()
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    topic: String,
    body: Value,
}

#[derive(Debug, Default)]
struct Summary {
    upserted: usize,
    dropped: usize,
    failed: usize,
    cancelled: usize,
}

fn init_tracing(args: &Args) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "ctxbridge={level},ctxbridge_agent={level},warn",
            level = args.log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match args.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Turn one input line into a message; malformed lines are logged and skipped
fn parse_envelope(line: &str) -> Option<InboundMessage> {
    if line.trim().is_empty() {
        return None;
    }

    let envelope: Envelope = match serde_json::from_str(line) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "skipping malformed envelope");
            return None;
        }
    };

    let kind = match MessageKind::from_topic(&envelope.topic) {
        Ok(kind) => kind,
        Err(err) => {
            warn!(error = %err, "skipping envelope");
            return None;
        }
    };

    // A string body is an already serialized record
    let body = match envelope.body {
        Value::String(body) => body.into_bytes(),
        body => match serde_json::to_vec(&body) {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "skipping envelope");
                return None;
            }
        },
    };

    Some(InboundMessage::json(kind, body))
}

async fn open_input(
    input: Option<&PathBuf>,
) -> std::io::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    Ok(match input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

async fn run(args: &Args, shutdown: CancellationToken) -> Result<Summary, Box<dyn std::error::Error>> {
    let config = args.config();

    let store: Arc<dyn ContextStore> = if args.dry_run {
        info!("dry run, upserting into memory");
        Arc::new(MemContextStore::new())
    } else {
        info!(broker_url = %config.broker_url, "publishing to context broker");
        Arc::new(HttpContextStore::new(&config)?)
    };

    let dispatcher = Dispatcher::new(Arc::new(Registry::with_defaults()), store)
        .with_shutdown(shutdown.clone());

    let input = open_input(args.input.as_ref()).await?;
    Ok(dispatch_lines(input, dispatcher, config.concurrency, shutdown).await)
}

/// Dispatch every envelope read from `input` until it ends or `shutdown` fires
async fn dispatch_lines<R, C>(
    input: R,
    dispatcher: Dispatcher<C>,
    concurrency: usize,
    shutdown: CancellationToken,
) -> Summary
where
    R: AsyncBufRead + Unpin,
    C: ContextStore + ?Sized + 'static,
{
    let lines = futures::stream::unfold(input.lines(), |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None,
            Err(err) => {
                error!(error = %err, "failed to read input");
                None
            }
        }
    });

    let results = lines
        .take_until(shutdown.clone().cancelled_owned())
        .filter_map(|line| futures::future::ready(parse_envelope(&line)))
        .map(|message| {
            let dispatcher = dispatcher.clone();
            let cancel = shutdown.clone();
            async move { dispatcher.dispatch(&message, &cancel).await }
        })
        .buffer_unordered(concurrency);
    tokio::pin!(results);

    let mut summary = Summary::default();
    while let Some(result) = results.next().await {
        match result {
            Ok(DispatchOutcome::Upserted { .. }) => summary.upserted += 1,
            Ok(DispatchOutcome::Dropped(_)) => summary.dropped += 1,
            Err(err) if err.is_cancelled() => summary.cancelled += 1,
            Err(_) => summary.failed += 1,
        }
    }

    summary
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, cancelling in-flight upserts");
                shutdown.cancel();
            }
        }
    });

    match run(&args, shutdown).await {
        Ok(summary) => {
            info!(
                upserted = summary.upserted,
                dropped = summary.dropped,
                failed = summary.failed,
                cancelled = summary.cancelled,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "agent failed");
            ExitCode::FAILURE
        }
    }
}

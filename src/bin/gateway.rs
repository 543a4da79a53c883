// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0
//! Main identity gateway executable.
//!
//! This is the entry point of the `identity-gateway` binary. `serve` keeps
//! one service running and answers JSON request lines from stdin, so
//! sessions live as long as the process. `verify` and `health` run a single
//! operation and print the outcome as JSON on stdout.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result, eyre};
use eyre::WrapErr;
use serde_json::json;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::{signal, spawn, time};
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info, trace};
use tracing_subscriber::{
    Layer,
    filter::{LevelFilter, Targets},
    prelude::*,
};

use identity_gateway::config::Config;
use identity_gateway::context::{RequestContext, RequestContextBuilder};
use identity_gateway::gateway::{Service, ServiceState};
use identity_gateway::pipeline::{AuthenticationPipeline, PipelineError};
use identity_gateway::plugin_manager::PluginManager;
use identity_gateway::provider::Provider;
use identity_gateway::serve::{Operation, dispatch, serve};
use identity_gateway::session::SessionCacheApi;

/// Identity gateway.
///
/// Verifies credentials against the directory, issues and validates signed
/// session tokens and publishes an audit trail of every decision.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the gateway config file.
    #[arg(short, long, default_value = "/etc/identity-gateway/gateway.conf")]
    config: PathBuf,

    /// Verbosity level. Repeat to increase level.
    #[arg(short, long, global=true, action = clap::ArgAction::Count, display_order = 920)]
    pub verbose: u8,

    /// Overall deadline of the operation in milliseconds.
    #[arg(long, global = true)]
    pub deadline_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer JSON request lines from stdin until it closes or a shutdown
    /// signal arrives. Sessions are kept between the requests.
    Serve,
    /// Verify the credentials of a user and print the issued token.
    Verify {
        /// Principal identifier (user name).
        user: String,
        /// Secret. Read from stdin when not set.
        #[arg(long, env = "IDENTITY_GATEWAY_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
    /// Print the circuit state of the dependencies.
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Report> {
    color_eyre::install()?;
    let args = Args::parse();

    let filter = Targets::new()
        .with_default(match args.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        })
        .with_target("audit", Level::INFO)
        .with_target("hyper_util", Level::INFO)
        .with_target("reqwest", Level::INFO);

    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(filter);

    // build the tracing registry
    tracing_subscriber::registry().with(log_layer).init();

    let cfg = Config::new(args.config)?;
    let purge_interval = Duration::from_secs(cfg.session.purge_interval.max(1));

    let provider = Provider::new(cfg.clone(), PluginManager::default())
        .wrap_err("Failed to initialize the providers")?;
    let shared_state = Arc::new(Service::new(cfg, provider));
    debug!("Identity gateway initialized");

    let token = CancellationToken::new();
    let pipeline = AuthenticationPipeline::new(shared_state.clone());

    if matches!(args.command, Command::Serve) {
        spawn(cleanup(token.clone(), shared_state.clone(), purge_interval));
        let shutdown = token.clone();
        spawn(async move {
            shutdown_signal().await;
            shutdown.cancel();
        });
        let input = BufReader::new(tokio::io::stdin());
        let served = serve(&pipeline, input, tokio::io::stdout(), token.clone()).await;
        token.cancel();
        shared_state.terminate().await;
        return served.wrap_err("Serving requests failed");
    }

    let mut ctx = RequestContextBuilder::default();
    ctx.cancellation(token.clone());
    if let Some(deadline) = args.deadline_ms {
        ctx.timeout(Duration::from_millis(deadline));
    }
    let ctx = ctx.build()?;

    let outcome = tokio::select! {
        outcome = run(&pipeline, &ctx, args.command) => outcome,
        () = shutdown_signal() => {
            token.cancel();
            Err(PipelineError::Cancelled)
        },
    };

    token.cancel();
    shared_state.terminate().await;

    match outcome {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({"code": err.code(), "message": err.to_string()}))?
            );
            Err(eyre!(err).wrap_err(format!("request {} failed", ctx.correlation_id())))
        }
    }
}

async fn run(
    pipeline: &AuthenticationPipeline,
    ctx: &RequestContext,
    command: Command,
) -> Result<serde_json::Value, PipelineError> {
    info!(correlation_id = %ctx.correlation_id(), "Running identity gateway");
    let operation = match command {
        Command::Verify { user, secret } => {
            let secret = match secret {
                Some(secret) => secret,
                None => read_secret().await.map_err(|err| {
                    error!("cannot read the secret from stdin: {}", err);
                    PipelineError::InvalidCredentials
                })?,
            };
            Operation::Verify { user, secret }
        }
        Command::Health | Command::Serve => Operation::Health,
    };
    dispatch(pipeline, ctx, operation).await
}

/// First line of stdin without the line terminator.
async fn read_secret() -> io::Result<String> {
    let mut buf = String::new();
    tokio::io::stdin().read_to_string(&mut buf).await?;
    Ok(buf.lines().next().unwrap_or_default().to_string())
}

/// Periodic cleanup job
async fn cleanup(cancel: CancellationToken, state: ServiceState, period: Duration) {
    let mut interval = time::interval(period);
    interval.tick().await;
    info!("Start the periodic session purge");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                trace!("cleanup job tick");
                match state.provider.get_session_cache_provider().purge_expired().await {
                    Ok(purged) => debug!(purged, "expired sessions purged"),
                    Err(e) => error!("Error during cleanup job: {}", e),
                }
            },
            () = cancel.cancelled() => {
                info!("Cancellation requested. Stopping cleanup task.");
                break; // Exit the loop
            }
        }
    }
}

/// Resolve on the shutdown or interrupt signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c()
            .await
            .inspect_err(|e| error!("failed to install Ctrl+C handler: {e}"))
            .is_err()
        {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = signal::unix::signal(signal::unix::SignalKind::terminate())
            .inspect_err(|e| error!("failed to install signal handler: {e}"))
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

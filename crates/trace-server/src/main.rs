//! HTTP façade over the trace engine: exposes
//! `/api/debug/{start,step-forward,step-backward,get-state,end}` with
//! `axum`, backed by one process-wide [`trace_engine::SessionManager`].

use std::{sync::Arc, time::Duration};

use clap::Parser;
use trace_engine::{CompilerConfig, EngineLimits};
use trace_server::{handlers::AppState, routes};

#[derive(Parser)]
#[command(name = "trace-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP façade for the trace engine", long_about = None)]
struct Cli {
    /// Port to listen on (defaults to $PORT, then 5001)
    #[arg(long, env = "PORT", default_value_t = 5001)]
    port: u16,

    /// Compiler binary to invoke for syntax validation (defaults to $CXX, then g++)
    #[arg(long)]
    compiler: Option<String>,

    /// Compiler timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut compiler = CompilerConfig::default();
    if let Some(binary) = cli.compiler {
        compiler.binary = binary;
    }
    compiler.timeout = Duration::from_secs(cli.timeout_secs);

    let state = Arc::new(AppState::new(EngineLimits::default(), compiler));
    let app = routes::build(state);

    let addr = format!("0.0.0.0:{}", cli.port);
    tracing::info!(%addr, "trace-server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await.expect("failed to bind listen address");
    axum::serve(listener, app.into_make_service()).await.expect("server exited unexpectedly");
}

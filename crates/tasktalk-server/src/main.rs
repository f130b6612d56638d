use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tasktalk_memory::SqliteStore;
use tasktalk_server::state::AppState;

#[derive(Parser)]
#[command(name = "tasktalk-server", version, about = "tasktalk conversational todo service")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1:8080", help = "Address to bind the HTTP server to")]
    bind: String,

    #[arg(long, default_value = "tasktalk.db", help = "Path to the sqlite database file")]
    db: String,

    #[arg(
        long,
        default_value_t = tasktalk_auth::DEFAULT_TOKEN_TTL_SECS,
        help = "Session token lifetime in seconds"
    )]
    token_ttl_secs: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tasktalk=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = Arc::new(SqliteStore::open(&cli.db)?);
    let state = AppState::new(store, cli.token_ttl_secs);

    tasktalk_server::serve(state, &cli.bind).await
}

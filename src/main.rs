//! Chat session client
//!
//! Line-oriented front end for a conversation backend: restores the
//! session's stored history, sends each line as a prompt and prints the
//! resulting turn.

mod backend;
mod config;
mod history;
mod render;
mod runtime;
mod state_machine;
mod store;

use backend::{HttpChatService, LoggingService};
use config::ChatConfig;
use runtime::{spawn_session, ServiceClient};
use std::sync::Arc;
use std::time::Duration;
use store::{InMemoryStore, SessionStore, SqliteSessionStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long remote saves may keep the process alive after stdin closes
const ARCHIVE_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatConfig::from_env();

    // Initialize logging; stdout belongs to the conversation
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chat_session=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let store: Arc<dyn SessionStore> = match &config.store_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %path.display(), "Opening session store");
            Arc::new(SqliteSessionStore::open(path)?)
        }
        None => {
            tracing::info!("No CHAT_STORE_PATH set, session history lives in memory");
            Arc::new(InMemoryStore::new())
        }
    };

    let service = HttpChatService::new(&config.base_url, config.reply_timeout)?;
    let client = ServiceClient::new(Arc::new(LoggingService::new(Arc::new(service))));

    let handle = spawn_session(store, client.clone(), client, config.reply_timeout);

    let identity = config.identity();
    if identity.is_none() {
        tracing::warn!("No CHAT_EMAIL set, history will not be restored or saved remotely");
    }
    handle.load_history(identity).await;

    for turn in &handle.view().history {
        println!("{}", render::render_turn(turn));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        handle.set_input(line.as_str()).await;

        let before = handle.view().history.len();
        let view = handle.submit_and_wait(line).await;
        if view.history.len() > before {
            if let Some(turn) = view.history.last() {
                println!("{}", render::render_turn(turn));
            }
        }
    }

    handle.close(ARCHIVE_GRACE).await;
    Ok(())
}

//! castwire-daemon: the Castwire feed daemon.
//!
//! Single OS process running a Tokio async runtime. Clients talk to the
//! daemon via JSON-RPC over Unix socket: signed action envelopes in,
//! materialized posts, threads, and feeds out.

mod commands;
mod config;
mod rpc;

use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tracing::{error, info};

use castwire_db::queries;
use castwire_feed::Materializer;
use castwire_ledger::Ledger;
use castwire_types::User;

use crate::config::DaemonConfig;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database connection, shared with the ledger writer.
    pub conn: Arc<Mutex<rusqlite::Connection>>,
    /// The append-only action log.
    pub ledger: Ledger,
    /// Materialized read state, rebuilt from the ledger at startup and
    /// updated incrementally as actions are accepted.
    pub feed: RwLock<Materializer>,
    /// Per-server share-token secret.
    pub share_secret: [u8; 32],
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("castwire={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Castwire daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database
    let db_path = data_dir.join("castwire.db");
    let conn = castwire_db::open(&db_path)?;

    // 3. Load the share-token secret before the connection goes behind
    // the writer lock.
    let share_secret = castwire_auth::share::load_or_create_secret(&conn)?;

    // 4. Rebuild derived feed state from the full ledger.
    let users: Vec<User> = queries::users::list(&conn)?
        .into_iter()
        .map(|row| User {
            uid: row.uid,
            pub_key_hex: row.pub_key_hex,
            display_name: row.display_name,
            registered_at: row.registered_at,
        })
        .collect();

    let conn = Arc::new(Mutex::new(conn));
    let ledger = Ledger::new(conn.clone(), config.limits());
    let entries = ledger.entries_from(1)?;
    let feed = Materializer::rebuild(users, &entries);
    info!(
        entries = entries.len(),
        applied_seq = feed.applied_seq(),
        "feed state rebuilt"
    );

    // 5. Build daemon state
    let state = Arc::new(DaemonState {
        conn,
        ledger,
        feed: RwLock::new(feed),
        share_secret,
    });

    // 6. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 7. Run the RPC server until shutdown
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}

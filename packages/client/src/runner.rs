//! Client entry point: wires the store, the server API and the terminal.

use std::sync::Arc;

use crate::{
    cache::SessionStore,
    config::ClientConfig,
    error::ClientError,
    session::run_app,
    transport::HttpChatApi,
    ui::{LineReader, TerminalAlert},
};

/// Run the client until the user quits.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let store = match &config.session_file {
        Some(path) => {
            tracing::info!("Using session file {}", path.display());
            SessionStore::open(path.clone())?
        }
        None => SessionStore::in_memory(),
    };

    tracing::info!(
        "Chat server at {} (reconnect: {} attempt(s), {:?} interval)",
        config.base_url,
        config.reconnect.max_attempts,
        config.reconnect.interval
    );
    let api = Arc::new(HttpChatApi::new(config.base_url, config.reconnect));
    let mut lines = LineReader::spawn();
    let mut stdout = std::io::stdout();

    run_app(
        store,
        api,
        Arc::new(TerminalAlert),
        &mut lines,
        &mut stdout,
        config.viewport_height,
    )
    .await
}

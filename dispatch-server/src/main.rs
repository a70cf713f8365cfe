use dispatch_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. dotenv and logging
    setup_environment();
    tracing::info!("Dispatch server starting");

    // 2. Configuration
    let config = Config::from_env();

    // 3. Ledger and engine
    let state = ServerState::initialize(&config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize server state");
        e
    })?;

    // 4. HTTP server; background tasks start inside run()
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}

//! filegate server binary
//!
//! Serves the image, document and audio conversion endpoints behind Basic
//! authentication and a per-user daily quota.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}

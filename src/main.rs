use exr_extractor_rs::logger;
use exr_extractor_rs::service::{self, DEFAULT_PORT, ServiceConfig};

use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init();

    info!("Starting exr-extractor service...");

    let port = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => DEFAULT_PORT,
    };

    let config = ServiceConfig {
        port,
        ..ServiceConfig::default()
    };

    let handle = service::serve(config)?;
    info!("Server started successfully on port {}", handle.port);

    // Runs until the process is terminated
    handle.join();

    Ok(())
}

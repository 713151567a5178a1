// src/main.rs
mod api;
mod config;
mod logging;

use config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        let missing_file = matches!(
            err,
            dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        );
        if !missing_file {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }
    logging::init();

    let app_config = AppConfig::from_env();
    let AppConfig { api, optimizer } = app_config;

    println!("🚀 Placement service starting...");
    log::debug!(
        "Placement defaults: {:?}, time budget {:?}",
        optimizer.placement_config(),
        optimizer.time_budget()
    );
    api::start_api_server(api, optimizer).await;
}

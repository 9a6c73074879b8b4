use gitvault::observability::logging::{init_logging, log_config_info};
use gitvault::{api, startup, AppConfig, APP_NAME, VERSION};
use tracing::error;

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    tracing::info!(app_name = APP_NAME, version = VERSION, "Starting Gitvault configuration service");
    log_config_info(&config);

    let state = match startup::build_state(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize service: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = api::start_api_server(&config.server, state).await {
        error!("API server failed: {}", e);
        std::process::exit(1);
    }
}

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use stock_charts::config::AppConfig;
use stock_charts::{load_series_from_json, ChartRenderer};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "stock_charts=debug".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("📊 Starting stock-charts...");

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    debug!("Loaded configuration: {:?}", config);

    let series = match load_series_from_json(&config.data_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load {}: {}", config.data_path.display(), e);
            std::process::exit(1);
        }
    };

    // Rendering is blocking work
    let request = config.request();
    let result =
        tokio::task::spawn_blocking(move || ChartRenderer::new().render(&series, &request)).await;

    match result {
        Ok(Ok(path)) => info!("Chart ready at {}", path.display()),
        Ok(Err(e)) => {
            error!("Failed to render chart: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Render task failed: {}", e);
            std::process::exit(1);
        }
    }
}

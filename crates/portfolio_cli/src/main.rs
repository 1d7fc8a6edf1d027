/* 📖 # Why is the CLI minimal and hardcoded?

The CLI takes no arguments. Everything that can be tuned lives in an optional
`portfolio.toml` in the current directory, so there is exactly one way to configure
a running server:

1. Change to the directory holding `portfolio.toml` (or any directory, for defaults)
2. Run `portfolio`
3. Stop it with Ctrl-C

Exit codes:
- 1: startup failed (unreadable config, port in use, ...)
- the server otherwise runs until the process is terminated
*/

use std::env;
use std::process;
use std::thread;

use portfolio_base::pal::http::HttpServerConfig;
use portfolio_base::tracing::init_tracing;
use portfolio_base::{FilePath, PalHandle, RealPal};
use portfolio_engine::{
    ApiService, ApiSettings, CONFIG_FILE_NAME, InMemoryStore, StoreHandle, load_config,
};
use tracing::info;

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let current_dir = env::current_dir().unwrap_or_else(|e| {
        eprintln!("Error: Failed to get current directory: {}", e);
        process::exit(1);
    });

    let pal = PalHandle::new(RealPal::new(current_dir));

    let config = match load_config(&*pal, &FilePath::from(CONFIG_FILE_NAME)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config from {}: {}", CONFIG_FILE_NAME, e);
            process::exit(1);
        }
    };

    let store = if config.api.seed_sample_data {
        StoreHandle::new(InMemoryStore::with_samples())
    } else {
        StoreHandle::new(InMemoryStore::new())
    };
    info!(
        projects = store.len().unwrap_or_default(),
        "project store ready"
    );

    let service = ApiService::with_settings(store, ApiSettings::from_config(&config));
    let bound_port = service.bound_port();
    let server_config = HttpServerConfig::new(config.server.host.clone()).with_port(config.server.port);

    let handle = match pal.start_http_server(Box::new(service), server_config) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: Failed to start HTTP server: {}", e);
            process::exit(1);
        }
    };

    bound_port.set(handle.port());

    println!(
        "Portfolio API listening on http://{}",
        handle.address(&config.server.host)
    );

    loop {
        thread::park();
    }
}

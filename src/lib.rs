pub mod backup;
pub mod catalog;
pub mod config;
pub mod database;
pub mod models;
pub mod settings;
pub mod sms;
pub mod state;

pub use catalog::CommandCatalog;
pub use config::AppConfig;
pub use models::command_template::CommandTemplate;
pub use models::error::{Result, TkConfigError};
pub use settings::{SettingValue, SettingsStore};
pub use state::AppState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Calling this twice is harmless.
pub fn init_tracing(config: &AppConfig) {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Starting TKConfig {}", env!("CARGO_PKG_VERSION"));
    }
}

/// Load the configuration from the environment, start logging and open the
/// session database.
pub fn run() -> Result<AppState<database::SqliteSettings>> {
    let config = AppConfig::from_env()?;
    init_tracing(&config);
    AppState::open(&config)
}

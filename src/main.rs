//! konversi-data server binary
//!
//! Settings come from command-line flags, environment variables and an optional
//! `.env` file, in that order of precedence.

use clap::Parser;
use konversi_data::config::{
    ApiConfig, Config, DEFAULT_MAX_UPLOAD_BYTES, FetchConfig, Locale, StorageConfig,
    parse_origin_list,
};
use konversi_data::{AppState, Error, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// Convert JSON and CSV files into Excel workbooks over HTTP
#[derive(Debug, Parser)]
#[command(name = "konversi-data", version, about)]
struct Args {
    /// Address to listen on [env: BACKEND_HOST, HOST] [default: 0.0.0.0]
    #[arg(long, env = "BACKEND_HOST")]
    host: Option<String>,

    /// Port to listen on [env: BACKEND_PORT, PORT] [default: 8000]
    #[arg(long, env = "BACKEND_PORT")]
    port: Option<u16>,

    /// Comma-separated allowed CORS origins ("*" allows any)
    #[arg(long, env = "CORS_ORIGINS")]
    cors_origins: Option<String>,

    /// Directory holding the statistics database
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory for staged inputs
    #[arg(long, env = "UPLOAD_DIR", default_value = "temp_uploads")]
    upload_dir: PathBuf,

    /// Directory for generated workbooks
    #[arg(long, env = "OUTPUT_DIR", default_value = "temp_outputs")]
    output_dir: PathBuf,

    /// Largest accepted upload or download, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: u64,

    /// Timeout for fetching remote URLs, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 60)]
    fetch_timeout_secs: u64,

    /// Language of error messages ("id" or "en")
    #[arg(long, env = "MESSAGE_LOCALE", default_value = "id")]
    locale: String,

    /// Serve Swagger UI at /swagger-ui
    #[arg(long, env = "SWAGGER_UI")]
    swagger_ui: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    validate: bool,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let host = self
            .host
            .or_else(|| std::env::var("HOST").ok())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host.trim().parse().map_err(|_| Error::Config {
            message: format!("invalid listen address '{}'", host),
            key: Some("host".to_string()),
        })?;

        let port = match self.port {
            Some(port) => port,
            None => match std::env::var("PORT") {
                Ok(port) => port.trim().parse().map_err(|_| Error::Config {
                    message: format!("invalid port '{}'", port),
                    key: Some("port".to_string()),
                })?,
                Err(_) => DEFAULT_PORT,
            },
        };

        let mut api = ApiConfig {
            bind_address: SocketAddr::new(host, port),
            swagger_ui: self.swagger_ui,
            max_upload_bytes: self.max_upload_bytes,
            ..Default::default()
        };
        if let Some(origins) = self.cors_origins {
            api.cors_origins = parse_origin_list(&origins);
        }

        let fetch = FetchConfig {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_body_bytes: self.max_upload_bytes,
            ..Default::default()
        };

        let config = Config {
            api,
            storage: StorageConfig {
                upload_dir: self.upload_dir,
                output_dir: self.output_dir,
                database_path: self.data_dir.join("conversion_stats.db"),
            },
            fetch,
            locale: self.locale.parse::<Locale>()?,
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env fallbacks see it)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "konversi_data=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let validate_only = args.validate;
    let config = args.into_config()?;

    if validate_only {
        println!("Configuration is valid.");
        return Ok(());
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.storage.database_path.display(),
        upload_dir = %config.storage.upload_dir.display(),
        output_dir = %config.storage.output_dir.display(),
        locale = ?config.locale,
        "starting konversi-data"
    );

    let state = AppState::from_config(config).await?;
    konversi_data::api::start_api_server(state).await
}

//! Vorex client - command-line access to the Vorex API
//!
//! Sends requests through the retrying fetch, reads cached JSON resources and
//! manages local settings. API failures are reported with the same
//! user-facing messages the application shows; other errors print as-is.

use std::error::Error;

use clap::Parser;
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vorex::cli::{build_request, parse_query, Cli, Command, SettingsAction};
use vorex::error::describe_failure;
use vorex::{fetch_with_retry, ApiClient, ApiError, LocalStorage, RetryOptions, Settings};

/// Sets up logging to stderr. `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "vorex=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Retry options for the CLI: config values plus a warning per retry
fn retry_options(cli: &Cli) -> RetryOptions {
    cli.client_config()
        .retry_options()
        .on_retry(|attempt, error| warn!(attempt, error = %error, "Request failed, retrying"))
}

/// Opens local storage at the configured or platform directory
fn open_storage(cli: &Cli) -> Result<LocalStorage, Box<dyn Error>> {
    match cli.storage_dir {
        Some(ref dir) => Ok(LocalStorage::with_dir(dir.clone())),
        None => LocalStorage::new().ok_or_else(|| "Could not determine a data directory".into()),
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Fetch {
            ref url,
            ref method,
            ref headers,
            ref data,
        } => {
            let request = build_request(method, headers, data.as_deref())?;
            let client = reqwest::Client::builder()
                .timeout(cli.client_config().timeout())
                .build()
                .map_err(ApiError::from)?;

            let response = fetch_with_retry(&client, url, &request, &retry_options(&cli)).await?;
            let status = response.status();
            let body = response.text().await.map_err(ApiError::from)?;

            println!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or_default());
            if !body.is_empty() {
                println!("{}", body);
            }
            if !status.is_success() {
                return Err(ApiError::from_status(status).into());
            }
        }

        Command::Get {
            ref path,
            ref query,
        } => {
            let pairs = query
                .iter()
                .map(|q| parse_query(q))
                .collect::<Result<Vec<_>, _>>()?;
            let pairs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

            let client = ApiClient::new(&cli.client_config())?.with_retry_options(retry_options(&cli));
            let value: Value = client.get_json(path, &pairs).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Command::Settings { ref action } => {
            let storage = open_storage(&cli)?;
            let settings = match action {
                SettingsAction::Show => Settings::load(&storage),
                SettingsAction::Set { field, value } => {
                    let mut settings = Settings::load(&storage);
                    settings.set_field(field, value)?;
                    settings.save(&storage)?;
                    settings
                }
                SettingsAction::Reset => Settings::reset(&storage)?,
            };
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", describe_failure(&*err));
        std::process::exit(1);
    }

    Ok(())
}

//! Framelink CLI: command-line client for the gallery backend.
//!
//! Set FRAMELINK_API_URL (or API_URL) and, for privileged commands,
//! FRAMELINK_API_TOKEN. See `ClientConfig` for every variable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use framelink_api_client::ApiClient;
use framelink_cli::{
    init_tracing, link_url, mask_secret, photo_row, progress_line, TerminalPresenter,
};
use framelink_core::models::UserProfile;
use framelink_core::upload::read_upload_file;
use framelink_core::url_state::MemorySessionStore;
use framelink_core::{AppError, ClientConfig, ErrorMetadata, MemoryUrl, SecretParams};
use framelink_services::{share_error_message, Gallery, LandingState};
use serde::Serialize;
use tracing::warn;

#[derive(Parser)]
#[command(name = "framelink", about = "Framelink gallery CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List photos, newest first
    List {
        /// Output format: json or table
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Get a single photo by ID
    Get {
        /// Photo ID
        id: String,
    },
    /// Upload an image file
    Upload {
        /// Path to the image
        file: PathBuf,
    },
    /// Create a share link for a photo
    Share {
        /// Photo ID
        photo_id: String,
    },
    /// Open a share link the way a browser landing on it would
    Resolve {
        /// Share URL or bare short code
        link: String,
    },
    /// Check whether the configured identity may upload
    CanUpload,
    /// Show the caller's role
    Role,
    /// Show or update the caller's profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Gallery counters
    Stats,
    /// Move a query-string secret into session storage
    Secret {
        /// URL carrying the secret parameter
        url: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Message for the terminal; internal details stay in the logs.
fn user_error(err: AppError) -> anyhow::Error {
    if err.is_sensitive() {
        warn!(error = %err.detailed_message(), "Command failed");
    }
    match err.suggested_action() {
        Some(action) => anyhow::anyhow!("{} ({})", err.client_message(), action),
        None => anyhow::anyhow!(err.client_message()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let client = ApiClient::from_config(&config).context(
        "Failed to create API client. Set FRAMELINK_API_URL (or API_URL) and FRAMELINK_API_TOKEN",
    )?;
    let gallery = Gallery::new(&config, Arc::new(client));

    match cli.command {
        Commands::List { format } => {
            let photos = gallery.photos.list_photos().await.map_err(user_error)?;
            match format.as_str() {
                "json" => print_json(&photos)?,
                _ => {
                    println!("{:<28} {:<30} {:<12} UPLOADED", "ID", "NAME", "TYPE");
                    for photo in &photos {
                        println!("{}", photo_row(photo));
                    }
                    println!("{} photo(s)", photos.len());
                }
            }
        }
        Commands::Get { id } => match gallery.photos.get_photo(&id).await.map_err(user_error)? {
            Some(photo) => print_json(&photo)?,
            None => bail!("Photo not found"),
        },
        Commands::Upload { file } => {
            let upload = read_upload_file(&file).map_err(user_error)?;
            let handle = gallery.photos.upload(upload.into()).map_err(user_error)?;
            let mut progress = handle.progress();

            let reporter = tokio::spawn(async move {
                loop {
                    let current = progress.borrow_and_update().clone();
                    eprintln!("{}", progress_line(&current));
                    if current.is_terminal() || progress.changed().await.is_err() {
                        break;
                    }
                }
            });
            let result = handle.finish().await;
            reporter.await.context("Progress reporter stopped")?;
            let id = result.map_err(user_error)?;
            print_json(&serde_json::json!({ "id": id }))?;
        }
        Commands::Share { photo_id } => {
            gallery.authorization.refresh().await;
            let mut attempts = 0;
            let code = loop {
                attempts += 1;
                match gallery.share_links.create_short_link(&photo_id).await {
                    Ok(code) => break code,
                    Err(AppError::Collision(code)) if attempts < config.share_attempts => {
                        warn!(short_code = %code, attempts, "Short code taken, retrying");
                    }
                    Err(e) => bail!(share_error_message(&e)),
                }
            };
            print_json(&serde_json::json!({
                "short_code": code,
                "url": gallery.share_links.share_url(&code),
            }))?;
        }
        Commands::Resolve { link } => {
            let url = Arc::new(MemoryUrl::new(&link_url(
                &link,
                &config.public_origin,
                &config.short_link_param,
            )));
            let presenter = Arc::new(TerminalPresenter::default());
            let landing = gallery.landing(url.clone(), presenter.clone());

            match landing.run().await {
                LandingState::Resolved(photo) => print_json(&photo)?,
                LandingState::Idle => bail!(
                    "No '{}' parameter in {}",
                    config.short_link_param,
                    url.href()
                ),
                _ => bail!(presenter
                    .error()
                    .unwrap_or_else(|| "Could not open share link".to_string())),
            }
        }
        Commands::CanUpload => {
            let status = gallery.authorization.refresh().await;
            print_json(&serde_json::json!({
                "identity": gallery.session.identity().label(),
                "can_upload": status.can_upload(),
                "status": format!("{:?}", status),
            }))?;
        }
        Commands::Role => {
            let backend = gallery.backend().map_err(user_error)?;
            let role = backend.get_caller_user_role().await.map_err(user_error)?;
            let is_admin = backend.is_caller_admin().await.map_err(user_error)?;
            print_json(&serde_json::json!({ "role": role, "is_admin": is_admin }))?;
        }
        Commands::Profile { name, email } => {
            let backend = gallery.backend().map_err(user_error)?;
            if let Some(name) = name {
                let profile = UserProfile { name, email };
                backend
                    .save_caller_user_profile(&profile)
                    .await
                    .map_err(user_error)?;
            } else if email.is_some() {
                bail!("--email requires --name");
            }
            let profile = backend.get_caller_user_profile().await.map_err(user_error)?;
            print_json(&profile)?;
        }
        Commands::Stats => {
            let stats = gallery
                .backend()
                .map_err(user_error)?
                .get_gallery_stats()
                .await
                .map_err(user_error)?;
            print_json(&stats)?;
        }
        Commands::Secret { url } => {
            let cell = Arc::new(MemoryUrl::new(&url));
            let secrets = SecretParams::new(cell.clone(), Arc::new(MemorySessionStore::new()));
            let value = secrets.get(&config.secret_param);
            print_json(&serde_json::json!({
                "key": config.secret_param,
                "found": value.is_some(),
                "value": value.as_deref().map(mask_secret),
                "url": cell.href(),
            }))?;
        }
    }

    Ok(())
}

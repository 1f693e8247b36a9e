mod cli;

use eventimg::{
    config,
    images::{codec::mime_from_path, Upload},
    server::{self, AppContext},
};
use eventimg_common::{EventId, ImageId, Tier};
use eventimg_db::pool::{get_conn, init_pool, DbPool};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn open_pool(config: &config::Config) -> Result<DbPool> {
    let db_path = config.database.path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path);
    init_pool(&db_path).with_context(|| format!("Failed to open database {}", db_path))
}

async fn start_server(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting eventimg server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let pool = open_pool(&config)?;
    server::start_server(config, pool).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "eventimg=trace,eventimg_db=debug,tower_http=debug".to_string()
        } else {
            "eventimg=debug,eventimg_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::CreateEvent { title } => create_event(cli.config.as_deref(), &title),
        Commands::Ingest {
            event,
            tier,
            primary,
            file,
        } => ingest(cli.config.as_deref(), event, &tier, primary, &file),
        Commands::List { event } => list_images(cli.config.as_deref(), event),
        Commands::Delete { event, image } => delete_image(cli.config.as_deref(), event, image),
        Commands::Version => {
            println!("eventimg {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Upload dir: {}", config.storage.upload_dir.display());
            println!("  Static URL prefix: {}", config.storage.static_url_prefix);
            println!("  Max upload: {} bytes", config.images.max_upload_bytes);
            println!("  Allowed types: {}", config.images.allowed_mime_types.join(", "));
            for tier in Tier::all() {
                let bbox = config.images.tiers.get(*tier);
                println!("  Tier {}: {}x{}", tier, bbox.max_width, bbox.max_height);
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Upload dir: {}", config.storage.upload_dir.display());
        }
    }

    Ok(())
}

fn context(config_path: Option<&Path>) -> Result<AppContext> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    Ok(AppContext::new(config, pool)?)
}

fn create_event(config_path: Option<&Path>, title: &str) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let conn = get_conn(&pool)?;

    let event = eventimg_db::queries::events::create_event(&conn, title)?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}

fn ingest(config_path: Option<&Path>, event: i64, tier: &str, primary: bool, file: &Path) -> Result<()> {
    let event_id = EventId::new(event)?;
    let tier: Tier = tier.parse()?;

    if !file.exists() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }
    let data = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let declared_mime = mime_from_path(file).unwrap_or("application/octet-stream");
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let ctx = context(config_path)?;
    let descriptor = ctx.coordinator.create(
        event_id,
        Upload {
            data: &data,
            declared_mime,
            file_name: &file_name,
            tier,
            is_primary: primary,
        },
    )?;

    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}

fn list_images(config_path: Option<&Path>, event: i64) -> Result<()> {
    let event_id = EventId::new(event)?;
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;

    // An unknown event lists as empty through the store; report it instead.
    if eventimg_db::queries::events::get_event(&*get_conn(&pool)?, event_id)?.is_none() {
        return Err(eventimg_common::Error::not_found("event", event_id).into());
    }

    let ctx = AppContext::new(config, pool)?;
    let images = ctx.coordinator.list(event_id)?;
    println!("{}", serde_json::to_string_pretty(&images)?);
    Ok(())
}

fn delete_image(config_path: Option<&Path>, event: i64, image: i64) -> Result<()> {
    let event_id = EventId::new(event)?;
    let image_id = ImageId::new(image)?;
    let ctx = context(config_path)?;
    ctx.coordinator.delete(event_id, image_id)?;
    println!("Deleted image {} of event {}", image_id, event_id);
    Ok(())
}

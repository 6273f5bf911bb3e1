mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use rv_core::config::Config;
use rv_db::queries::albums;
use rv_media::storage::sanitize_folder_name;
use rv_media::{Ffmpeg, Storage, UploadSink};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelvault=trace,rv_server=trace,rv_media=trace,rv_db=debug,rv_core=debug,tower_http=debug".to_string()
        } else {
            "reelvault=info,rv_server=info,rv_media=info,rv_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(rv_server::start(config))?;
            Ok(())
        }
        Commands::CreateAlbum { title, thumbnail } => {
            let config = Config::load_or_default(cli.config.as_deref());
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(create_album(&config, &title, thumbnail.as_deref()))
        }
        Commands::CheckTools => {
            let config = Config::load_or_default(cli.config.as_deref());
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_tools(&config));
            Ok(())
        }
        Commands::Validate { file } => validate_config(file.or(cli.config).as_deref()),
        Commands::Version => {
            println!("reelvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn create_album(config: &Config, title: &str, thumbnail: Option<&Path>) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        anyhow::bail!("album title must not be empty");
    }

    if let Some(parent) = config.server.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let db = rv_db::pool::init_pool(&config.server.db_path.to_string_lossy())?;
    let conn = rv_db::pool::get_conn(&db)?;

    let folder = sanitize_folder_name(title);
    let album = albums::create_album(&conn, title, folder.as_deref())?;
    tracing::info!(album = %album.id, folder = %album.folder, "Album created");

    if let Some(src) = thumbnail {
        let sink = UploadSink::new(Storage::new(config.storage.root.clone()), config.upload.clone());
        let reference = sink
            .import_thumbnail(&album.folder, src)
            .await
            .with_context(|| format!("importing thumbnail {}", src.display()))?;
        albums::set_thumbnail(&conn, album.id, &reference)?;
        println!("  Thumbnail: {reference}");
    }

    println!("Created album {} \"{}\" (folder: {})", album.id, album.title, album.folder);
    Ok(())
}

async fn check_tools(config: &Config) {
    println!("Checking external tools...\n");

    let info = Ffmpeg::check(&config.tools).await;
    let status = if info.available { "✓" } else { "✗" };
    print!("{status} {}", info.name);
    if let Some(ref version) = info.version {
        print!(" ({version})");
    }
    if let Some(ref path) = info.path {
        print!(" - {}", path.display());
    }
    println!();

    println!();
    if info.available {
        println!("Non-MP4 video uploads will be transcoded to H.264/AAC MP4.");
    } else {
        println!("ffmpeg is missing. Video uploads will be stored exactly as received.");
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading {}", p.display()))?;
            let config = Config::from_json(&text)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Storage root: {}", config.storage.root.display());
    println!("  Max chunk: {} bytes", config.streaming.chunk_cap());
    println!("  Request timeout: {}s", config.server.request_timeout_secs);
    println!("  Transcode video: {}", config.upload.transcode_video);

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in warnings {
            println!("  - {w}");
        }
    }

    Ok(())
}

// Gallery Ingest CLI binary

use std::path::{Path, PathBuf};
use clap::{Parser, Subcommand};
use anyhow::Result;

use gallery_ingest_lib::constants::{CONFIG_FILENAME, GALLERY_FOLDER};
use gallery_ingest_lib::tools::Tool;
use gallery_ingest_lib::{open_scanner, open_scanner_read_only, GalleryConfig};

#[derive(Parser)]
#[command(name = "gallery-ingest")]
#[command(about = "Ingest photos, gifs and videos into a self-hosted gallery", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the gallery folder layout and database
    Init {
        /// Storage root path
        path: PathBuf,
    },

    /// Ingest new files from the originals folder
    Scan {
        /// Storage root (defaults to current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Config file (defaults to <root>/.gallery/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List untracked files without changing anything
    Discover {
        /// Storage root (defaults to current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Config file (defaults to <root>/.gallery/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List catalog records
    List {
        /// Storage root (defaults to current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Config file (defaults to <root>/.gallery/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Maximum records to show
        #[arg(long, default_value = "100")]
        limit: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init { path } => cmd_init(path),
        Commands::Scan { root, config, json } => cmd_scan(root, config, json),
        Commands::Discover { root, config, json } => cmd_discover(root, config, json),
        Commands::List { root, config, limit } => cmd_list(root, config, limit),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

fn cmd_init(path: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&path)?;
    let storage_root = path.canonicalize().unwrap_or(path.clone());

    let config = GalleryConfig::for_storage_root(&storage_root);
    if config.db_path.exists() {
        anyhow::bail!("Gallery already exists at {}", storage_root.display());
    }

    let scanner = open_scanner(config)?;
    let config = scanner.config();

    println!("Initialized gallery at {}", storage_root.display());
    println!("Structure created:");
    println!("  {}  - Database", display_under(&storage_root, &config.db_path));
    println!("  {}  - Drop media here", display_under(&storage_root, &config.originals_dir));
    println!("  {}  - Generated thumbnails", display_under(&storage_root, &config.thumbnails_dir));
    println!(
        "Optional settings: {}/{}/{}",
        storage_root.display(),
        GALLERY_FOLDER,
        CONFIG_FILENAME
    );

    Ok(())
}

fn cmd_scan(root: Option<PathBuf>, config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(root, config_path)?;
    warn_missing_tools();

    let mut scanner = open_scanner(config)?;
    let report = scanner.run_ingest_scan()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Scan complete:");
    println!("  New files:   {}", report.new_files);
    println!("  Duplicates:  {}", report.duplicates.len());
    println!("  Errors:      {}", report.errors.len());

    for name in &report.files {
        println!("  + {}", name);
    }
    for name in &report.duplicates {
        println!("  = {}", name);
    }
    for error in &report.errors {
        println!("  ! {}", error);
    }

    Ok(())
}

fn cmd_discover(root: Option<PathBuf>, config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(root, config_path)?;
    let scanner = open_scanner_read_only(config)?;
    let report = scanner.run_discovery_scan()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.files.is_empty() {
        println!("Everything under {} is tracked.", scanner.config().originals_dir.display());
        return Ok(());
    }

    println!("{} untracked files:", report.count);
    println!();
    println!("{:<40}  {}", "Filename", "Hash");
    println!("{}", "-".repeat(80));
    for file in &report.files {
        println!("{:<40}  {}", truncate(&file.filename, 40), file.hash);
    }
    println!();
    println!("Run 'gallery-ingest scan' to ingest them.");

    Ok(())
}

fn cmd_list(root: Option<PathBuf>, config_path: Option<PathBuf>, limit: i64) -> Result<()> {
    let config = load_config(root, config_path)?;
    let scanner = open_scanner_read_only(config)?;
    let catalog = scanner.catalog();

    let records = catalog.list_media(limit, 0)?;
    let total = catalog.count_media()?;

    println!("Gallery: {} ({} items total)", scanner.config().storage_root.display(), total);
    println!();

    if records.is_empty() {
        println!("No media found. Drop files into the originals folder and run 'gallery-ingest scan'.");
        return Ok(());
    }

    println!("{:>5}  {:>6}  {:>11}  {:>10}  {:>10}  {}", "ID", "Type", "Size", "Dims", "Duration", "Filename");
    println!("{}", "-".repeat(80));

    for record in records {
        let dims = match (record.width, record.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "-".to_string(),
        };
        let duration = record
            .duration
            .map(|d| format!("{:.1}s", d))
            .unwrap_or_else(|| "-".to_string());

        println!("{:>5}  {:>6}  {:>11}  {:>10}  {:>10}  {}",
            record.id,
            record.file_type,
            format_size(record.file_size),
            dims,
            duration,
            truncate(&record.filename, 40)
        );
    }

    if total > limit {
        println!();
        println!("Showing {} of {} items. Use --limit to see more.", limit, total);
    }

    Ok(())
}

// --- Helper Functions ---

fn load_config(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<GalleryConfig> {
    let root = root.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let root = root.canonicalize().unwrap_or(root);
    let config = GalleryConfig::discover(&root, config_path.as_deref())?;
    log::debug!("Using config {:?}", config);
    Ok(config)
}

fn warn_missing_tools() {
    for tool in Tool::ALL {
        if !tool.is_available() {
            log::warn!("{} not found; video files will fail metadata or get no thumbnail", tool);
        }
    }
}

fn display_under(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn format_size(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = KB * 1024;
    const GB: i64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

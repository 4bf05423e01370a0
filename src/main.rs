//! CLI entry point for folio

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Build a personal site from Markdown-with-components content", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new document in a collection
    New {
        /// Collection to add to (e.g. posts, portfolio)
        collection: String,

        /// Title of the new document
        title: String,

        /// Document id; defaults to the slugified title
        #[arg(long)]
        id: Option<String>,
    },

    /// Build the static site
    #[command(alias = "g", alias = "generate")]
    Build {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Build and start a local server
    #[command(alias = "s", alias = "server")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,
    },

    /// List documents of one or all collections
    List {
        /// Collection to list (defaults to all)
        collection: Option<String>,

        /// Print route ids only
        #[arg(long)]
        ids: bool,
    },

    /// Compile one document and print its front-matter and HTML
    Show {
        collection: String,
        id: String,
    },

    /// Delete the public folder
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio_rs=debug,info"
    } else {
        "folio_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            folio_rs::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::New {
            collection,
            title,
            id,
        } => {
            let site = folio_rs::Site::new(&base_dir)?;
            tracing::info!("Creating new {} document: {}", collection, title);
            let path =
                folio_rs::commands::new::create_document(&site, &collection, &title, id.as_deref())?;
            println!("Created: {:?}", path);
        }

        Commands::Build { watch } => {
            let site = folio_rs::Site::new(&base_dir)?;
            tracing::info!("Generating static files...");
            site.build().await?;
            println!("Generated successfully!");

            if watch {
                folio_rs::commands::build::watch(&site).await?;
            }
        }

        Commands::Serve { port, ip, r#static } => {
            let site = folio_rs::Site::new(&base_dir)?;

            // Generate first
            tracing::info!("Generating static files...");
            site.build().await?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            folio_rs::server::start(&site, &ip, port, !r#static).await?;
        }

        Commands::List { collection, ids } => {
            let site = folio_rs::Site::new(&base_dir)?;
            folio_rs::commands::list::run(&site, collection.as_deref(), ids)?;
        }

        Commands::Show { collection, id } => {
            let site = folio_rs::Site::new(&base_dir)?;
            folio_rs::commands::show::run(&site, &collection, &id).await?;
        }

        Commands::Clean => {
            let site = folio_rs::Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("folio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

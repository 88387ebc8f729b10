//! linkdir - Link Directory Admin CLI
//!
//! Operator access to the storage contract: list, create, update and delete
//! categories and links on whichever backend is configured.
//!
//! # Usage
//!
//! ```bash
//! # Connectivity check
//! linkdir check
//!
//! # Create a category, then a link in it
//! linkdir categories add --name Tools --slug tools --icon wrench
//! linkdir links add --title rustup --url https://rustup.rs --category-id <id>
//!
//! # Everything the public listing shows
//! linkdir --backend document navigation
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;

use linkdir::storage::{
    create_adapter, CategoryPatch, LinkPatch, NewCategory, NewLink, StorageAdapter, StoreConfig,
};
use linkdir::{load_navigation, Adapter, APP_NAME, APP_VERSION};

// =============================================================================
// CLI
// =============================================================================

/// Link directory admin tool
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(about = "Manage link directory categories and links")]
#[command(version)]
struct Cli {
    /// Backend tag (relational | document); overrides DATABASE_TYPE
    #[arg(short, long, global = true)]
    backend: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and disconnect, reporting success
    Check,
    /// Manage categories
    #[command(subcommand)]
    Categories(CategoryCommand),
    /// Manage links
    #[command(subcommand)]
    Links(LinkCommand),
    /// Print categories and links together
    Navigation,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// List all categories
    List,
    /// Create a category
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: String,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Change fields of a category
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Delete a category
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum LinkCommand {
    /// List all links with their category names
    List,
    /// Create a link
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        category_id: String,
        #[arg(long, default_value = "")]
        image_url: String,
        #[arg(long, default_value = "")]
        ai_hint: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        favicon_url: String,
    },
    /// Change fields of a link
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        category_id: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        ai_hint: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        favicon_url: Option<String>,
    },
    /// Delete a link
    Delete { id: String },
}

// =============================================================================
// Commands
// =============================================================================

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_category(store: &Adapter, command: CategoryCommand) -> anyhow::Result<()> {
    match command {
        CategoryCommand::List => print_json(&store.get_categories().await?),
        CategoryCommand::Add { name, slug, icon } => {
            let mut category = NewCategory::new(name, slug);
            category.icon = icon;
            print_json(&store.add_category(category).await?)
        }
        CategoryCommand::Update {
            id,
            name,
            slug,
            icon,
        } => {
            let patch = CategoryPatch { name, slug, icon };
            print_json(&store.update_category(&id, &patch).await?)
        }
        CategoryCommand::Delete { id } => {
            store.delete_category(&id).await?;
            print_json(&serde_json::json!({ "success": true }))
        }
    }
}

async fn run_link(store: &Adapter, command: LinkCommand) -> anyhow::Result<()> {
    match command {
        LinkCommand::List => print_json(&store.get_links().await?),
        LinkCommand::Add {
            title,
            url,
            category_id,
            image_url,
            ai_hint,
            description,
            favicon_url,
        } => {
            let link = NewLink::new(title, url, category_id)
                .with_image_url(image_url)
                .with_ai_hint(ai_hint)
                .with_description(description)
                .with_favicon_url(favicon_url);
            print_json(&store.add_link(link).await?)
        }
        LinkCommand::Update {
            id,
            title,
            url,
            category_id,
            image_url,
            ai_hint,
            description,
            favicon_url,
        } => {
            let patch = LinkPatch {
                title,
                url,
                category_id,
                image_url,
                ai_hint,
                description,
                favicon_url,
            };
            print_json(&store.update_link(&id, &patch).await?)
        }
        LinkCommand::Delete { id } => {
            store.delete_link(&id).await?;
            print_json(&serde_json::json!({ "success": true }))
        }
    }
}

async fn run(store: &Adapter, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Check => {
            tracing::info!(backend = %store.kind(), "database connected successfully");
            Ok(())
        }
        Commands::Categories(command) => run_category(store, command).await,
        Commands::Links(command) => run_link(store, command).await,
        Commands::Navigation => print_json(&load_navigation(store).await?),
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("{} v{}", APP_NAME, APP_VERSION);

    let mut config = StoreConfig::from_env()?;
    if let Some(tag) = cli.backend {
        config = config.with_backend(tag);
    }

    let mut store = create_adapter(&config)?;
    store.connect().await?;

    let result = run(&store, cli.command).await;

    // Release the pool even when the command failed
    store.disconnect().await?;
    result
}

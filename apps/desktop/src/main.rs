mod config;
mod render;
mod shell;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    CatalogApi, CatalogSession, FavoritesPersistence, FavoritesStore, HttpCatalogClient,
    SlotFavorites, Theme,
};
use shared::domain::{FavoriteToggle, PageCursor, ProductId};
use storage::Storage;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, normalize_database_url, Settings},
    render::{render_categories, render_favorites},
    shell::render_session,
};

#[derive(Parser, Debug)]
#[command(name = "catalog", about = "Browse a product catalog and keep favorites")]
struct Cli {
    /// Path to a TOML config file (defaults to ./catalog.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive shell (the default).
    Browse,
    /// Print one page of the unfiltered listing.
    List {
        /// One-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Search {
        query: String,
    },
    Category {
        slug: String,
    },
    Categories,
    Favorites,
    ToggleFavorite {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = apply_overrides(load_settings(cli.config.as_deref()), &cli);
    let client =
        HttpCatalogClient::with_timeout(&settings.api_base_url, settings.request_timeout())
            .context("invalid catalog base url")?;
    info!(
        api_base_url = %client.base_url(),
        page_size = settings.page_size,
        "catalog starting"
    );
    let api: Arc<dyn CatalogApi> = Arc::new(client);
    let persistence = open_favorites(&settings).await?;

    match cli.command.unwrap_or(Command::Browse) {
        Command::Browse => {
            let mut session =
                CatalogSession::open(api, settings.page_size, PageCursor::FIRST, persistence)
                    .await;
            let input = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            shell::run(&mut session, input, &mut stdout).await?;
        }
        Command::List { page } => {
            let cursor = PageCursor::new(page.saturating_sub(1));
            let session = CatalogSession::open(api, settings.page_size, cursor, persistence).await;
            print!("{}", render_session(&session).await);
        }
        Command::Search { query } => {
            let session =
                CatalogSession::open(api, settings.page_size, PageCursor::FIRST, persistence)
                    .await;
            session
                .filters()
                .search(&query)
                .await
                .with_context(|| format!("search for {query:?} failed"))?;
            print!("{}", render_session(&session).await);
        }
        Command::Category { slug } => {
            let session =
                CatalogSession::open(api, settings.page_size, PageCursor::FIRST, persistence)
                    .await;
            session
                .filters()
                .filter_by_category(&slug)
                .await
                .with_context(|| format!("category {slug:?} failed"))?;
            print!("{}", render_session(&session).await);
        }
        Command::Categories => {
            let categories = api.categories().await.context("failed to load categories")?;
            print!("{}", render_categories(&categories));
        }
        Command::Favorites => {
            let favorites = FavoritesStore::hydrate(persistence).await;
            print!(
                "{}",
                render_favorites(&favorites.favorites().await, Theme::default())
            );
        }
        Command::ToggleFavorite { id } => {
            let session =
                CatalogSession::open(api, settings.page_size, PageCursor::FIRST, persistence)
                    .await;
            let (product, outcome) = session.toggle_favorite_by_id(ProductId(id)).await?;
            match outcome {
                FavoriteToggle::Added => {
                    println!("Added #{} {} to favorites.", product.id, product.title)
                }
                FavoriteToggle::Removed => {
                    println!("Removed #{} {} from favorites.", product.id, product.title)
                }
            }
        }
    }

    Ok(())
}

fn apply_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(url) = &cli.api_base_url {
        settings.api_base_url = url.clone();
    }
    if let Some(page_size) = cli.page_size {
        settings.page_size = page_size;
    }
    if let Some(url) = &cli.database_url {
        settings.database_url = normalize_database_url(url);
    }
    settings
}

async fn open_favorites(settings: &Settings) -> Result<Arc<dyn FavoritesPersistence>> {
    let database_url = settings.database_url();
    let storage = match Storage::new(&database_url).await {
        Ok(storage) => storage,
        Err(error) => {
            error!(%database_url, error = %error, "failed to open favorites storage");
            return Err(error).context("failed to open favorites storage");
        }
    };
    storage
        .health_check()
        .await
        .context("favorites storage is not responding")?;
    Ok(Arc::new(SlotFavorites::new(storage)))
}

//! `stores` subcommands: read-only views of the feed.

use clap::Subcommand;
use dankmaps_core::store::status_label;
use dankmaps_core::{filter_stores, AppConfig, Favorites, Platform, StoreRecord};
use dankmaps_feed::{FeedClient, FeedError};

#[derive(Debug, Subcommand)]
pub enum StoresCommands {
    /// List stores, optionally filtered by category and title
    List {
        /// Category chip to filter by (e.g., CBD); "All" disables the filter
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive title substring
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Show one store's details
    Show {
        id: String,
        /// Platform used for the directions link
        #[arg(long, value_enum, default_value_t = PlatformArg::Android)]
        platform: PlatformArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PlatformArg {
    Android,
    Ios,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Android => Platform::Android,
            PlatformArg::Ios => Platform::Ios,
        }
    }
}

/// Wraps a feed error with the message the app would show the user.
pub(crate) fn feed_failure(err: FeedError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

pub(crate) fn feed_client(config: &AppConfig) -> anyhow::Result<FeedClient> {
    FeedClient::from_config(config).map_err(feed_failure)
}

pub(crate) async fn run(config: &AppConfig, command: StoresCommands) -> anyhow::Result<()> {
    let client = feed_client(config)?;
    match command {
        StoresCommands::List { category, search } => {
            let stores = client.fetch_stores().await.map_err(feed_failure)?;
            let favorites = crate::favorites::load(&config.favorites_path)?;
            print_store_table(&filter_stores(&stores, category.as_deref(), &search), &favorites);
            Ok(())
        }
        StoresCommands::Show { id, platform } => {
            let store = client.fetch_store(&id).await.map_err(feed_failure)?;
            print_store_detail(&store, platform.into());
            Ok(())
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_owned()
    }
}

fn print_store_table(stores: &[&StoreRecord], favorites: &Favorites) {
    if stores.is_empty() {
        println!("no stores match");
        return;
    }

    println!("{:<6}{:<20}{:<4}{:<42}CATEGORIES", "ID", "STATUS", "FAV", "TITLE");
    for store in stores {
        println!(
            "{:<6}{:<20}{:<4}{:<42}{}",
            store.id,
            status_label(store.status),
            if favorites.is_favorite(&store.id) { "*" } else { "" },
            truncate(&store.title, 38),
            store.categories.join(", ")
        );
    }
}

fn print_store_detail(store: &StoreRecord, platform: Platform) {
    println!("{} ({})", store.title, status_label(store.status));
    if let Some(description) = &store.description {
        println!("{description}");
    }
    println!();
    println!("location:   {}", store.location());
    if !store.categories.is_empty() {
        println!("categories: {}", store.categories.join(", "));
    }
    if let Some(logo) = store.logo.renderable().as_str() {
        println!("logo:       {logo}");
    }
    if let Some(website) = &store.website {
        println!("website:    {website}");
    }
    println!("directions: {}", store.directions_url(platform));
    println!("share:      {}", store.share_message());
}

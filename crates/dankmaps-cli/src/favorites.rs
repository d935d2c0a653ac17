//! `favorites` subcommands backed by a JSON file of `{ "id": bool }`.

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use dankmaps_core::{AppConfig, Favorites};

#[derive(Debug, Subcommand)]
pub enum FavoritesCommands {
    /// List favorite store ids
    List,
    /// Flip the favorite flag for a store
    Toggle { id: String },
}

pub(crate) fn run(config: &AppConfig, command: FavoritesCommands) -> anyhow::Result<()> {
    let path = config.favorites_path.as_path();
    match command {
        FavoritesCommands::List => {
            let favorites = load(path)?;
            let mut any = false;
            for id in favorites.ids() {
                println!("{id}");
                any = true;
            }
            if !any {
                println!("no favorites yet");
            }
            Ok(())
        }
        FavoritesCommands::Toggle { id } => {
            let mut favorites = load(path)?;
            let on = favorites.toggle(&id);
            save(path, &favorites)?;
            println!("{id}: {}", if on { "favorite" } else { "not favorite" });
            Ok(())
        }
    }
}

/// A missing file is an empty favorites map.
pub(crate) fn load(path: &Path) -> anyhow::Result<Favorites> {
    if !path.exists() {
        return Ok(Favorites::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read favorites from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("favorites file {} is not a JSON object", path.display()))
}

pub(crate) fn save(path: &Path, favorites: &Favorites) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(favorites)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write favorites to {}", path.display()))
}

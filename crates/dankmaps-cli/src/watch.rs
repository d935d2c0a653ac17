//! `watch`: load the directory, then apply pushed store changes until ctrl-c.

use dankmaps_core::{AppConfig, DeniedLocation, FixedLocation, GeoPoint, MapController};
use dankmaps_feed::MapSession;
use futures::StreamExt;

use crate::map::shutdown_signal;
use crate::stores::{feed_client, feed_failure};

pub(crate) async fn run(config: &AppConfig, user: Option<GeoPoint>) -> anyhow::Result<()> {
    let client = feed_client(config)?;
    let mut session = MapSession::new(
        client.clone(),
        MapController::new(config.unknown_update_policy),
    );

    let loaded = match user {
        Some(point) => {
            session
                .load_until(&FixedLocation(point), shutdown_signal())
                .await
        }
        None => session.load_until(&DeniedLocation, shutdown_signal()).await,
    };
    let Some(loaded) = loaded else {
        return Ok(());
    };
    let count = loaded.feed.map_err(feed_failure)?;
    println!("loaded {count} stores; waiting for updates (ctrl-c to stop)");

    let subscription = client.subscribe_updates().await.map_err(feed_failure)?;
    let printed = subscription.inspect(|item| match item {
        Ok(update) => println!(
            "storeDetailsUpdated: {} {}",
            update.id,
            update.title.as_deref().unwrap_or("")
        ),
        Err(e) => eprintln!("unreadable update: {e}"),
    });

    let summary = session.follow_updates(printed, shutdown_signal()).await;
    println!(
        "updated {}, appended {}, ignored {}, errors {}",
        summary.updated, summary.appended, summary.ignored, summary.errors
    );
    Ok(())
}

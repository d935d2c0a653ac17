//! `map` subcommands: run the viewport and selection logic against the live
//! feed and print the resulting regions as JSON.

use clap::Subcommand;
use dankmaps_core::{
    AppConfig, DeniedLocation, FixedLocation, GeoPoint, MapController, Province, Region,
};
use dankmaps_feed::MapSession;

use crate::stores::{feed_client, feed_failure};

#[derive(Debug, Subcommand)]
pub enum MapCommands {
    /// Region framing every store plus the user position
    Fit {
        /// Current position as `lat,lng`
        #[arg(long, value_parser = crate::parse_point, allow_hyphen_values = true)]
        user: Option<GeoPoint>,
    },
    /// Recenter target for selecting a store
    Select {
        id: String,
        /// Current position as `lat,lng`
        #[arg(long, value_parser = crate::parse_point, allow_hyphen_values = true)]
        user: Option<GeoPoint>,
        /// Start from a province preset instead of the fitted region
        #[arg(long)]
        province: Option<Province>,
    },
    /// Title search over the loaded stores
    Search { query: String },
    /// Preset region for a province
    Province { name: Province },
}

pub(crate) async fn run(config: &AppConfig, command: MapCommands) -> anyhow::Result<()> {
    match command {
        MapCommands::Province { name } => print_region(&name.region()),
        MapCommands::Fit { user } => {
            let session = load(config, user).await?;
            match session.controller().region() {
                Some(region) => print_region(&region),
                None => {
                    println!("nothing to fit: no stores and no user location");
                    Ok(())
                }
            }
        }
        MapCommands::Select { id, user, province } => {
            let mut session = load(config, user).await?;
            let controller = session.controller_mut();
            if let Some(province) = province {
                controller.select_province(province);
            }
            let intent = controller.select_store(&id)?;
            if let Some(store) = controller.selected_store() {
                println!("selected: {} ({})", store.title, store.id);
            }
            print_region(&intent.region)
        }
        MapCommands::Search { query } => {
            let mut session = load(config, None).await?;
            let controller = session.controller_mut();
            controller.set_search_query(&query);
            let results = controller.search_results();
            if results.is_empty() {
                println!("no stores match '{query}'");
            }
            for store in results {
                println!("{:<6}{}", store.id, store.title);
            }
            Ok(())
        }
    }
}

/// Loads the feed and the given user position into a fresh session.
async fn load(config: &AppConfig, user: Option<GeoPoint>) -> anyhow::Result<MapSession> {
    let mut session = MapSession::new(
        feed_client(config)?,
        MapController::new(config.unknown_update_policy),
    );

    let outcome = match user {
        Some(point) => {
            session
                .load_until(&FixedLocation(point), shutdown_signal())
                .await
        }
        None => session.load_until(&DeniedLocation, shutdown_signal()).await,
    };
    let Some(outcome) = outcome else {
        anyhow::bail!("interrupted before the store feed loaded");
    };

    let count = outcome.feed.map_err(feed_failure)?;
    tracing::debug!(count, "stores loaded");
    Ok(session)
}

pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

fn print_region(region: &Region) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(region)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use dankmaps_core::{Environment, UnknownUpdatePolicy};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(feed_url: String) -> AppConfig {
        AppConfig {
            env: Environment::Test,
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            log_level: "info".to_owned(),
            seed_path: "stores.yaml".into(),
            feed_url,
            feed_timeout_ms: 2_000,
            feed_max_retries: 0,
            feed_retry_backoff_ms: 1,
            feed_user_agent: "dankmaps-cli-test".to_owned(),
            unknown_update_policy: UnknownUpdatePolicy::Ignore,
            favorites_path: "favorites.json".into(),
        }
    }

    #[tokio::test]
    async fn load_frames_stores_and_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "1", "title": "A", "latitude": -25.85, "longitude": 28.19 },
                { "id": "2", "title": "B", "latitude": -25.75, "longitude": 28.20 }
            ])))
            .mount(&server)
            .await;

        let session = load(&config(server.uri()), Some(GeoPoint::new(-25.80, 28.18)))
            .await
            .expect("load");
        let region = session.controller().region().expect("region");
        assert!((region.latitude - (-25.80)).abs() < 1e-9);
        assert_eq!(session.controller().stores().len(), 2);
    }

    #[tokio::test]
    async fn load_reports_server_error_as_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clients"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = load(&config(server.uri()), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Server Error: 500");
    }
}

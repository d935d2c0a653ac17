//! Store directory records as consumed by the map and list views.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Bundled image shown for stores that have no logo of their own.
pub const PLACEHOLDER_LOGO_ASSET: &str = "logo-placeholder.png";

/// Where a store's logo comes from, resolved once when the record is ingested.
///
/// On the wire a logo is a single optional string: an absolute `http(s)` URL
/// for uploaded images, or the file name of an asset bundled with the app.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Logo {
    Remote { url: String },
    Asset { name: String },
    #[default]
    None,
}

impl Logo {
    /// Classifies a raw wire value.
    #[must_use]
    pub fn classify(raw: Option<&str>) -> Self {
        let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return Logo::None;
        };
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Logo::Remote {
                url: value.to_owned(),
            }
        } else {
            Logo::Asset {
                name: value.to_owned(),
            }
        }
    }

    /// The reference a view should render, substituting the placeholder asset
    /// for a missing logo.
    #[must_use]
    pub fn renderable(&self) -> Logo {
        match self {
            Logo::None => Logo::Asset {
                name: PLACEHOLDER_LOGO_ASSET.to_owned(),
            },
            other => other.clone(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Logo::Remote { url } => Some(url),
            Logo::Asset { name } => Some(name),
            Logo::None => None,
        }
    }
}

impl From<Option<String>> for Logo {
    fn from(raw: Option<String>) -> Self {
        Logo::classify(raw.as_deref())
    }
}

impl From<Logo> for Option<String> {
    fn from(logo: Logo) -> Self {
        match logo {
            Logo::Remote { url } => Some(url),
            Logo::Asset { name } => Some(name),
            Logo::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Open,
    Closed,
}

impl StoreStatus {
    /// Lenient parse used at ingestion; unknown values mean "status unknown".
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Some(StoreStatus::Open),
            "closed" => Some(StoreStatus::Closed),
            _ => None,
        }
    }
}

/// Label shown in the store detail panel.
#[must_use]
pub fn status_label(status: Option<StoreStatus>) -> &'static str {
    match status {
        Some(StoreStatus::Open) => "Open now",
        Some(StoreStatus::Closed) => "Closed",
        None => "Status Unavailable",
    }
}

/// Target platform for directions deep links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
}

/// One physical storefront in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Logo,
    #[serde(default)]
    pub categories: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StoreStatus>,
}

impl StoreRecord {
    #[must_use]
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Deep link that opens the platform maps app on this store.
    #[must_use]
    pub fn directions_url(&self, platform: Platform) -> String {
        let scheme = match platform {
            Platform::Android => "geo",
            Platform::Ios => "maps",
        };
        format!("{scheme}:0,0?q={},{}", self.latitude, self.longitude)
    }

    #[must_use]
    pub fn share_message(&self) -> String {
        match self.website.as_deref().filter(|w| !w.trim().is_empty()) {
            Some(website) => format!("Check out {} at {website}", self.title),
            None => format!("Check out {}", self.title),
        }
    }
}

/// Removes blank and repeated categories, keeping first-seen order.
#[must_use]
pub fn dedup_categories<I, S>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for category in categories {
        let trimmed = category.as_ref().trim();
        if !trimmed.is_empty() && !out.iter().any(|c| c == trimmed) {
            out.push(trimmed.to_owned());
        }
    }
    out
}

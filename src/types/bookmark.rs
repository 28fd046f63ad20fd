use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A saved bookmark, as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub url: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

/// Fields for a bookmark about to be created. The backend assigns the
/// identifier and timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub user_id: String,
}

/// Ensures a user-entered URL carries an explicit scheme, defaulting to
/// `https://` when none is present.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

impl Bookmark {
    /// Lookup URL for the bookmarked site's favicon, or `None` when the
    /// stored URL does not parse.
    pub fn favicon_url(&self) -> Option<String> {
        let parsed = Url::parse(&self.url).ok()?;
        let host = parsed.host_str()?;
        Some(format!(
            "https://www.google.com/s2/favicons?domain={}&sz=32",
            host
        ))
    }

    /// Short human label for the record's age relative to `now`: "Just now",
    /// then minutes, hours, and days, then a short month-day date once the
    /// record is a week old.
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let secs = (now - self.created_at).num_seconds();
        if secs < 60 {
            return "Just now".to_string();
        }
        if secs < 3_600 {
            return format!("{}m ago", secs / 60);
        }
        if secs < 86_400 {
            return format!("{}h ago", secs / 3_600);
        }
        if secs < 604_800 {
            return format!("{}d ago", secs / 86_400);
        }
        self.created_at.format("%b %-d").to_string()
    }
}

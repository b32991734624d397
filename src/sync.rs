//! Roster ingestion from the vtbs.moe mirror endpoints.

use serde_json::Value;

use crate::db::VupDb;
use crate::Result;

/// Mirrors of the same roster feed, tried in this order.
pub const VTB_URLS: [&str; 3] = [
    "https://api.vtbs.moe/v1/short",
    "https://api.tokyo.vtbs.moe/v1/short",
    "https://vtbs.musedash.moe/v1/short",
];

/// Pulls the roster feed from each mirror and stores every entry.
///
/// The host constructs one of these and owns its lifetime; there is no
/// process-wide instance.
pub struct RosterSync {
    client: reqwest::Client,
    urls: Vec<String>,
}

impl RosterSync {
    pub fn new() -> Self {
        Self::with_urls(VTB_URLS.iter().map(|s| s.to_string()).collect())
    }

    /// Sync against a caller-supplied endpoint list instead of [`VTB_URLS`].
    pub fn with_urls(urls: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            urls,
        }
    }

    /// Fetch every endpoint in order and insert each roster entry into `db`.
    ///
    /// The first request failure, non-success status, or store error aborts
    /// the sync; later endpoints are not contacted. Rows inserted before the
    /// failure remain, as each insert commits on its own. Returns the number
    /// of entries processed across all endpoints.
    pub async fn sync_all(&self, db: &VupDb) -> Result<usize> {
        let mut total = 0;
        for url in &self.urls {
            let resp = self.client.get(url).send().await?.error_for_status()?;
            let body = resp.text().await?;
            let count = ingest_roster(db, &body)?;
            log::info!("synced {} roster entries from {}", count, url);
            total += count;
        }
        Ok(total)
    }
}

impl Default for RosterSync {
    fn default() -> Self {
        Self::new()
    }
}

/// Store every entry of a roster payload. The feed is not schema-guaranteed,
/// so missing or mistyped fields fall back to 0 / empty string, and a body
/// that is not a JSON array ingests nothing rather than failing.
fn ingest_roster(db: &VupDb, body: &str) -> Result<usize> {
    let payload: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let Some(entries) = payload.as_array() else {
        log::warn!("roster payload is not a JSON array, ignoring");
        return Ok(0);
    };
    for entry in entries {
        let mid = entry.get("mid").and_then(Value::as_i64).unwrap_or_default();
        let uname = entry
            .get("uname")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let roomid = entry
            .get("roomid")
            .and_then(Value::as_i64)
            .unwrap_or_default();
        db.insert_vup_by_mid(mid, uname, roomid)?;
    }
    Ok(entries.len())
}

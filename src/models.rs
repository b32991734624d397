//! Record types shared between the store and the ingestor.

use serde::{Deserialize, Serialize};

/// One tracked virtual streamer from the vtbs.moe roster feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vup {
    pub mid: i64,
    pub uname: String,
    pub roomid: i64,
}

/// A row of the single-purpose `config` table. Only the cookie key is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

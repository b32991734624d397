//! Bilibili vup roster persistence and sync.
//!
//! Mirrors the vtbs.moe roster feed into a local SQLite database and keeps
//! the bilibili session cookie other plugin code authenticates with. The
//! hosting plugin layer owns the [`VupDb`] handle and triggers
//! [`RosterSync::sync_all`] on whatever schedule it likes; nothing here
//! spawns background work.

pub mod db;
pub mod models;
pub mod sync;

pub use db::VupDb;
pub use models::{ConfigEntry, Vup};
pub use sync::{RosterSync, VTB_URLS};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Product image catalog: uploads images to remote storage and keeps a record
//! of each one (name, price, stock flag, public URL).

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod storage;

use std::sync::Arc;

use db::ImageStore;
use storage::BlobStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ImageStore>,
    pub storage: Arc<dyn BlobStorage>,
    /// Answer 401 on every failure of list/add/remove
    pub legacy_status_codes: bool,
}

use std::sync::Arc;

use storage::clock::Clock;
use storage::repository::Repo;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repo>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

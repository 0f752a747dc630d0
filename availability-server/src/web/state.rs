//! Application state for the web layer.

use std::sync::Arc;

use crate::download::DocumentDownloader;
use crate::harvest::Harvester;
use crate::query::AvailabilityQueryEngine;
use crate::store::TimetableStore;

/// The store shared by the query engine and the harvester.
pub type SharedStore = Arc<dyn TimetableStore>;

/// Shared application state.
///
/// The query engine and the harvester read and write the same store.
#[derive(Clone)]
pub struct AppState {
    /// Answers availability queries
    pub engine: Arc<AvailabilityQueryEngine<SharedStore>>,

    /// Fetches published timetables into the store
    pub harvester: Arc<Harvester<DocumentDownloader, SharedStore>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        engine: AvailabilityQueryEngine<SharedStore>,
        harvester: Harvester<DocumentDownloader, SharedStore>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            harvester: Arc::new(harvester),
        }
    }

    pub fn store(&self) -> &SharedStore {
        self.engine.store()
    }
}

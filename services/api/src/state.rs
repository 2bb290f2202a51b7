//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the catalogs, the
//! guarded navigation state and the speech backend shared by all handlers.

use crate::{config::Config, sessions::SessionRegistry};
use clearpath_core::{Catalog, SharedNavigation, SpeechIo};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub visual_catalog: Arc<Catalog>,
    pub hearing_catalog: Arc<Catalog>,
    pub navigation: SharedNavigation,
    pub sessions: Arc<SessionRegistry>,
    pub speech: Arc<dyn SpeechIo>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        visual_catalog: Catalog,
        hearing_catalog: Catalog,
        speech: Arc<dyn SpeechIo>,
        config: Config,
    ) -> Self {
        let visual_catalog = Arc::new(visual_catalog);
        let navigation = SharedNavigation::new();
        let sessions = Arc::new(SessionRegistry::new(
            speech.clone(),
            visual_catalog.clone(),
            navigation.clone(),
        ));
        Self {
            visual_catalog,
            hearing_catalog: Arc::new(hearing_catalog),
            navigation,
            sessions,
            speech,
            config: Arc::new(config),
        }
    }
}

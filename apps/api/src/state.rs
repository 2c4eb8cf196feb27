use std::sync::Arc;

use crate::config::Config;
use crate::lexicon::Lexicon;
use crate::sessions::SessionManager;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Word source for every session. Default: built-in `WordIndex`; `LEXICON_PATH` swaps the list.
    pub lexicon: Arc<dyn Lexicon>,
    pub sessions: SessionManager,
}

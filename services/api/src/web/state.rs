//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use mediscribe_core::entitlement::EntitlementService;
use mediscribe_core::ports::{CompletionService, DocumentStore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Everything mutable lives behind the store port; handlers themselves hold
/// no per-request state, so concurrent requests only ever contend on the
/// external collaborators.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// Completion adapter tuned for exam analysis.
    pub analysis_completions: Arc<dyn CompletionService>,
    /// Completion adapter tuned for document generation.
    pub generation_completions: Arc<dyn CompletionService>,
    pub entitlements: EntitlementService,
    pub config: Arc<Config>,
}

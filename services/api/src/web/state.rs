//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use journey_core::ports::{LeadSink, StudentDataSource};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub data_source: Arc<dyn StudentDataSource>,
    pub leads: Arc<dyn LeadSink>,
}

//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::assistant::PetAssistant;
use beyond_bark_core::ports::{ImageHostService, RescueStore, UserStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// Every collaborator is constructed by the binary and injected here.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub pets: Arc<dyn RescueStore>,
    pub images: Arc<dyn ImageHostService>,
    pub assistant: PetAssistant,
}

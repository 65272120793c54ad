// Stockroom - a small inventory-tracking HTTP service
//
// This library re-exports the core HTTP service pieces and the photo
// storage layer; the binary in main.rs wires them to a CLI.

// Re-export core functionality
pub use stockroom_core::*;

// Re-export the storage layer
pub use stockroom_storage;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AppState, Application, Error, HttpMethod, HttpRequest, HttpResponse, HttpStatus, Item,
        ItemPatch, ItemStore, ItemView, Route, Router, routes,
    };
    pub use stockroom_storage::PhotoStore;
}

// Core library for the Stockroom inventory service
// This module contains the HTTP types, the route table, and the item store

pub mod application;
pub mod error;
pub mod form;
pub mod handlers;
pub mod http;
pub mod item;
pub mod routing;
pub mod status;
pub mod store;

// Re-export commonly used types
pub use application::*;
pub use error::*;
pub use handlers::{AppState, routes};
pub use http::*;
pub use item::*;
pub use routing::{HandlerFn, Route, Router};
pub use status::*;
pub use store::*;

//! Upload handling and photo attachment storage for Stockroom
//!
//! This crate provides:
//! - Multipart form decoding with file fields spooled to disk
//! - The photo attachment store over the cache directory
//!
//! The attachment store enforces one live photo file per item: writes always
//! land in a freshly named file and the superseded file is released only
//! after the owning record points at the new one.
//!
//! # Quick Start
//!
//! ```no_run
//! use stockroom_storage::PhotoStore;
//!
//! # async fn example() -> Result<(), stockroom_storage::StorageError> {
//! let photos = PhotoStore::new("./cache").await?;
//! let path = photos.store("item-id", bytes::Bytes::from_static(b"raw image")).await?;
//! photos.release(&path).await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod multipart;
pub mod photos;

pub use error::*;
pub use multipart::*;
pub use photos::*;

// Inventory item records and their client-facing shape

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An inventory record. `photo` is the internal file reference; it never
/// leaves the process, clients see the derived URL instead.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub photo: Option<PathBuf>,
}

/// Partial update payload. Missing and empty values count as "not provided".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// The shape every item takes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(
        rename = "photoUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
}

impl Item {
    /// URL under which the photo is served, when one is attached.
    pub fn photo_url(&self) -> Option<String> {
        self.photo
            .as_ref()
            .map(|_| format!("/inventory/{}/photo", self.id))
    }

    pub fn view(&self) -> ItemView {
        ItemView {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            photo_url: self.photo_url(),
        }
    }
}

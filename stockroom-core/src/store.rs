// In-memory item store

use crate::{Error, Item, ItemPatch};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// The resource store: id to record, plus insertion order for listings.
///
/// Every operation is one critical section over the map, so a reader never
/// observes a record mid-update. Ids are UUIDs, unique and never reused.
#[derive(Clone, Default)]
pub struct ItemStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    items: HashMap<String, Item>,
    order: Vec<String>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record with a fresh id and no photo.
    pub fn create(&self, name: &str, description: &str) -> Result<Item, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("inventory_name is required".to_string()));
        }

        let item = Item {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            photo: None,
        };

        let mut inner = self.inner.lock();
        inner.order.push(item.id.clone());
        inner.items.insert(item.id.clone(), item.clone());

        debug!(id = %item.id, "Created item");
        Ok(item)
    }

    pub fn get(&self, id: &str) -> Result<Item, Error> {
        self.inner
            .lock()
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// All records, in insertion order.
    pub fn list(&self) -> Vec<Item> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.items.get(id))
            .cloned()
            .collect()
    }

    /// Partial update: provided, non-empty fields replace the old values.
    /// The patch is computed into a full replacement record and swapped in
    /// whole, so no partially-applied state is ever observable.
    pub fn update(&self, id: &str, patch: ItemPatch) -> Result<Item, Error> {
        let mut inner = self.inner.lock();
        let current = inner.items.get(id).cloned().ok_or_else(|| not_found(id))?;
        let updated = apply_patch(&current, &patch);
        inner.items.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    /// Remove and return a record. Photo cleanup is the caller's job, done
    /// before this call so no reference can dangle.
    pub fn delete(&self, id: &str) -> Result<Item, Error> {
        let mut inner = self.inner.lock();
        let item = inner.items.remove(id).ok_or_else(|| not_found(id))?;
        inner.order.retain(|existing| existing != id);
        debug!(id = %id, "Deleted item");
        Ok(item)
    }

    /// Swap the photo reference, returning the previous one so the caller
    /// can release the superseded file. The swap is atomic; the record never
    /// holds two simultaneously-valid references.
    pub fn attach_photo(&self, id: &str, path: PathBuf) -> Result<Option<PathBuf>, Error> {
        let mut inner = self.inner.lock();
        let item = inner.items.get_mut(id).ok_or_else(|| not_found(id))?;
        Ok(item.photo.replace(path))
    }

    /// Clear the photo reference, returning the previous one.
    pub fn detach_photo(&self, id: &str) -> Result<Option<PathBuf>, Error> {
        let mut inner = self.inner.lock();
        let item = inner.items.get_mut(id).ok_or_else(|| not_found(id))?;
        Ok(item.photo.take())
    }
}

fn not_found(id: &str) -> Error {
    Error::NotFound(format!("item '{id}' not found"))
}

/// Pure patch application; empty values are "not provided".
fn apply_patch(item: &Item, patch: &ItemPatch) -> Item {
    let mut updated = item.clone();
    if let Some(name) = patch.name.as_deref() {
        if !name.trim().is_empty() {
            updated.name = name.to_string();
        }
    }
    if let Some(description) = patch.description.as_deref() {
        if !description.is_empty() {
            updated.description = description.to_string();
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_get_roundtrip() {
        let store = ItemStore::new();
        let item = store.create("Widget", "A widget").unwrap();

        let fetched = store.get(&item.id).unwrap();
        assert_eq!(fetched.name, "Widget");
        assert_eq!(fetched.description, "A widget");
        assert_eq!(fetched.photo, None);
    }

    #[test]
    fn test_create_requires_name() {
        let store = ItemStore::new();
        assert!(matches!(store.create("", "x"), Err(Error::Validation(_))));
        assert!(matches!(store.create("   ", "x"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_ids_are_unique() {
        let store = ItemStore::new();
        let mut ids = std::collections::HashSet::new();
        for i in 0..100 {
            let item = store.create(&format!("item-{i}"), "").unwrap();
            assert!(ids.insert(item.id));
        }
        assert_eq!(store.list().len(), 100);
    }

    #[test]
    fn test_list_is_insertion_ordered() {
        let store = ItemStore::new();
        let a = store.create("a", "").unwrap();
        let b = store.create("b", "").unwrap();
        let c = store.create("c", "").unwrap();

        let ids: Vec<String> = store.list().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[test]
    fn test_update_is_partial() {
        let store = ItemStore::new();
        let item = store.create("Widget", "old").unwrap();

        let updated = store
            .update(
                &item.id,
                ItemPatch {
                    name: None,
                    description: Some("new".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Widget");
        assert_eq!(updated.description, "new");
    }

    #[test]
    fn test_update_ignores_empty_name() {
        let store = ItemStore::new();
        let item = store.create("Widget", "").unwrap();

        let updated = store
            .update(
                &item.id,
                ItemPatch {
                    name: Some(String::new()),
                    description: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Widget");
    }

    #[test]
    fn test_update_unknown_id() {
        let store = ItemStore::new();
        let result = store.update("missing", ItemPatch::default());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete_removes_record() {
        let store = ItemStore::new();
        let item = store.create("Widget", "").unwrap();

        store.delete(&item.id).unwrap();
        assert!(matches!(store.get(&item.id), Err(Error::NotFound(_))));
        assert!(store.list().is_empty());
        assert!(matches!(store.delete(&item.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_attach_photo_swaps_reference() {
        let store = ItemStore::new();
        let item = store.create("Widget", "").unwrap();

        let first = PathBuf::from("/cache/a");
        let second = PathBuf::from("/cache/b");

        assert_eq!(store.attach_photo(&item.id, first.clone()).unwrap(), None);
        assert_eq!(
            store.attach_photo(&item.id, second.clone()).unwrap(),
            Some(first)
        );
        assert_eq!(store.get(&item.id).unwrap().photo, Some(second.clone()));

        assert_eq!(store.detach_photo(&item.id).unwrap(), Some(second));
        assert_eq!(store.get(&item.id).unwrap().photo, None);
        assert_eq!(store.detach_photo(&item.id).unwrap(), None);
    }
}

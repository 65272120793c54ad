// Route handlers for the inventory API

use crate::{
    Error, HandlerFn, HttpMethod, HttpRequest, HttpResponse, Item, ItemPatch, ItemStore, ItemView,
    Route, Router, form,
};
use serde::Deserialize;
use std::sync::Arc;
use stockroom_storage::{Multipart, PhotoStore, photo_content_type};

/// Shared handler state: the resource store plus the photo store.
#[derive(Clone)]
pub struct AppState {
    pub items: ItemStore,
    pub photos: PhotoStore,
}

impl AppState {
    pub fn new(items: ItemStore, photos: PhotoStore) -> Self {
        Self { items, photos }
    }
}

/// Build the service route table. Registration order puts the static paths
/// ahead of the parameterized item routes; the router preserves that
/// priority either way.
pub fn routes(state: Arc<AppState>) -> Router {
    let mut router = Router::new();

    router.add_route(Route::new("/register").on(HttpMethod::POST, handler(&state, register)));
    router.add_route(Route::new("/inventory").on(HttpMethod::GET, handler(&state, list)));
    router.add_route(
        Route::new("/search")
            .on(HttpMethod::GET, handler(&state, search_query))
            .on(HttpMethod::POST, handler(&state, search_form)),
    );
    router.add_route(
        Route::new("/inventory/:id")
            .on(HttpMethod::GET, handler(&state, get_item))
            .on(HttpMethod::PUT, handler(&state, update_item))
            .on(HttpMethod::DELETE, handler(&state, delete_item)),
    );
    router.add_route(
        Route::new("/inventory/:id/photo")
            .on(HttpMethod::GET, handler(&state, get_photo))
            .on(HttpMethod::PUT, handler(&state, put_photo)),
    );

    router
}

/// Adapt an async fn taking shared state into a boxed route handler.
fn handler<F, Fut>(state: &Arc<AppState>, f: F) -> HandlerFn
where
    F: Fn(Arc<AppState>, HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    let state = state.clone();
    Arc::new(move |req| Box::pin(f(state.clone(), req)))
}

/// POST /register - multipart fields `inventory_name`, `description`,
/// optional `photo` file.
async fn register(state: Arc<AppState>, req: HttpRequest) -> Result<HttpResponse, Error> {
    let content_type = req
        .header("content-type")
        .cloned()
        .ok_or_else(|| Error::Validation("expected multipart/form-data".to_string()))?;

    let multipart = Multipart::from_bytes(&content_type, req.body.clone(), state.photos.root())?;
    let mut data = multipart.collect_all().await?;

    let name = data.field("inventory_name").unwrap_or("").trim().to_string();
    let description = data.field("description").unwrap_or("").to_string();
    let photo = data.take_file("photo");
    // Spooled files from unexpected fields are never wanted.
    data.discard_files().await;

    if name.is_empty() {
        // Never leave the spooled upload behind on a rejected registration.
        if let Some(photo) = photo {
            photo.discard().await;
        }
        return Err(Error::Validation("inventory_name is required".to_string()));
    }

    let item = match state.items.create(&name, &description) {
        Ok(item) => item,
        Err(e) => {
            if let Some(photo) = photo {
                photo.discard().await;
            }
            return Err(e);
        }
    };

    let item = match photo {
        Some(photo) => match state.photos.adopt(&item.id, &photo.path).await {
            Ok(path) => {
                state.items.attach_photo(&item.id, path)?;
                state.items.get(&item.id)?
            }
            Err(e) => {
                // Half-registered item with no usable photo: roll the record
                // back, drop the spool file, and surface the failure.
                let _ = state.items.delete(&item.id);
                photo.discard().await;
                return Err(e.into());
            }
        },
        None => item,
    };

    HttpResponse::created().with_json(&item.view())
}

/// GET /inventory
async fn list(state: Arc<AppState>, _req: HttpRequest) -> Result<HttpResponse, Error> {
    let views: Vec<ItemView> = state.items.list().iter().map(Item::view).collect();
    HttpResponse::json(&views)
}

/// GET /search?id=&includePhoto=on
async fn search_query(state: Arc<AppState>, req: HttpRequest) -> Result<HttpResponse, Error> {
    let id = req.query("id").cloned().unwrap_or_default();
    let include_photo = req.query("includePhoto").is_some_and(|v| v == "on");
    search_response(&state, &id, include_photo)
}

/// POST /search body shape.
#[derive(Deserialize)]
struct SearchForm {
    #[serde(default)]
    id: String,
    has_photo: Option<String>,
}

/// POST /search with a urlencoded body `id=&has_photo=on`
async fn search_form(state: Arc<AppState>, req: HttpRequest) -> Result<HttpResponse, Error> {
    let search: SearchForm = form::parse_form(&req.body)?;
    let include_photo = search.has_photo.as_deref() == Some("on");
    search_response(&state, &search.id, include_photo)
}

fn search_response(state: &AppState, id: &str, include_photo: bool) -> Result<HttpResponse, Error> {
    // An empty id falls through to the lookup and comes back 404; the
    // store's NotFound is the only id validation.
    let item = state.items.get(id)?;
    let mut view = item.view();

    // Annotation lives in the response payload only, never in the record.
    if include_photo {
        if let Some(url) = item.photo_url() {
            view.description = format!("{} [photo: {}]", view.description, url);
        }
    }

    HttpResponse::json(&view)
}

/// GET /inventory/:id
async fn get_item(state: Arc<AppState>, req: HttpRequest) -> Result<HttpResponse, Error> {
    let id = req.param("id").cloned().unwrap_or_default();
    HttpResponse::json(&state.items.get(&id)?.view())
}

/// PUT /inventory/:id with a JSON body `{name?, description?}`
async fn update_item(state: Arc<AppState>, req: HttpRequest) -> Result<HttpResponse, Error> {
    let id = req.param("id").cloned().unwrap_or_default();
    let patch: ItemPatch = req.json()?;
    HttpResponse::json(&state.items.update(&id, patch)?.view())
}

/// DELETE /inventory/:id
async fn delete_item(state: Arc<AppState>, req: HttpRequest) -> Result<HttpResponse, Error> {
    let id = req.param("id").cloned().unwrap_or_default();

    // Unknown ids 404 here, before the id gets a lock entry.
    state.items.get(&id)?;

    let lock = state.photos.lock(&id);
    let _guard = lock.lock().await;

    // Detach before the record goes away so no reference can dangle. The
    // lock entry is dropped on every exit; the id is gone either way.
    let removed = state
        .items
        .detach_photo(&id)
        .and_then(|photo| state.items.delete(&id).map(|_| photo));
    state.photos.forget(&id);

    if let Some(path) = removed? {
        state.photos.release(&path).await;
    }

    HttpResponse::json(&serde_json::json!({
        "message": format!("item '{id}' deleted"),
    }))
}

/// GET /inventory/:id/photo
async fn get_photo(state: Arc<AppState>, req: HttpRequest) -> Result<HttpResponse, Error> {
    let id = req.param("id").cloned().unwrap_or_default();

    let item = state.items.get(&id)?;
    let path = item
        .photo
        .ok_or_else(|| Error::NotFound(format!("item '{id}' has no photo")))?;

    let data = state.photos.read(&path).await?;
    Ok(HttpResponse::ok()
        .with_header("Content-Type", photo_content_type(&path))
        .with_body(data.to_vec()))
}

/// PUT /inventory/:id/photo with the raw photo bytes as the body
async fn put_photo(state: Arc<AppState>, req: HttpRequest) -> Result<HttpResponse, Error> {
    let id = req.param("id").cloned().unwrap_or_default();

    if req.body.is_empty() {
        return Err(Error::Validation("photo payload is empty".to_string()));
    }

    // 404 before any file hits disk, and before the id gets a lock entry.
    state.items.get(&id)?;

    let lock = state.photos.lock(&id);
    let _guard = lock.lock().await;

    // Replace protocol: write the new file under a fresh name, swap the
    // record's reference, then release the superseded file.
    let path = state.photos.store(&id, req.body.clone()).await?;
    let previous = match state.items.attach_photo(&id, path.clone()) {
        Ok(previous) => previous,
        Err(e) => {
            // The item vanished between the existence check and the swap;
            // do not leave the fresh file or the lock entry orphaned.
            state.photos.release(&path).await;
            state.photos.forget(&id);
            return Err(e);
        }
    };
    if let Some(old) = previous {
        state.photos.release(&old).await;
    }

    HttpResponse::json(&state.items.get(&id)?.view())
}

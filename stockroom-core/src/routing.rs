// Routing system for HTTP requests
//
// The route table is an ordered list of descriptors: one path pattern, each
// with a map of method to handler. Static patterns sit ahead of
// parameterized ones, the first structural match wins, and a matched
// pattern without a handler for the method is a 405, never a 404.

use crate::{Error, HttpMethod, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::sync::Arc;

/// A route handler function type
pub type HandlerFn = Arc<
    dyn Fn(
            HttpRequest,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<HttpResponse, Error>> + Send>,
        > + Send
        + Sync,
>;

/// One path pattern with its per-method handlers
pub struct Route {
    pub path: String,
    pub handlers: HashMap<HttpMethod, HandlerFn>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handlers: HashMap::new(),
        }
    }

    /// Bind a handler for a method on this pattern
    pub fn on(mut self, method: HttpMethod, handler: HandlerFn) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    fn is_static(&self) -> bool {
        !self.path.split('/').any(|s| s.starts_with(':'))
    }
}

/// Router for managing routes and dispatching requests
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Add a route to the table. Static patterns are kept ahead of
    /// parameterized ones so a `:param` segment cannot shadow a fixed path.
    pub fn add_route(&mut self, route: Route) {
        if route.is_static() {
            let pos = self
                .routes
                .iter()
                .position(|r| !r.is_static())
                .unwrap_or(self.routes.len());
            self.routes.insert(pos, route);
        } else {
            self.routes.push(route);
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Whether any pattern structurally matches the path, regardless of
    /// method. Lets the server loop keep the 405/404 distinction for
    /// methods the service does not model.
    pub fn matches_path(&self, path: &str) -> bool {
        self.routes
            .iter()
            .any(|route| match_path(&route.path, path).is_some())
    }

    /// Match the request against the table and run the handler.
    pub async fn dispatch(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        // Split query parameters off the path
        let (path, query_string) = request
            .path
            .split_once('?')
            .map(|(p, q)| (p, Some(q)))
            .unwrap_or((&request.path, None));
        let path = path.to_string();

        if let Some(query) = query_string {
            request.query_params = parse_query_string(query);
        }

        for route in &self.routes {
            let Some(params) = match_path(&route.path, &path) else {
                continue;
            };

            let Some(handler) = route.handlers.get(&request.method) else {
                return Err(Error::MethodNotAllowed(format!(
                    "{} {}",
                    request.method, path
                )));
            };

            request.path_params = params;
            return handler(request).await;
        }

        Err(Error::RouteNotFound(path))
    }
}

/// Match a route path pattern against a request path
/// Returns Some(params) if matched, None otherwise
fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(param_name) = pattern_part.strip_prefix(':') {
            params.insert(param_name.to_string(), path_part.to_string());
        } else if pattern_part != path_part {
            return None;
        }
    }

    Some(params)
}

/// Parse a query string into a map of parameters, percent-decoding values
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            let key = split.next().filter(|k| !k.is_empty())?;
            let value = split.next().unwrap_or("");
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            Some((key.to_string(), value))
        })
        .collect()
}

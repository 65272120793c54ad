// Application bootstrapper and HTTP server loop

use crate::{AppState, Error, HttpMethod, HttpRequest, HttpResponse, Router, handlers};
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// The main application struct
pub struct Application {
    router: Arc<Router>,
}

impl Application {
    /// Wire the inventory route table onto the shared state.
    pub fn new(state: AppState) -> Self {
        Self {
            router: Arc::new(handlers::routes(Arc::new(state))),
        }
    }

    /// Use a custom route table.
    pub fn with_router(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Start the HTTP server. One task per connection; a failing connection
    /// (or a panicking handler inside one) never takes the process down.
    pub async fn listen(self, host: &str, port: u16) -> Result<(), Error> {
        let listener = TcpListener::bind((host, port)).await?;
        let addr = listener.local_addr()?;

        info!(%addr, "Server listening");

        let router = self.router.clone();

        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = router.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let router = router.clone();
                    async move { handle_request(req, router).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(error = %err, "Error serving connection");
                }
            });
        }
    }
}

/// The dispatch boundary: every failure becomes an `{"error": ...}` payload
/// with its taxonomy status here, and server-side failures get a log line.
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(String::from);

    let Some(method) = HttpMethod::from_str(&method) else {
        // Unrecognized methods still honor the 405/404 distinction: a path
        // no pattern matches is a miss, not a method problem.
        let err = if router.matches_path(&path) {
            Error::MethodNotAllowed(format!("{method} {path}"))
        } else {
            Error::RouteNotFound(path)
        };
        return Ok(into_hyper(HttpResponse::from_error(&err)));
    };

    let full_path = match &query {
        Some(q) => format!("{path}?{q}"),
        None => path,
    };
    let mut request = HttpRequest::new(method, full_path);

    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            request
                .headers
                .insert(name.as_str().to_string(), value.to_string());
        }
    }

    // Read the full body before the handler runs; handlers consume bytes,
    // not a callback chain.
    request.body = req.collect().await?.to_bytes();

    let response = match router.dispatch(request).await {
        Ok(response) => response,
        Err(err) => {
            if err.is_server_error() {
                error!(error = %err, "Request failed");
            }
            HttpResponse::from_error(&err)
        }
    };

    Ok(into_hyper(response))
}

/// Convert our HttpResponse to a hyper response.
fn into_hyper(response: HttpResponse) -> Response<Full<bytes::Bytes>> {
    let mut builder = Response::builder().status(response.status.code());

    for (key, value) in &response.headers {
        builder = builder.header(key, value);
    }

    builder
        .body(Full::new(bytes::Bytes::from(response.body)))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Full::new(bytes::Bytes::new()));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

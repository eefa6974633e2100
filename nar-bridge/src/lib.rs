use axum::http::StatusCode;
use axum::routing::head;
use axum::{routing::get, Router};
use nar_bridge_store::pathinfoservice::PathInfoService;
use std::sync::Arc;

mod cache;
mod nar;
mod narinfo;

pub use cache::{nar_hash_key, NarCache, NarCacheEntry};
pub use narinfo::{render_narinfo, RenderError, Rendered};

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    path_info_service: Arc<dyn PathInfoService>,
    nar_cache: NarCache,
}

impl AppState {
    pub fn new(path_info_service: Arc<dyn PathInfoService>, nar_cache: NarCache) -> Self {
        Self {
            path_info_service,
            nar_cache,
        }
    }
}

pub fn gen_router(priority: u64) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/nar/:nar_str", get(nar::get))
        .route("/nar/:nar_str", head(nar::head))
        .route("/:narinfo_str", get(narinfo::get))
        .route("/:narinfo_str", head(narinfo::head))
        .route("/nix-cache-info", get(move || nix_cache_info(priority)))
}

async fn root() -> &'static str {
    "Hello from nar-bridge"
}

async fn nix_cache_info(priority: u64) -> String {
    format!(
        "StoreDir: /nix/store\nWantMassQuery: 1\nPriority: {}\n",
        priority
    )
}

/// Status code and body of an error response.
/// The body never carries details, these only go to the logs.
pub(crate) type HttpError = (StatusCode, &'static str);

pub(crate) fn http_error(status: StatusCode) -> HttpError {
    let body = match status {
        StatusCode::BAD_REQUEST => "bad request",
        StatusCode::NOT_FOUND => "not found",
        StatusCode::NOT_IMPLEMENTED => "not implemented",
        _ => "internal server error",
    };
    (status, body)
}

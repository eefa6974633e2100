use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use nix_compat::nixbase32;
use tracing::{debug, instrument, warn, Span};

use crate::{
    cache::{nar_hash_key, NarCacheEntry},
    http_error, AppState, HttpError,
};

/// Looks up the NAR in the cache, populated by earlier narinfo requests.
fn lookup(nar_str: &str, state: &AppState) -> Result<NarCacheEntry, HttpError> {
    let nar_hash = parse_nar_str(nar_str)?;
    Span::current().record("nar_hash", &nar_str[0..52]);

    state.nar_cache.get(&nar_hash_key(&nar_hash)).ok_or_else(|| {
        debug!("NAR hash not in cache");
        http_error(StatusCode::NOT_FOUND)
    })
}

#[instrument(skip_all, fields(nar_hash))]
pub async fn head(
    axum::extract::Path(nar_str): axum::extract::Path<String>,
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Response, HttpError> {
    let entry = lookup(&nar_str, &state)?;

    Response::builder()
        .status(StatusCode::OK)
        .header("cache-control", "max-age=31536000, immutable")
        .header("content-length", entry.nar_size)
        .body(Body::empty())
        .map_err(|e| {
            warn!(err=%e, "unable to build response");
            http_error(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Rendering NAR contents needs access to blobs and directories, which
/// this bridge doesn't talk to. Known NARs get a 501.
#[instrument(skip_all, fields(nar_hash))]
pub async fn get(
    axum::extract::Path(nar_str): axum::extract::Path<String>,
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Response, HttpError> {
    let entry = lookup(&nar_str, &state)?;
    debug!(
        root_node=?entry.root_node,
        nar_size=entry.nar_size,
        "NAR found, but can't be streamed"
    );

    Err(http_error(StatusCode::NOT_IMPLEMENTED))
}

/// Parses a `1lq…mrd.nar` string and returns the nixbase32-decoded NAR
/// sha256 digest.
fn parse_nar_str(s: &str) -> Result<[u8; 32], HttpError> {
    if !s.is_char_boundary(52) {
        warn!("invalid string, no char boundary at 52");
        return Err(http_error(StatusCode::BAD_REQUEST));
    }

    match s.split_at(52) {
        (hash_str, ".nar") => nixbase32::decode_fixed(hash_str).map_err(|e| {
            warn!(err=%e, "invalid digest");
            http_error(StatusCode::BAD_REQUEST)
        }),
        _ => {
            warn!("invalid string");
            Err(http_error(StatusCode::BAD_REQUEST))
        }
    }
}

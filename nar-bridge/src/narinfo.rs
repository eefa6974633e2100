use axum::http::StatusCode;
use nar_bridge_store::{pathinfoservice::PathInfoService, proto::ValidatePathInfoError, Error};
use nix_compat::nixbase32;
use tracing::{debug, instrument, warn, Span};

use crate::{
    cache::{nar_hash_key, NarCache, NarCacheEntry},
    http_error, AppState, HttpError,
};

/// Everything that can go wrong rendering a narinfo, once the request
/// itself was understood.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("PathInfo not found")]
    NotFound,

    #[error("unable to get PathInfo: {0}")]
    BackendUnavailable(#[source] Error),

    #[error("PathInfo contained no NAR data")]
    IncompletePathInfo,

    #[error("invalid PathInfo: {0}")]
    Validation(#[from] ValidatePathInfoError),
}

impl RenderError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RenderError::NotFound => StatusCode::NOT_FOUND,
            RenderError::BackendUnavailable(_)
            | RenderError::IncompletePathInfo
            | RenderError::Validation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The outcome of [render_narinfo].
#[derive(Debug, PartialEq, Eq)]
pub enum Rendered {
    /// The .narinfo file contents.
    Narinfo(String),
    /// Only the existence was checked.
    ExistenceOnly,
}

/// Looks up the PathInfo for `digest`, and renders it to a .narinfo file,
/// or only confirms it exists if `head_only` is set.
///
/// On success, the root node and NAR size are put into `nar_cache` in both
/// cases, so a subsequent NAR request can find them.
pub async fn render_narinfo(
    path_info_service: &dyn PathInfoService,
    nar_cache: &NarCache,
    digest: [u8; 20],
    head_only: bool,
) -> Result<Rendered, RenderError> {
    let path_info = path_info_service
        .get(digest)
        .await
        .map_err(RenderError::BackendUnavailable)?
        .ok_or(RenderError::NotFound)?;

    let (store_path, root_node) = path_info.validate_with_node()?;

    let nar_info = path_info
        .narinfo
        .as_ref()
        .ok_or(RenderError::IncompletePathInfo)?;
    let nar_sha256: [u8; 32] = nar_info.nar_sha256[..]
        .try_into()
        .map_err(|_| RenderError::IncompletePathInfo)?;

    nar_cache.put(
        nar_hash_key(&nar_sha256),
        NarCacheEntry {
            root_node,
            nar_size: nar_info.nar_size,
        },
    );

    if head_only {
        return Ok(Rendered::ExistenceOnly);
    }

    let url = format!("nar/{}.nar", nixbase32::encode(&nar_sha256));

    let mut narinfo = path_info
        .to_narinfo(store_path)
        .ok_or(RenderError::IncompletePathInfo)?;
    narinfo.url = &url;

    Ok(Rendered::Narinfo(narinfo.to_string()))
}

fn render_error(e: RenderError) -> HttpError {
    match &e {
        RenderError::NotFound => debug!("PathInfo not found"),
        e => warn!(err=%e, "unable to render narinfo"),
    }
    http_error(e.status_code())
}

#[instrument(skip_all, fields(path_info.digest))]
pub async fn head(
    axum::extract::Path(narinfo_str): axum::extract::Path<String>,
    axum::extract::State(AppState {
        path_info_service,
        nar_cache,
    }): axum::extract::State<AppState>,
) -> Result<&'static str, HttpError> {
    let digest = parse_narinfo_str(&narinfo_str)?;
    Span::current().record("path_info.digest", &narinfo_str[0..32]);

    render_narinfo(path_info_service.as_ref(), &nar_cache, digest, true)
        .await
        .map_err(render_error)?;

    Ok("")
}

#[instrument(skip_all, fields(path_info.digest))]
pub async fn get(
    axum::extract::Path(narinfo_str): axum::extract::Path<String>,
    axum::extract::State(AppState {
        path_info_service,
        nar_cache,
    }): axum::extract::State<AppState>,
) -> Result<String, HttpError> {
    let digest = parse_narinfo_str(&narinfo_str)?;
    Span::current().record("path_info.digest", &narinfo_str[0..32]);

    match render_narinfo(path_info_service.as_ref(), &nar_cache, digest, false)
        .await
        .map_err(render_error)?
    {
        Rendered::Narinfo(s) => Ok(s),
        Rendered::ExistenceOnly => Ok(String::new()),
    }
}

/// Parses a `3mzh8lvgbynm9daj7c82k2sfsfhrsfsy.narinfo` string and returns the
/// nixbase32-decoded digest.
fn parse_narinfo_str(s: &str) -> Result<[u8; 20], HttpError> {
    if !s.is_char_boundary(32) {
        warn!("invalid string, no char boundary at 32");
        return Err(http_error(StatusCode::BAD_REQUEST));
    }

    match s.split_at(32) {
        (hash_str, ".narinfo") => nixbase32::decode_fixed(hash_str).map_err(|e| {
            warn!(err=%e, "invalid digest");
            http_error(StatusCode::BAD_REQUEST)
        }),
        _ => {
            warn!("invalid string");
            Err(http_error(StatusCode::BAD_REQUEST))
        }
    }
}

use std::{num::NonZeroUsize, sync::Arc};

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tower::ServiceExt;

use crate::{gen_router, nar_hash_key, AppState, NarCache};
use fixtures::*;
use nar_bridge_store::Error;


fn router(path_info_service: Arc<CountingPathInfoService>, nar_cache: NarCache) -> Router {
    gen_router(39).with_state(AppState::new(path_info_service, nar_cache))
}

fn nar_cache() -> NarCache {
    NarCache::new(NonZeroUsize::new(100).unwrap())
}

async fn request(
    router: Router,
    method: Method,
    uri: &str,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let resp = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn root_and_cache_info() {
    let svc = Arc::new(CountingPathInfoService::new(Ok(None)));
    let router = router(svc.clone(), nar_cache());

    let (status, _, body) = request(router.clone(), Method::GET, "/").await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("Hello from nar-bridge", body);

    let (status, _, body) = request(router, Method::GET, "/nix-cache-info").await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("StoreDir: /nix/store\nWantMassQuery: 1\nPriority: 39\n", body);

    assert_eq!(0, svc.calls());
}

#[tokio::test]
async fn get_narinfo() {
    let svc = Arc::new(CountingPathInfoService::new(Ok(Some(PATH_INFO.clone()))));
    let router = router(svc.clone(), nar_cache());

    let (status, _, body) = request(
        router,
        Method::GET,
        "/00bgd045z0d4icpbc2yyz4gx48ak44la.narinfo",
    )
    .await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!(NARINFO_STR, body);
    assert_eq!(1, svc.calls());
}

/// A HEAD on the narinfo, followed by a lookup of the NAR it points to.
/// The NAR lookup is served from the cache.
#[tokio::test]
async fn head_narinfo_then_nar() {
    let svc = Arc::new(CountingPathInfoService::new(Ok(Some(PATH_INFO.clone()))));
    let cache = nar_cache();
    let router = router(svc.clone(), cache.clone());

    let (status, _, body) = request(
        router.clone(),
        Method::HEAD,
        "/00bgd045z0d4icpbc2yyz4gx48ak44la.narinfo",
    )
    .await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("", body);
    assert_eq!(Some(cache_entry()), cache.get(&nar_hash_key(&NAR_SHA256)));

    let (status, headers, body) = request(
        router,
        Method::HEAD,
        &format!("/nar/{}.nar", NAR_SHA256_NIXBASE32),
    )
    .await;
    assert_eq!(StatusCode::OK, status);
    assert_eq!("", body);
    assert_eq!(
        NAR_SIZE.to_string(),
        headers["content-length"].to_str().unwrap()
    );
    assert_eq!(
        "max-age=31536000, immutable",
        headers["cache-control"].to_str().unwrap()
    );

    assert_eq!(1, svc.calls());
}

#[rstest]
#[case::head(Method::HEAD)]
#[case::get(Method::GET)]
#[tokio::test]
async fn nar_not_in_cache(#[case] method: Method) {
    let svc = Arc::new(CountingPathInfoService::new(Ok(Some(PATH_INFO.clone()))));
    let router = router(svc.clone(), nar_cache());

    let (status, _, _) = request(
        router,
        method,
        &format!("/nar/{}.nar", NAR_SHA256_NIXBASE32),
    )
    .await;

    assert_eq!(StatusCode::NOT_FOUND, status);
    assert_eq!(0, svc.calls());
}

#[rstest]
#[case::not_found(Ok(None), StatusCode::NOT_FOUND, "not found")]
#[case::unavailable(
    Err(Error::Unavailable("connection refused to 10.0.0.1".into())),
    StatusCode::INTERNAL_SERVER_ERROR,
    "internal server error"
)]
#[case::storage_error(
    Err(Error::StorageError("disk on fire".into())),
    StatusCode::INTERNAL_SERVER_ERROR,
    "internal server error"
)]
#[tokio::test]
async fn get_narinfo_errors(
    #[case] response: Result<Option<nar_bridge_store::proto::PathInfo>, Error>,
    #[case] exp_status: StatusCode,
    #[case] exp_body: &str,
) {
    let svc = Arc::new(CountingPathInfoService::new(response));
    let cache = nar_cache();
    let router = router(svc, cache.clone());

    let (status, _, body) = request(
        router,
        Method::GET,
        "/00bgd045z0d4icpbc2yyz4gx48ak44la.narinfo",
    )
    .await;

    assert_eq!(exp_status, status);
    assert_eq!(exp_body, body);
    assert!(cache.is_empty());
}

#[rstest]
#[case::narinfo_invalid_digest("/00bgd045z0d4icpbc2yyz4gx48ak44lu.narinfo")]
#[case::narinfo_wrong_suffix("/00bgd045z0d4icpbc2yyz4gx48ak44la.nar")]
#[case::nar_too_short("/nar/00bgd045z0d4icpbc2yyz4gx48ak44la.nar")]
#[case::nar_wrong_suffix("/nar/0c5b8vw40dy178xlpddw65q9gf1h2186jcc3p4swinwggbllv8mk.nar.xz")]
#[tokio::test]
async fn bad_request(#[case] uri: &str) {
    let svc = Arc::new(CountingPathInfoService::new(Ok(Some(PATH_INFO.clone()))));
    let router = router(svc.clone(), nar_cache());

    let (status, _, body) = request(router, Method::GET, uri).await;

    assert_eq!(StatusCode::BAD_REQUEST, status);
    assert_eq!("bad request", body);
    assert_eq!(0, svc.calls());
}

/// Archive bytes aren't served, a hit on GET says so instead of sending
/// an empty body with a non-zero content-length.
#[tokio::test]
async fn get_nar_cached() {
    let svc = Arc::new(CountingPathInfoService::new(Ok(Some(PATH_INFO.clone()))));
    let cache = nar_cache();
    cache.put(nar_hash_key(&NAR_SHA256), cache_entry());
    let router = router(svc.clone(), cache);

    let (status, _, body) = request(
        router,
        Method::GET,
        &format!("/nar/{}.nar", NAR_SHA256_NIXBASE32),
    )
    .await;

    assert_eq!(StatusCode::NOT_IMPLEMENTED, status);
    assert_eq!("not implemented", body);
    assert_eq!(0, svc.calls());
}

use super::PathInfoService;
use crate::{proto::PathInfo, Error};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tonic::async_trait;
use tracing::instrument;

/// Keeps PathInfo in a map, keyed by the digest of their store path.
/// Only useful for testing, and for running the bridge without a backend.
#[derive(Default, Clone)]
pub struct MemoryPathInfoService {
    db: Arc<RwLock<HashMap<[u8; 20], PathInfo>>>,
}

impl MemoryPathInfoService {
    /// Validates and inserts a PathInfo, overwriting any existing entry for
    /// the same store path.
    #[instrument(level = "trace", skip_all)]
    pub async fn put(&self, path_info: PathInfo) -> Result<PathInfo, Error> {
        let store_path = path_info
            .validate()
            .map_err(|e| Error::InvalidRequest(format!("failed to validate PathInfo: {}", e)))?;

        self.db
            .write()
            .await
            .insert(*store_path.digest(), path_info.clone());

        Ok(path_info)
    }
}

#[async_trait]
impl PathInfoService for MemoryPathInfoService {
    #[instrument(level = "trace", skip_all)]
    async fn get(&self, digest: [u8; 20]) -> Result<Option<PathInfo>, Error> {
        Ok(self.db.read().await.get(&digest).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryPathInfoService;
    use crate::pathinfoservice::PathInfoService;
    use crate::proto::PathInfo;
    use crate::tests::fixtures::{DUMMY_PATH_DIGEST, PATH_INFO_WITH_NARINFO};
    use crate::Error;

    #[tokio::test]
    async fn not_found() {
        let svc = MemoryPathInfoService::default();
        assert_eq!(None, svc.get(DUMMY_PATH_DIGEST).await.expect("must succeed"));
    }

    #[tokio::test]
    async fn put_get() {
        let svc = MemoryPathInfoService::default();
        svc.put(PATH_INFO_WITH_NARINFO.clone())
            .await
            .expect("must succeed");

        assert_eq!(
            Some(PATH_INFO_WITH_NARINFO.clone()),
            svc.get(DUMMY_PATH_DIGEST).await.expect("must succeed")
        );
    }

    #[tokio::test]
    async fn put_invalid() {
        let svc = MemoryPathInfoService::default();
        let err = svc
            .put(PathInfo::default())
            .await
            .expect_err("must fail");

        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}

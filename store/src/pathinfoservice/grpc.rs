use super::PathInfoService;
use crate::{
    proto::{self, PathInfo},
    Error,
};
use nix_compat::nixbase32;
use tonic::async_trait;
use tracing::{instrument, warn};

/// Connects to a (remote) tvix-store PathInfoService over gRPC.
#[derive(Clone)]
pub struct GRPCPathInfoService<T>
where
    T: Clone,
{
    /// The internal reference to a gRPC client.
    /// Cloning it is cheap, and it internally handles concurrent requests.
    grpc_client: proto::path_info_service_client::PathInfoServiceClient<T>,
}

impl<T> GRPCPathInfoService<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody> + Clone,
{
    /// construct a [GRPCPathInfoService] from a [proto::path_info_service_client::PathInfoServiceClient].
    pub fn from_client(
        grpc_client: proto::path_info_service_client::PathInfoServiceClient<T>,
    ) -> Self {
        Self { grpc_client }
    }
}

#[async_trait]
impl<T> PathInfoService for GRPCPathInfoService<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody> + Send + Sync + Clone + 'static,
    T::ResponseBody: tonic::codegen::Body<Data = tonic::codegen::Bytes> + Send + 'static,
    <T::ResponseBody as tonic::codegen::Body>::Error: Into<tonic::codegen::StdError> + Send,
    T::Future: Send,
{
    #[instrument(level = "trace", skip_all, fields(path_info.digest = nixbase32::encode(&digest)))]
    async fn get(&self, digest: [u8; 20]) -> Result<Option<PathInfo>, Error> {
        let path_info = self
            .grpc_client
            .clone()
            .get(proto::GetPathInfoRequest {
                by_what: Some(proto::get_path_info_request::ByWhat::ByOutputHash(
                    digest.to_vec().into(),
                )),
            })
            .await;

        match path_info {
            Ok(path_info) => Ok(Some(path_info.into_inner())),
            Err(status) => match Error::from_status(&status) {
                None => Ok(None),
                Some(e) => {
                    warn!(code = %status.code(), "backend returned error");
                    Err(e)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GRPCPathInfoService;
    use crate::pathinfoservice::PathInfoService;
    use crate::proto::path_info_service_client::PathInfoServiceClient;
    use crate::tests::fixtures::DUMMY_PATH_DIGEST;

    /// Nothing listens on the socket, so the lookup must fail, and must not
    /// be mistaken for a missing entry.
    #[tokio::test]
    async fn unreachable_backend() {
        let url = url::Url::parse("grpc+unix:///nonexistent/nar-bridge-test.sock").unwrap();
        let channel = crate::tonic::channel_from_url(&url)
            .await
            .expect("lazy channel construction must succeed");

        let svc = GRPCPathInfoService::from_client(PathInfoServiceClient::new(channel));

        svc.get(DUMMY_PATH_DIGEST)
            .await
            .expect_err("must fail");
    }
}

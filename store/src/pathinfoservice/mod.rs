mod from_addr;
mod grpc;
mod memory;

use tonic::async_trait;

use crate::proto::PathInfo;
use crate::Error;

pub use self::from_addr::from_addr;
pub use self::grpc::GRPCPathInfoService;
pub use self::memory::MemoryPathInfoService;

/// The base trait all PathInfo services need to implement.
///
/// The bridge only ever reads, so there's no `put` here. Implementations
/// return the PathInfo as received, validation is up to the caller.
#[async_trait]
pub trait PathInfoService: Send + Sync {
    /// Retrieve a PathInfo message by the output digest.
    /// A missing entry is `Ok(None)`, not an error.
    async fn get(&self, digest: [u8; 20]) -> Result<Option<PathInfo>, Error>;
}

#![allow(clippy::derive_partial_eq_without_eq, non_snake_case)]
// https://github.com/hyperium/tonic/issues/1056
use bytes::Bytes;
use nix_compat::{
    narinfo::{NarInfo as NixNarInfo, Signature},
    nixbase32,
    store_path::{self, DIGEST_SIZE},
};
use thiserror::Error;

use crate::Node;

pub mod castore;

pub use castore::NodeError;


/// PathInfo shows information about a Nix Store Path.
/// That's a single element inside /nix/store.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PathInfo {
    /// The path can be a directory, file or symlink.
    #[prost(message, optional, tag = "1")]
    pub node: ::core::option::Option<castore::Node>,
    /// List of references (output path hashes)
    /// This really is the raw *bytes*, after decoding nixbase32, and not a
    /// base32-encoded string.
    #[prost(bytes = "bytes", repeated, tag = "2")]
    pub references: ::prost::alloc::vec::Vec<Bytes>,
    /// see below.
    #[prost(message, optional, tag = "3")]
    pub narinfo: ::core::option::Option<NarInfo>,
    /// The StorePath of the .drv file producing this output.
    /// The .drv suffix is omitted in its name field.
    #[prost(message, optional, tag = "4")]
    pub deriver: ::core::option::Option<StorePath>,
}

/// Represents a path in the Nix store (a direct child of STORE_DIR).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StorePath {
    /// The string after digest and `-`.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// The digest (20 bytes).
    #[prost(bytes = "bytes", tag = "2")]
    pub digest: Bytes,
}

/// Nix C++ uses NAR (Nix Archive) as a format to transfer store paths,
/// and stores metadata and signatures in NARInfo files.
/// This message holds the fields of those files that can't be derived from
/// the castore node alone.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NarInfo {
    /// This size of the NAR, in bytes.
    #[prost(uint64, tag = "1")]
    pub nar_size: u64,
    /// The sha256 of the NAR file representation.
    #[prost(bytes = "bytes", tag = "2")]
    pub nar_sha256: Bytes,
    /// The signatures in a .narinfo file.
    #[prost(message, repeated, tag = "3")]
    pub signatures: ::prost::alloc::vec::Vec<nar_info::Signature>,
    /// A list of references. To validate .narinfo signatures, a fingerprint
    /// needs to be constructed.
    /// This fingerprint doesn't just contain the hashes of the output paths of
    /// all references (like PathInfo.references), but their whole (base)names,
    /// so we need to keep them somewhere.
    #[prost(string, repeated, tag = "4")]
    pub reference_names: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

/// Nested message and enum types in `NarInfo`.
pub mod nar_info {
    /// This represents a (parsed) signature line in a .narinfo file.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Signature {
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
        #[prost(bytes = "bytes", tag = "2")]
        pub data: ::prost::bytes::Bytes,
    }
}

/// The parameters that can be used to lookup a (single) PathInfo object.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetPathInfoRequest {
    #[prost(oneof = "get_path_info_request::ByWhat", tags = "2")]
    pub by_what: ::core::option::Option<get_path_info_request::ByWhat>,
}

/// Nested message and enum types in `GetPathInfoRequest`.
pub mod get_path_info_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ByWhat {
        /// The output hash of a nix path (20 bytes).
        /// This is the nixbase32-decoded portion of a Nix output path, so to substitute
        /// /nix/store/xm35nga2g20mz5sm5l6n8v3bdm86yj83-cowsay-3.04
        /// this field would contain nixbase32dec("xm35nga2g20mz5sm5l6n8v3bdm86yj83").
        #[prost(bytes = "bytes", tag = "2")]
        ByOutputHash(::prost::bytes::Bytes),
    }
}

/// Generated client implementations.
pub mod path_info_service_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct PathInfoServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl<T> PathInfoServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        /// Return a PathInfo message matching the criteria specified in the
        /// GetPathInfoRequest message.
        pub async fn get(
            &mut self,
            request: impl tonic::IntoRequest<super::GetPathInfoRequest>,
        ) -> std::result::Result<tonic::Response<super::PathInfo>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/tvix.store.v1.PathInfoService/Get");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("tvix.store.v1.PathInfoService", "Get"));
            self.inner.unary(req, path, codec).await
        }
    }
}

/// Errors that can occur during the validation of PathInfo messages.
#[derive(Debug, Error, PartialEq)]
pub enum ValidatePathInfoError {
    /// Invalid length of a reference
    #[error("Invalid length of digest at position {}, expected {}, got {}", .0, DIGEST_SIZE, .1)]
    InvalidReferenceDigestLen(usize, usize),

    /// The nar_sha256 field in the narinfo has the wrong length.
    #[error("Invalid length of nar_sha256 digest: expected 32, got {0}")]
    InvalidNarSha256DigestLen(usize),

    /// The number of references in the narinfo.reference_names field does not match
    /// the number of references in the .references field.
    #[error("Inconsistent Number of References: {0} (references) vs {1} (narinfo)")]
    InconsistentNumberOfReferences(usize, usize),

    /// A string in narinfo.reference_names does not parse to a StorePath.
    #[error("Invalid reference name at position {0}: {1:?}: {2}")]
    InvalidNarinfoReferenceName(usize, String, store_path::Error),

    /// The digest in narinfo.reference_names[i] does not match the one in references[i].
    #[error(
        "digest in reference name at position {} does not match digest in PathInfo, expected {}, got {}",
        .0,
        nixbase32::encode(.1),
        nixbase32::encode(.2)
    )]
    InconsistentNarinfoReferenceNameDigest(usize, Bytes, [u8; DIGEST_SIZE]),

    /// No node present
    #[error("No node present")]
    NoNodePresent,

    /// A node is present, but none of its variants is set.
    #[error("Node has no variant set")]
    EmptyNode,

    /// The digest the (root) node refers to has invalid length.
    #[error("Invalid Digest length: expected {}, got {}", crate::B3_LEN, .0)]
    InvalidNodeDigestLen(usize),

    /// Invalid node name encountered.
    #[error("Failed to parse {} as StorePath: {}", String::from_utf8_lossy(.0), .1)]
    InvalidNodeName(Vec<u8>, store_path::Error),

    /// The deriver field is invalid.
    #[error("deriver field is invalid: {0}")]
    InvalidDeriverField(store_path::Error),
}

impl From<NodeError> for ValidatePathInfoError {
    fn from(value: NodeError) -> Self {
        match value {
            NodeError::EmptyNode => Self::EmptyNode,
            NodeError::InvalidDigestLen(len) => Self::InvalidNodeDigestLen(len),
        }
    }
}

impl PathInfo {
    /// validate performs some checks on the PathInfo struct,
    /// Returning either a [store_path::StorePath] of the root node, or a
    /// [ValidatePathInfoError].
    pub fn validate(&self) -> Result<store_path::StorePath, ValidatePathInfoError> {
        self.validate_with_node().map(|(store_path, _)| store_path)
    }

    /// Like [PathInfo::validate], but also hands out the root node, converted
    /// to a [Node].
    pub fn validate_with_node(
        &self,
    ) -> Result<(store_path::StorePath, Node), ValidatePathInfoError> {
        // ensure the references have the right number of bytes.
        for (i, reference) in self.references.iter().enumerate() {
            if reference.len() != DIGEST_SIZE {
                return Err(ValidatePathInfoError::InvalidReferenceDigestLen(
                    i,
                    reference.len(),
                ));
            }
        }

        // If there is a narinfo field populated…
        if let Some(narinfo) = &self.narinfo {
            // ensure the nar_sha256 digest has the correct length.
            if narinfo.nar_sha256.len() != 32 {
                return Err(ValidatePathInfoError::InvalidNarSha256DigestLen(
                    narinfo.nar_sha256.len(),
                ));
            }

            // ensure the number of references there matches PathInfo.references count.
            if narinfo.reference_names.len() != self.references.len() {
                return Err(ValidatePathInfoError::InconsistentNumberOfReferences(
                    self.references.len(),
                    narinfo.reference_names.len(),
                ));
            }

            // parse references in reference_names.
            for (i, reference_name_str) in narinfo.reference_names.iter().enumerate() {
                // ensure they parse as (non-absolute) store path
                let reference_names_store_path =
                    store_path::StorePath::from_bytes(reference_name_str.as_bytes()).map_err(
                        |err| {
                            ValidatePathInfoError::InvalidNarinfoReferenceName(
                                i,
                                reference_name_str.to_owned(),
                                err,
                            )
                        },
                    )?;

                // ensure their digest matches the one at self.references[i].
                if reference_names_store_path.digest()[..] != self.references[i][..] {
                    return Err(
                        ValidatePathInfoError::InconsistentNarinfoReferenceNameDigest(
                            i,
                            self.references[i].clone(),
                            *reference_names_store_path.digest(),
                        ),
                    );
                }
            }
        }

        // Ensure there is a (root) node present, and it properly parses to a [store_path::StorePath].
        let (name, node) = self
            .node
            .as_ref()
            .ok_or(ValidatePathInfoError::NoNodePresent)?
            .to_name_and_node()?;

        let root_nix_path = store_path::StorePath::from_bytes(name)
            .map_err(|err| ValidatePathInfoError::InvalidNodeName(name.to_vec(), err))?;

        // If the Deriver field is populated, ensure it parses to a
        // [store_path::StorePath].
        // We can't check for it to *not* end with .drv, as the .drv files produced by
        // recursive Nix end with multiple .drv suffixes, and only one is popped when
        // converting to this field.
        if let Some(deriver) = &self.deriver {
            store_path::StorePath::from_name_and_digest(deriver.name.as_bytes(), &deriver.digest)
                .map_err(ValidatePathInfoError::InvalidDeriverField)?;
        }

        Ok((root_nix_path, node))
    }

    /// With self and its store path name, this reconstructs a
    /// [nix_compat::narinfo::NarInfo].
    ///
    /// It returns `None` if the narinfo field is missing, or one of the fields
    /// can't be represented. The URL is left empty, it's up to the caller to
    /// populate it.
    pub fn to_narinfo(&self, store_path: store_path::StorePath) -> Option<NixNarInfo<'_>> {
        let narinfo = self.narinfo.as_ref()?;

        Some(NixNarInfo {
            store_path,
            nar_hash: narinfo.nar_sha256[..].try_into().ok()?,
            nar_size: narinfo.nar_size,
            references: narinfo
                .reference_names
                .iter()
                .map(|ref_name| store_path::StorePath::from_bytes(ref_name.as_bytes()).ok())
                .collect::<Option<_>>()?,
            signatures: narinfo
                .signatures
                .iter()
                .map(|sig| Signature::new(&sig.name, sig.data.to_vec()))
                .collect(),
            system: None,
            deriver: match &self.deriver {
                None => None,
                Some(deriver) => Some(
                    store_path::StorePath::from_name_and_digest(
                        deriver.name.as_bytes(),
                        &deriver.digest,
                    )
                    .ok()?,
                ),
            },
            url: "",
            compression: Some("none"),
            file_hash: None,
            file_size: None,
        })
    }
}

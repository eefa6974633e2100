//! The subset of the `tvix.castore.v1` messages a PathInfo embeds.

use bytes::Bytes;

use crate::B3_LEN;

/// A Node is either a DirectoryNode, FileNode or SymlinkNode.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Node {
    #[prost(oneof = "node::Node", tags = "1, 2, 3")]
    pub node: ::core::option::Option<node::Node>,
}

/// Nested message and enum types in `Node`.
pub mod node {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Node {
        #[prost(message, tag = "1")]
        Directory(super::DirectoryNode),
        #[prost(message, tag = "2")]
        File(super::FileNode),
        #[prost(message, tag = "3")]
        Symlink(super::SymlinkNode),
    }
}

/// A DirectoryNode represents a directory in a Directory.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DirectoryNode {
    /// The (base)name of the directory
    #[prost(bytes = "bytes", tag = "1")]
    pub name: Bytes,
    /// The blake3 hash of a Directory message, serialized in protobuf canonical form.
    #[prost(bytes = "bytes", tag = "2")]
    pub digest: Bytes,
    /// Number of child elements in the Directory referred to by `digest`.
    #[prost(uint64, tag = "3")]
    pub size: u64,
}

/// A FileNode represents a regular or executable file in a Directory.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileNode {
    /// The (base)name of the file
    #[prost(bytes = "bytes", tag = "1")]
    pub name: Bytes,
    /// The blake3 digest of the file contents
    #[prost(bytes = "bytes", tag = "2")]
    pub digest: Bytes,
    /// The file content size
    #[prost(uint64, tag = "3")]
    pub size: u64,
    /// Whether the file is executable
    #[prost(bool, tag = "4")]
    pub executable: bool,
}

/// A SymlinkNode represents a symbolic link in a Directory.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SymlinkNode {
    /// The (base)name of the symlink
    #[prost(bytes = "bytes", tag = "1")]
    pub name: Bytes,
    /// The target of the symlink.
    #[prost(bytes = "bytes", tag = "2")]
    pub target: Bytes,
}

/// Errors that occur when turning a [Node] message into a [crate::Node].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("no node variant set")]
    EmptyNode,

    #[error("invalid digest length: expected {}, got {}", B3_LEN, .0)]
    InvalidDigestLen(usize),
}

fn b3_digest(digest: &Bytes) -> Result<[u8; B3_LEN], NodeError> {
    digest[..]
        .try_into()
        .map_err(|_| NodeError::InvalidDigestLen(digest.len()))
}

impl Node {
    /// Returns the name of the node, and the node itself.
    pub fn to_name_and_node(&self) -> Result<(&Bytes, crate::Node), NodeError> {
        match self.node.as_ref().ok_or(NodeError::EmptyNode)? {
            node::Node::Directory(n) => Ok((
                &n.name,
                crate::Node::Directory {
                    digest: b3_digest(&n.digest)?,
                    size: n.size,
                },
            )),
            node::Node::File(n) => Ok((
                &n.name,
                crate::Node::File {
                    digest: b3_digest(&n.digest)?,
                    size: n.size,
                    executable: n.executable,
                },
            )),
            node::Node::Symlink(n) => Ok((
                &n.name,
                crate::Node::Symlink {
                    target: n.target.clone(),
                },
            )),
        }
    }
}

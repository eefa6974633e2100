use bytes::Bytes;

/// Length of the blake3 digests castore uses to address blobs and directories.
pub const B3_LEN: usize = 32;

/// The contents of a store path in the castore model.
///
/// Unlike its wire counterpart ([crate::proto::castore::Node]), this can't be
/// constructed without exactly one of the three kinds, and digests are known
/// to have the right length. The name is kept alongside, not inside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Directory {
        digest: [u8; B3_LEN],
        size: u64,
    },
    File {
        digest: [u8; B3_LEN],
        size: u64,
        executable: bool,
    },
    Symlink {
        target: Bytes,
    },
}

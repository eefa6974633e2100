use bytes::Bytes;
use hex_literal::hex;
use lazy_static::lazy_static;
use nix_compat::store_path::{StorePath, DIGEST_SIZE};

use crate::proto::{self, castore, nar_info};

pub const DUMMY_PATH_STR: &str = "00000000000000000000000000000000-dummy";
pub const DUMMY_PATH_DIGEST: [u8; DIGEST_SIZE] = [0; DIGEST_SIZE];

/// A reference that's not the dummy path, to tell apart digests in lists.
pub const REFERENCE_PATH_STR: &str = "00bgd045z0d4icpbc2yyz4gx48ak44la-net-tools-1.60_p20170221182432";
pub const REFERENCE_PATH_DIGEST: [u8; DIGEST_SIZE] = hex!("8a12321522fd91efbd60ebb2481af88580f61600");

pub const DUMMY_B3_DIGEST: [u8; 32] =
    hex!("af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262");
pub const NAR_SHA256: [u8; 32] =
    hex!("b3a24de97a8fdbc835b9833169501030b8977031bcb54b3b3ac13740f846ab30");

lazy_static! {
    pub static ref DUMMY_PATH: StorePath =
        StorePath::from_name_and_digest_fixed(b"dummy", DUMMY_PATH_DIGEST).unwrap();

    pub static ref CASTORE_NODE_FILE: castore::Node = castore::Node {
        node: Some(castore::node::Node::File(castore::FileNode {
            name: DUMMY_PATH_STR.into(),
            digest: Bytes::from_static(&DUMMY_B3_DIGEST),
            size: 42,
            executable: false,
        })),
    };

    /// A PathInfo with a narinfo and one reference, passing validation.
    pub static ref PATH_INFO_WITH_NARINFO: proto::PathInfo = proto::PathInfo {
        node: Some(CASTORE_NODE_FILE.clone()),
        references: vec![Bytes::from_static(&REFERENCE_PATH_DIGEST)],
        narinfo: Some(proto::NarInfo {
            nar_size: 0x7a,
            nar_sha256: Bytes::from_static(&NAR_SHA256),
            signatures: vec![nar_info::Signature {
                name: "cache.nixos.org-1".into(),
                data: Bytes::from_static(&[0x42; 64]),
            }],
            reference_names: vec![REFERENCE_PATH_STR.to_string()],
        }),
        deriver: None,
    };
}

//! Types and codecs for the parts of the Nix binary cache format the bridge
//! speaks: the nixbase32 alphabet, store paths, hash strings and `.narinfo`
//! files.

pub mod narinfo;
pub mod nixbase32;
pub mod nixhash;
pub mod store_path;

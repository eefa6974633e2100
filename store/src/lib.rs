//! Client side of the metadata service the bridge reads from: the wire
//! messages, their validation, and [pathinfoservice::PathInfoService]
//! implementations looking up PathInfo by output hash.

mod errors;
mod node;

pub mod pathinfoservice;
pub mod proto;
pub mod tonic;

pub use errors::Error;
pub use node::{Node, B3_LEN};

#[cfg(test)]
mod tests;

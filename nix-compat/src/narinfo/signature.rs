use std::fmt::{self, Display};

use data_encoding::BASE64;

/// A `Sig:` entry of a `.narinfo` file: the name of the key that produced it,
/// and the signature bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature<'a> {
    name: &'a str,
    bytes: Vec<u8>,
}

impl<'a> Signature<'a> {
    pub fn new(name: &'a str, bytes: Vec<u8>) -> Self {
        Self { name, bytes }
    }

    /// Parses a `$name:$base64signature` string.
    pub fn parse(input: &'a str) -> Result<Signature<'a>, SignatureError> {
        let (name, bytes64) = input
            .split_once(':')
            .ok_or(SignatureError::MissingSeparator)?;

        if name.is_empty() {
            return Err(SignatureError::MissingName);
        }

        let bytes = BASE64
            .decode(bytes64.as_bytes())
            .map_err(|_| SignatureError::DecodeError(input.to_string()))?;

        Ok(Signature { name, bytes })
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Missing separator")]
    MissingSeparator,
    #[error("Missing key name")]
    MissingName,
    #[error("Unable to base64-decode signature: {0}")]
    DecodeError(String),
}

impl Display for Signature<'_> {
    fn fmt(&self, w: &mut fmt::Formatter) -> fmt::Result {
        write!(w, "{}:{}", self.name, BASE64.encode(&self.bytes))
    }
}

//! Hash strings in the `$algo:$digest` form Nix uses in `.narinfo` files,
//! for example `sha256:1b4sb93wp679q4zx9k1ignby1yna3z7c4c2ri3wphylbc2dwsys0`.

use crate::nixbase32;
use data_encoding::HEXLOWER;
use std::fmt::{self, Display};

/// The hash algorithms a [NixHash] can be made of.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HashAlgo {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgo {
    /// Returns the number of bytes in a digest produced by this algo.
    pub const fn digest_length(&self) -> usize {
        match self {
            HashAlgo::Md5 => 16,
            HashAlgo::Sha1 => 20,
            HashAlgo::Sha256 => 32,
            HashAlgo::Sha512 => 64,
        }
    }
}

impl Display for HashAlgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashAlgo::Md5 => "md5",
            HashAlgo::Sha1 => "sha1",
            HashAlgo::Sha256 => "sha256",
            HashAlgo::Sha512 => "sha512",
        })
    }
}

impl TryFrom<&str> for HashAlgo {
    type Error = Error;

    fn try_from(algo_str: &str) -> Result<Self, Self::Error> {
        match algo_str {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(Error::InvalidAlgo(algo_str.to_string())),
        }
    }
}

/// NixHash represents hashes known by Nix.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum NixHash {
    Md5([u8; 16]),
    Sha1([u8; 20]),
    Sha256([u8; 32]),
    Sha512(Box<[u8; 64]>),
}

/// Errors related to NixHash construction.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid hash algo: {0}")]
    InvalidAlgo(String),
    #[error("missing ':' separator in hash string {0}")]
    MissingSeparator(String),
    #[error("invalid encoded digest length '{0}' for algo {1}")]
    InvalidEncodedDigestLength(usize, HashAlgo),
    #[error("invalid base16 encoding: {0}")]
    InvalidBase16Encoding(data_encoding::DecodeError),
    #[error("invalid base32 encoding: {0}")]
    InvalidBase32Encoding(nixbase32::Nixbase32DecodeError),
}

impl NixHash {
    /// returns the algo as [HashAlgo].
    pub fn algo(&self) -> HashAlgo {
        match self {
            NixHash::Md5(_) => HashAlgo::Md5,
            NixHash::Sha1(_) => HashAlgo::Sha1,
            NixHash::Sha256(_) => HashAlgo::Sha256,
            NixHash::Sha512(_) => HashAlgo::Sha512,
        }
    }

    /// returns the digest as variable-length byte slice.
    pub fn digest_as_bytes(&self) -> &[u8] {
        match self {
            NixHash::Md5(digest) => digest,
            NixHash::Sha1(digest) => digest,
            NixHash::Sha256(digest) => digest,
            NixHash::Sha512(digest) => digest.as_ref(),
        }
    }

    /// Constructs a [NixHash] from an algo and a digest of unchecked length.
    pub fn from_algo_and_digest(algo: HashAlgo, digest: &[u8]) -> Result<NixHash, Error> {
        let invalid_len = || Error::InvalidEncodedDigestLength(digest.len(), algo);

        Ok(match algo {
            HashAlgo::Md5 => NixHash::Md5(digest.try_into().map_err(|_| invalid_len())?),
            HashAlgo::Sha1 => NixHash::Sha1(digest.try_into().map_err(|_| invalid_len())?),
            HashAlgo::Sha256 => NixHash::Sha256(digest.try_into().map_err(|_| invalid_len())?),
            HashAlgo::Sha512 => {
                NixHash::Sha512(Box::new(digest.try_into().map_err(|_| invalid_len())?))
            }
        })
    }

    /// Parses a `$algo:$digest` string.
    ///
    /// The digest may be nixbase32 or lowercase hex, which is told apart by
    /// its length.
    pub fn from_nix_str(s: &str) -> Result<NixHash, Error> {
        let (algo_str, encoded_digest) = s
            .split_once(':')
            .ok_or_else(|| Error::MissingSeparator(s.to_string()))?;

        let algo = HashAlgo::try_from(algo_str)?;
        let digest_len = algo.digest_length();

        let digest = if encoded_digest.len() == nixbase32::encode_len(digest_len) {
            nixbase32::decode(encoded_digest.as_bytes()).map_err(Error::InvalidBase32Encoding)?
        } else if encoded_digest.len() == HEXLOWER.encode_len(digest_len) {
            HEXLOWER
                .decode(encoded_digest.as_bytes())
                .map_err(Error::InvalidBase16Encoding)?
        } else {
            return Err(Error::InvalidEncodedDigestLength(encoded_digest.len(), algo));
        };

        Self::from_algo_and_digest(algo, &digest)
    }

    /// Formats the hash as `$algo:$nixbase32digest`.
    ///
    /// This is the representation used for `NarHash` in `.narinfo` files.
    pub fn to_nix_nixbase32_string(&self) -> String {
        format!(
            "{}:{}",
            self.algo(),
            nixbase32::encode(self.digest_as_bytes())
        )
    }

    /// Formats the hash as `$algo:$hexdigest`.
    pub fn to_nix_hex_string(&self) -> String {
        format!(
            "{}:{}",
            self.algo(),
            HEXLOWER.encode(self.digest_as_bytes())
        )
    }
}

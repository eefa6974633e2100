//! NAR info files describe a store path in a traditional Nix binary cache.
//! Over the wire, they are formatted as "Key: value" pairs separated by newlines.
//!
//! It contains three kinds of information:
//! 1. the description of the store path itself
//!    * store path prefix, digest, and name
//!    * NAR hash and size
//!    * references
//! 2. authenticity information: zero or more signatures over that description
//! 3. cache-specific information
//!    * URL of the (possibly compressed) NAR, relative to the NAR info file
//!    * compression algorithm used for the NAR
//!    * hash and size of the compressed NAR
//!
//! The deriver (and its system) are carried along as informational fields.

use std::fmt::{self, Display};

use crate::{
    nixbase32,
    nixhash::{self, NixHash},
    store_path::{self, StorePath, STORE_DIR_WITH_SLASH},
};

mod signature;

pub use signature::{Signature, SignatureError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarInfo<'a> {
    /// Store path described by this [NarInfo]
    pub store_path: StorePath,
    /// SHA-256 digest of the NAR file
    pub nar_hash: [u8; 32],
    /// Size of the NAR file in bytes
    pub nar_size: u64,
    /// Store paths known to be referenced by the contents
    pub references: Vec<StorePath>,
    /// Signatures over the path fingerprint
    pub signatures: Vec<Signature<'a>>,
    /// Nix system triple of [NarInfo::deriver]
    pub system: Option<&'a str>,
    /// Store path of the derivation that produced this. The last .drv suffix is stripped.
    pub deriver: Option<StorePath>,
    /// Relative URL of the compressed NAR file
    pub url: &'a str,
    /// Compression method of the NAR file.
    /// `None` means the field is omitted, which Nix interprets as `bzip2`.
    pub compression: Option<&'a str>,
    /// SHA-256 digest of the file at `url`
    pub file_hash: Option<[u8; 32]>,
    /// Size of the file at `url` in bytes
    pub file_size: Option<u64>,
}

impl<'a> NarInfo<'a> {
    /// Parses a `.narinfo` file.
    ///
    /// Unknown fields are skipped, fields that may only occur once are
    /// rejected on their second occurrence.
    pub fn parse(input: &'a str) -> Result<Self, Error> {
        let mut store_path = None;
        let mut url = None;
        let mut compression = None;
        let mut file_hash = None;
        let mut file_size = None;
        let mut nar_hash = None;
        let mut nar_size = None;
        let mut references = None;
        let mut system = None;
        let mut deriver = None;
        let mut signatures = vec![];

        for line in input.lines() {
            if line.is_empty() {
                continue;
            }

            let (tag, val) = line
                .split_once(':')
                .ok_or_else(|| Error::InvalidLine(line.to_string()))?;
            let val = val.strip_prefix(' ').unwrap_or(val);

            match tag {
                "StorePath" => {
                    let val = StorePath::from_absolute_path(val.as_bytes())
                        .map_err(Error::InvalidStorePath)?;
                    set_once(&mut store_path, val, tag)?;
                }
                "URL" => {
                    if val.is_empty() {
                        return Err(Error::EmptyUrl);
                    }
                    set_once(&mut url, val, tag)?;
                }
                "Compression" => set_once(&mut compression, val, tag)?,
                "FileHash" => set_once(&mut file_hash, parse_sha256(val, tag)?, tag)?,
                "FileSize" => set_once(&mut file_size, parse_size(val, tag)?, tag)?,
                "NarHash" => set_once(&mut nar_hash, parse_sha256(val, tag)?, tag)?,
                "NarSize" => set_once(&mut nar_size, parse_size(val, tag)?, tag)?,
                "References" => {
                    let val = val
                        .split_whitespace()
                        .map(|s| {
                            StorePath::from_bytes(s.as_bytes())
                                .map_err(|e| Error::InvalidReference(s.to_string(), e))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    set_once(&mut references, val, tag)?;
                }
                "System" => set_once(&mut system, val, tag)?,
                "Deriver" => {
                    let val = val
                        .strip_suffix(".drv")
                        .ok_or_else(|| Error::InvalidDeriver(val.to_string()))
                        .and_then(|s| {
                            StorePath::from_bytes(s.as_bytes())
                                .map_err(|_| Error::InvalidDeriver(val.to_string()))
                        })?;
                    set_once(&mut deriver, val, tag)?;
                }
                "Sig" => signatures.push(Signature::parse(val).map_err(Error::InvalidSignature)?),
                _ => {}
            }
        }

        Ok(NarInfo {
            store_path: store_path.ok_or(Error::MissingField("StorePath"))?,
            nar_hash: nar_hash.ok_or(Error::MissingField("NarHash"))?,
            nar_size: nar_size.ok_or(Error::MissingField("NarSize"))?,
            references: references.unwrap_or_default(),
            signatures,
            system,
            deriver,
            url: url.ok_or(Error::MissingField("URL"))?,
            compression,
            file_hash,
            file_size,
        })
    }
}

fn set_once<T>(slot: &mut Option<T>, val: T, tag: &str) -> Result<(), Error> {
    if slot.replace(val).is_some() {
        return Err(Error::DuplicateField(tag.to_string()));
    }
    Ok(())
}

fn parse_sha256(val: &str, tag: &str) -> Result<[u8; 32], Error> {
    match NixHash::from_nix_str(val) {
        Ok(NixHash::Sha256(digest)) => Ok(digest),
        Ok(other) => Err(Error::UnsupportedHashAlgo(tag.to_string(), other.algo().to_string())),
        Err(e) => Err(Error::InvalidHash(tag.to_string(), e)),
    }
}

fn parse_size(val: &str, tag: &str) -> Result<u64, Error> {
    val.parse()
        .map_err(|_| Error::UnableToParseSize(tag.to_string(), val.to_string()))
}

impl Display for NarInfo<'_> {
    fn fmt(&self, w: &mut fmt::Formatter) -> fmt::Result {
        writeln!(w, "StorePath: {}{}", STORE_DIR_WITH_SLASH, self.store_path)?;
        writeln!(w, "URL: {}", self.url)?;

        if let Some(compression) = self.compression {
            writeln!(w, "Compression: {compression}")?;
        }

        if let Some(file_hash) = self.file_hash {
            writeln!(w, "FileHash: sha256:{}", nixbase32::encode(&file_hash))?;
        }

        if let Some(file_size) = self.file_size {
            writeln!(w, "FileSize: {file_size}")?;
        }

        writeln!(w, "NarHash: sha256:{}", nixbase32::encode(&self.nar_hash))?;
        writeln!(w, "NarSize: {}", self.nar_size)?;

        write!(w, "References:")?;
        if self.references.is_empty() {
            write!(w, " ")?;
        } else {
            for path in &self.references {
                write!(w, " {path}")?;
            }
        }
        writeln!(w)?;

        if let Some(deriver) = &self.deriver {
            writeln!(w, "Deriver: {deriver}.drv")?;
        }

        if let Some(system) = self.system {
            writeln!(w, "System: {system}")?;
        }

        for sig in &self.signatures {
            writeln!(w, "Sig: {sig}")?;
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid line: {0}")]
    InvalidLine(String),

    #[error("duplicate field: {0}")]
    DuplicateField(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid StorePath: {0}")]
    InvalidStorePath(store_path::Error),

    #[error("empty URL")]
    EmptyUrl,

    #[error("invalid {0}: {1}")]
    InvalidHash(String, nixhash::Error),

    #[error("unsupported hash algo in {0}: {1}")]
    UnsupportedHashAlgo(String, String),

    #[error("unable to parse {0}: {1}")]
    UnableToParseSize(String, String),

    #[error("invalid reference {0}: {1}")]
    InvalidReference(String, store_path::Error),

    #[error("invalid Deriver: {0}")]
    InvalidDeriver(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(SignatureError),
}

#[cfg(test)]
mod tests {
    use super::{Error, NarInfo, Signature};
    use crate::store_path::StorePath;
    use hex_literal::hex;
    use lazy_static::lazy_static;
    use pretty_assertions::assert_eq;

    const NAR_HASH: [u8; 32] =
        hex!("b3a24de97a8fdbc835b9833169501030b8977031bcb54b3b3ac13740f846ab30");

    const FIXTURE: &str = "StorePath: /nix/store/00bgd045z0d4icpbc2yyz4gx48ak44la-net-tools-1.60_p20170221182432
URL: nar/0c5b8vw40dy178xlpddw65q9gf1h2186jcc3p4swinwggbllv8mk.nar
Compression: none
NarHash: sha256:0c5b8vw40dy178xlpddw65q9gf1h2186jcc3p4swinwggbllv8mk
NarSize: 1234
References: 00bgd045z0d4icpbc2yyz4gx48ak44la-net-tools-1.60_p20170221182432 1y7h2dmrb7gnmkvffpmwbnqahbqmwxgn-glibc-2.38
Deriver: 1y7h2dmrb7gnmkvffpmwbnqahbqmwxgn-net-tools-1.60_p20170221182432.drv
Sig: cache.nixos.org-1:TsTTb3WGTZKphvYdBHXwo6weVILmTytUjLB+vcX89fOjjRicCHmKA4RCPMVLkj6TMJ4GMX3HPVWRdD1hkeKZBQ==
";

    lazy_static! {
        static ref STORE_PATH: StorePath =
            "00bgd045z0d4icpbc2yyz4gx48ak44la-net-tools-1.60_p20170221182432"
                .parse()
                .unwrap();
        static ref GLIBC: StorePath = "1y7h2dmrb7gnmkvffpmwbnqahbqmwxgn-glibc-2.38"
            .parse()
            .unwrap();
    }

    #[test]
    fn parse() {
        let narinfo = NarInfo::parse(FIXTURE).expect("must parse");

        assert_eq!(*STORE_PATH, narinfo.store_path);
        assert_eq!(NAR_HASH, narinfo.nar_hash);
        assert_eq!(1234, narinfo.nar_size);
        assert_eq!(vec![STORE_PATH.clone(), GLIBC.clone()], narinfo.references);
        assert_eq!(
            "net-tools-1.60_p20170221182432",
            narinfo.deriver.as_ref().expect("must be some").name()
        );
        assert_eq!(Some("none"), narinfo.compression);
        assert_eq!(
            "nar/0c5b8vw40dy178xlpddw65q9gf1h2186jcc3p4swinwggbllv8mk.nar",
            narinfo.url
        );
        assert_eq!(1, narinfo.signatures.len());
        assert_eq!("cache.nixos.org-1", narinfo.signatures[0].name());
    }

    /// Rendering a parsed narinfo must give back the input.
    #[test]
    fn render() {
        let narinfo = NarInfo::parse(FIXTURE).expect("must parse");
        assert_eq!(FIXTURE, narinfo.to_string());
    }

    #[test]
    fn render_no_references() {
        let narinfo = NarInfo {
            store_path: STORE_PATH.clone(),
            nar_hash: NAR_HASH,
            nar_size: 0,
            references: vec![],
            signatures: vec![Signature::new("test-1", vec![0; 4])],
            system: None,
            deriver: None,
            url: "nar/foo.nar",
            compression: Some("none"),
            file_hash: None,
            file_size: None,
        };

        assert_eq!(
            concat!(
                "StorePath: /nix/store/00bgd045z0d4icpbc2yyz4gx48ak44la-net-tools-1.60_p20170221182432\n",
                "URL: nar/foo.nar\n",
                "Compression: none\n",
                "NarHash: sha256:0c5b8vw40dy178xlpddw65q9gf1h2186jcc3p4swinwggbllv8mk\n",
                "NarSize: 0\n",
                "References: \n",
                "Sig: test-1:AAAAAA==\n",
            ),
            narinfo.to_string()
        );

        let parsed = NarInfo::parse(&narinfo.to_string())
            .expect("must parse")
            .references;
        assert!(parsed.is_empty());
    }

    #[test]
    fn parse_failures() {
        assert_eq!(
            Error::MissingField("NarHash"),
            NarInfo::parse(
                "StorePath: /nix/store/00bgd045z0d4icpbc2yyz4gx48ak44la-net-tools\nURL: nar/foo.nar\nNarSize: 1\n"
            )
            .expect_err("must fail")
        );

        assert_eq!(
            Error::DuplicateField("NarSize".to_string()),
            NarInfo::parse("NarSize: 1\nNarSize: 2\n").expect_err("must fail")
        );

        assert_eq!(
            Error::InvalidLine("garbage".to_string()),
            NarInfo::parse("garbage\n").expect_err("must fail")
        );
    }
}

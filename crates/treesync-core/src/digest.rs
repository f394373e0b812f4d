//! Content digest types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Algorithm used to fingerprint file contents.
///
/// Chosen once per sync run; every comparison in the run uses it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HashAlgorithm {
    /// MD5 (128-bit).
    #[default]
    Md5,
    /// CRC-32 (IEEE) checksum.
    Crc32,
    /// BLAKE3 (256-bit).
    Blake3,
}

/// A computed content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Digest {
    Md5([u8; 16]),
    Crc32(u32),
    Blake3([u8; 32]),
}

impl Digest {
    /// The algorithm that produced this digest.
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Digest::Md5(_) => HashAlgorithm::Md5,
            Digest::Crc32(_) => HashAlgorithm::Crc32,
            Digest::Blake3(_) => HashAlgorithm::Blake3,
        }
    }

    /// Get the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        match self {
            Digest::Md5(bytes) => hex(bytes),
            Digest::Crc32(sum) => format!("{sum:08x}"),
            Digest::Blake3(bytes) => hex(bytes),
        }
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm(), self.to_hex())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert_eq!("CRC32".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Crc32);
        assert_eq!("blake3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
        assert!("sha1".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_digest_hex() {
        assert_eq!(Digest::Crc32(0xab).to_hex(), "000000ab");
        assert_eq!(Digest::Md5([0xcd; 16]).to_hex().len(), 32);
        assert_eq!(Digest::Blake3([0; 32]).to_string(), format!("blake3:{}", "0".repeat(64)));
    }
}

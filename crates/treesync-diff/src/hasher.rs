//! Streaming content digests.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::Digest as _;

use treesync_core::{Digest, HashAlgorithm};

/// Read buffer size; files are never loaded whole.
const BUFFER_SIZE: usize = 64 * 1024;

/// Computes file digests with one configured algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHasher {
    algorithm: HashAlgorithm,
}

impl FileHasher {
    /// Create a hasher for `algorithm`.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest the contents of the file at `path`.
    pub fn hash_file(&self, path: &Path) -> io::Result<Digest> {
        let file = File::open(path)?;
        self.hash_reader(file)
    }

    /// Digest everything `reader` yields.
    pub fn hash_reader(&self, mut reader: impl Read) -> io::Result<Digest> {
        let mut state = State::new(self.algorithm);
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..bytes_read]);
        }

        Ok(state.finalize())
    }
}

enum State {
    Md5(md5::Md5),
    Crc32(crc32fast::Hasher),
    Blake3(Box<blake3::Hasher>),
}

impl State {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => State::Md5(md5::Md5::new()),
            HashAlgorithm::Crc32 => State::Crc32(crc32fast::Hasher::new()),
            HashAlgorithm::Blake3 => State::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            State::Md5(hasher) => hasher.update(data),
            State::Crc32(hasher) => hasher.update(data),
            State::Blake3(hasher) => {
                hasher.update(data);
            }
        }
    }

    fn finalize(self) -> Digest {
        match self {
            State::Md5(hasher) => Digest::Md5(hasher.finalize().into()),
            State::Crc32(hasher) => Digest::Crc32(hasher.finalize()),
            State::Blake3(hasher) => Digest::Blake3(*hasher.finalize().as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_known_digests() {
        let md5 = FileHasher::new(HashAlgorithm::Md5).hash_reader(&b"hi"[..]).unwrap();
        assert_eq!(md5.to_hex(), "49f68a5c8493ec2c0bf489821c21fc3b");

        let crc = FileHasher::new(HashAlgorithm::Crc32)
            .hash_reader(&b"123456789"[..])
            .unwrap();
        assert_eq!(crc, Digest::Crc32(0xcbf4_3926));

        let blake = FileHasher::new(HashAlgorithm::Blake3).hash_reader(&b""[..]).unwrap();
        assert_eq!(blake, Digest::Blake3(*blake3::hash(b"").as_bytes()));
    }

    #[test]
    fn test_hash_file_streams_large_input() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.bin");
        let data: Vec<u8> = (0..(3 * BUFFER_SIZE + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let hasher = FileHasher::new(HashAlgorithm::Blake3);
        assert_eq!(
            hasher.hash_file(&path).unwrap(),
            Digest::Blake3(*blake3::hash(&data).as_bytes())
        );
    }

    #[test]
    fn test_single_byte_change_detected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "hello world").unwrap();
        fs::write(temp.path().join("b"), "hello worle").unwrap();

        for algorithm in [HashAlgorithm::Md5, HashAlgorithm::Crc32, HashAlgorithm::Blake3] {
            let hasher = FileHasher::new(algorithm);
            assert_ne!(
                hasher.hash_file(&temp.path().join("a")).unwrap(),
                hasher.hash_file(&temp.path().join("b")).unwrap()
            );
        }
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let result = FileHasher::default().hash_file(&temp.path().join("missing"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}

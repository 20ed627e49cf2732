use crate::error::{CfResult, CodfrelError};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Hex SHA-256 of a dataset file.
///
/// Written next to every evaluation summary so results can be traced back to
/// the exact JSONL they were computed from. The file is read in chunks.
pub fn dataset_sha256<P: AsRef<Path>>(path: P) -> CfResult<String> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        CodfrelError::Config(format!("Cannot open dataset '{}': {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn fingerprints_known_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        assert_eq!(
            dataset_sha256(file.path()).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn fingerprint_spans_multiple_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let line = "{\"docstring\": \"x\", \"code\": \"y\"}\n".repeat(5000);
        file.write_all(line.as_bytes()).unwrap();
        let expected = hex::encode(Sha256::digest(line.as_bytes()));
        assert_eq!(dataset_sha256(file.path()).unwrap(), expected);
    }

    #[test]
    fn missing_dataset_is_a_config_error() {
        assert!(matches!(
            dataset_sha256("/definitely/not/here.jsonl"),
            Err(CodfrelError::Config(_))
        ));
    }
}

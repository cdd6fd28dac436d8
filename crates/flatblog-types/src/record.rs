//! JSON encoding shared by every file-backed record, and the replace
//! primitive used to rewrite records in place.

use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::TypeError;

/// Encode a record for storage.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, TypeError> {
    serde_json::to_vec(value).map_err(|e| TypeError::Serialization(e.to_string()))
}

/// Decode a stored record. Any failure means the bytes on disk are malformed.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, TypeError> {
    serde_json::from_slice(bytes).map_err(|e| TypeError::Decode(e.to_string()))
}

/// Replace the file at `path` with `bytes`.
///
/// The bytes go to a temporary sibling first, which is then renamed over
/// `path`. Readers see the old contents or the new ones, never a truncated
/// file. Temporary names start with `.tmp` and never parse as identifiers.
pub fn replace(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PostId, Stats};
    use std::fs;

    #[test]
    fn truncated_record_is_a_decode_error() {
        let bytes = encode(&Stats::zero(PostId::new(4))).unwrap();
        let err = decode::<Stats>(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, TypeError::Decode(_)));
    }

    #[test]
    fn empty_input_is_a_decode_error() {
        assert!(matches!(decode::<Stats>(b""), Err(TypeError::Decode(_))));
    }

    #[test]
    fn replace_swaps_contents_and_leaves_no_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3");
        fs::write(&path, b"a much longer original record").unwrap();

        replace(&path, b"short").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"short");

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["3".to_string()]);
    }

    #[test]
    fn replace_creates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new");
        replace(&path, b"[]").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"[]");
    }
}

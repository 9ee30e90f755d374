//! Persisted settings record.
//!
//! The record is a flat list of decimal integers, one per line: a schema
//! version first, then the 24 settings fields in `RECORD_FIELDS` order. The
//! field order is positional, so a record from a different schema version is
//! rejected outright rather than misread field-by-field.

use std::path::{Path, PathBuf};

/// Current record schema. Bump whenever a field is added, removed or moved.
pub const SCHEMA_VERSION: i32 = 1;

/// Number of settings fields in a record.
pub const FIELD_COUNT: usize = 24;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read settings record {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings record {path:?} line {line} is not an integer: '{text}'")]
    Parse {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error("settings record {path:?} has schema version {found}, expected {expected}; delete it or save again to regenerate")]
    VersionMismatch {
        path: PathBuf,
        found: i32,
        expected: i32,
    },

    #[error("settings record {path:?} has {found} fields, expected {expected}")]
    WrongFieldCount {
        path: PathBuf,
        found: usize,
        expected: usize,
    },
}

/// Load a settings record, verifying schema version and field count.
pub fn load(path: &Path) -> Result<[i32; FIELD_COUNT], StoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut values = Vec::with_capacity(FIELD_COUNT + 1);
    for (index, line) in content.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let value: i32 = text.parse().map_err(|_| StoreError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            text: text.to_string(),
        })?;
        values.push(value);
    }

    let Some((&version, fields)) = values.split_first() else {
        return Err(StoreError::WrongFieldCount {
            path: path.to_path_buf(),
            found: 0,
            expected: FIELD_COUNT,
        });
    };
    if version != SCHEMA_VERSION {
        return Err(StoreError::VersionMismatch {
            path: path.to_path_buf(),
            found: version,
            expected: SCHEMA_VERSION,
        });
    }
    if fields.len() != FIELD_COUNT {
        return Err(StoreError::WrongFieldCount {
            path: path.to_path_buf(),
            found: fields.len(),
            expected: FIELD_COUNT,
        });
    }

    let mut record = [0i32; FIELD_COUNT];
    record.copy_from_slice(fields);
    Ok(record)
}

/// Write a settings record, creating parent directories as needed.
pub fn save(path: &Path, record: &[i32; FIELD_COUNT]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let mut content = String::new();
    content.push_str(&format!("{}\n", SCHEMA_VERSION));
    for value in record {
        content.push_str(&format!("{}\n", value));
    }
    std::fs::write(path, content).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.txt");
        let record: [i32; FIELD_COUNT] = [
            1, 13, 0, 0, 70, 0, 15, 12, 0, 10, 25, 4, 0, 5, 5, 0, 400, 300, 0, 10, 0, 1, 1, 0,
        ];
        save(&path, &record).unwrap();
        assert_eq!(load(&path).unwrap(), record);
    }

    #[test]
    fn test_negative_values_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.txt");
        let mut record = [0i32; FIELD_COUNT];
        record[3] = -100;
        record[8] = -10;
        save(&path, &record).unwrap();
        assert_eq!(load(&path).unwrap(), record);
    }

    #[test]
    fn test_wrong_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.txt");
        let mut content = String::from("99\n");
        for _ in 0..FIELD_COUNT {
            content.push_str("0\n");
        }
        std::fs::write(&path, content).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionMismatch { found: 99, expected: SCHEMA_VERSION, .. }
        ));
    }

    #[test]
    fn test_short_record_rejected() {
        // A record from an older, shorter schema must not be zero-filled.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.txt");
        let mut content = format!("{}\n", SCHEMA_VERSION);
        for _ in 0..FIELD_COUNT - 4 {
            content.push_str("1\n");
        }
        std::fs::write(&path, content).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            StoreError::WrongFieldCount { found, .. } if found == FIELD_COUNT - 4
        ));
    }

    #[test]
    fn test_garbage_line_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.txt");
        std::fs::write(&path, format!("{}\n1\ntwo\n", SCHEMA_VERSION)).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load(Path::new("/nonexistent/settings.txt")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_empty_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.txt");
        std::fs::write(&path, "").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, StoreError::WrongFieldCount { found: 0, .. }));
    }
}

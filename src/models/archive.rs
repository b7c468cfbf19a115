//! Represents an archive stored in the relay's storage directory.

use chrono::Utc;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the identifier of a new archive is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveIdStrategy {
    /// Decimal nanoseconds since the Unix epoch.
    ///
    /// Two uploads landing in the same nanosecond get the same id and the
    /// later commit replaces the earlier archive.
    #[default]
    Timestamp,

    /// Random v4 UUID, hyphen-free.
    Uuid,
}

impl ArchiveIdStrategy {
    pub fn next_id(self) -> String {
        match self {
            ArchiveIdStrategy::Timestamp => {
                let now = Utc::now();
                let nanos = i128::from(now.timestamp()) * 1_000_000_000
                    + i128::from(now.timestamp_subsec_nanos());
                nanos.to_string()
            }
            ArchiveIdStrategy::Uuid => Uuid::new_v4().simple().to_string(),
        }
    }
}

/// A committed single-entry zip archive.
///
/// The filesystem is the only record of stored archives; this value exists
/// only for the request that created it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StoredArchive {
    /// Generated identifier (timestamp or UUID).
    pub id: String,

    /// Name on disk, always `<id>.zip`.
    pub file_name: String,

    /// Name of the single entry inside the archive.
    pub entry_name: String,

    /// Uncompressed size of the entry in bytes.
    pub size_bytes: u64,
}

impl StoredArchive {
    pub fn file_name_for(id: &str) -> String {
        format!("{}.zip", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ids_are_decimal_nanoseconds() {
        let id = ArchiveIdStrategy::Timestamp.next_id();
        assert!(id.chars().all(|c| c.is_ascii_digit()));
        // nanoseconds since 1970 have been 19 digits since 2001
        assert_eq!(id.len(), 19);
    }

    #[test]
    fn uuid_ids_are_simple_hex() {
        let a = ArchiveIdStrategy::Uuid.next_id();
        let b = ArchiveIdStrategy::Uuid.next_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn file_name_appends_zip_suffix() {
        assert_eq!(StoredArchive::file_name_for("123"), "123.zip");
    }
}

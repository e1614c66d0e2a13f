//! Snapshot data structures and the on-disk naming scheme.

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// `strftime` layout of the timestamp embedded in snapshot filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// What triggered a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// Written by the scheduler.
    Auto,
    /// Written by the "save now" action.
    Manual,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Auto => "Auto",
            SnapshotKind::Manual => "Manual",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Auto" => Ok(SnapshotKind::Auto),
            "Manual" => Ok(SnapshotKind::Manual),
            other => Err(format!("unknown snapshot kind: {other}")),
        }
    }
}

/// The parts encoded in a snapshot filename:
/// `{document}_{Auto|Manual}_{yyyyMMdd_HHmmss}.{extension}`.
///
/// The fixed-width timestamp makes lexical order match chronological order
/// for snapshots of the same document and kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotName {
    pub document: String,
    pub kind: SnapshotKind,
    /// Local wall-clock time, truncated to whole seconds.
    pub timestamp: NaiveDateTime,
    /// Extension without the leading dot; may be empty.
    pub extension: String,
}

impl SnapshotName {
    pub fn new(
        document: impl Into<String>,
        kind: SnapshotKind,
        at: DateTime<Local>,
        extension: impl Into<String>,
    ) -> Self {
        let timestamp = at.naive_local();
        Self {
            document: document.into(),
            kind,
            // Drop sub-second precision so the struct matches its filename.
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            extension: extension.into(),
        }
    }

    /// Render the filename.
    pub fn file_name(&self) -> String {
        let stem = format!(
            "{}_{}_{}",
            self.document,
            self.kind,
            self.timestamp.format(TIMESTAMP_FORMAT)
        );
        if self.extension.is_empty() {
            stem
        } else {
            format!("{stem}.{}", self.extension)
        }
    }

    /// Parse a filename produced by [`SnapshotName::file_name`].
    ///
    /// Document names may contain underscores and dots; the kind and timestamp
    /// are taken from the end of the stem. Returns `None` for foreign files.
    pub fn parse(file_name: &str) -> Option<Self> {
        let (stem, extension) = split_extension(file_name);

        let mut parts = stem.rsplitn(4, '_');
        let time = parts.next()?;
        let date = parts.next()?;
        let kind = parts.next()?.parse().ok()?;
        let document = parts.next()?;
        if document.is_empty() {
            return None;
        }

        let timestamp =
            NaiveDateTime::parse_from_str(&format!("{date}_{time}"), TIMESTAMP_FORMAT).ok()?;

        Some(Self {
            document: document.to_string(),
            kind,
            timestamp,
            extension: extension.to_string(),
        })
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Split `name.ext` into `("name", "ext")`. A leading dot is not an extension.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(idx) => (&file_name[..idx], &file_name[idx + 1..]),
    }
}

/// A snapshot that was written to the managed directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Final location of the snapshot.
    pub path: PathBuf,
    pub name: SnapshotName,
    /// When the snapshot was requested.
    pub created_at: DateTime<Local>,
}

impl Snapshot {
    pub fn kind(&self) -> SnapshotKind {
        self.name.kind
    }

    pub fn file_name(&self) -> String {
        self.name.file_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(h, m, s, 750)
            .unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    #[test]
    fn test_file_name_layout() {
        let name = SnapshotName::new("Level1", SnapshotKind::Auto, at(9, 5, 7), "unity");
        assert_eq!(name.file_name(), "Level1_Auto_20240301_090507.unity");

        let manual = SnapshotName::new("Level1", SnapshotKind::Manual, at(23, 59, 59), "unity");
        assert_eq!(manual.file_name(), "Level1_Manual_20240301_235959.unity");
    }

    #[test]
    fn test_file_name_without_extension() {
        let name = SnapshotName::new("notes", SnapshotKind::Auto, at(1, 2, 3), "");
        assert_eq!(name.file_name(), "notes_Auto_20240301_010203");
    }

    #[test]
    fn test_parse_roundtrip_truncates_subseconds() {
        let name = SnapshotName::new("Level1", SnapshotKind::Manual, at(12, 0, 0), "unity");
        let parsed = SnapshotName::parse(&name.file_name()).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_parse_document_with_underscores_and_dots() {
        let parsed = SnapshotName::parse("Boss_Room.v2_Auto_20240301_120000.unity").unwrap();
        assert_eq!(parsed.document, "Boss_Room.v2");
        assert_eq!(parsed.kind, SnapshotKind::Auto);
        assert_eq!(parsed.extension, "unity");
    }

    #[test]
    fn test_parse_rejects_foreign_files() {
        assert!(SnapshotName::parse("Level1.unity").is_none());
        assert!(SnapshotName::parse("Level1_Backup_20240301_120000.unity").is_none());
        assert!(SnapshotName::parse("Level1_Auto_2024_120000.unity").is_none());
        assert!(SnapshotName::parse("_Auto_20240301_120000.unity").is_none());
    }

    #[test]
    fn test_lexical_order_matches_time_order() {
        let times = [at(9, 59, 59), at(10, 0, 0), at(10, 0, 1), at(21, 0, 0)];
        let names: Vec<String> = times
            .iter()
            .map(|t| SnapshotName::new("Level1", SnapshotKind::Auto, *t, "unity").file_name())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, names);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("Auto".parse::<SnapshotKind>(), Ok(SnapshotKind::Auto));
        assert_eq!("Manual".parse::<SnapshotKind>(), Ok(SnapshotKind::Manual));
        assert!("auto".parse::<SnapshotKind>().is_err());
    }
}

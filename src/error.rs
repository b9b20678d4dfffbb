use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file unreadable {}: {reason}", .path.display())]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("row rejected: {0}")]
    RowRejected(RejectReason),

    #[error("row schema invalid: field `{field}` has value {value:?}")]
    SchemaInvalid { field: &'static str, value: String },

    #[error("no valid team records after processing {files} file(s)")]
    BatchEmpty { files: usize },
}

impl IngestError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::FileUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingField(&'static str),
    UnmappedLeague { team: String, competition: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingField(field) => write!(f, "missing required field `{field}`"),
            RejectReason::UnmappedLeague { team, competition } => {
                write!(f, "no league mapping for {competition:?} (team {team:?})")
            }
        }
    }
}

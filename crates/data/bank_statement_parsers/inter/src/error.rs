use thiserror::Error;

pub type Result<T> = std::result::Result<T, NoteError>;

#[derive(Debug, Error, PartialEq)]
pub enum NoteError {
    /// The sheet does not have the layout of a settlement note.
    #[error("document does not match the note layout: {0}")]
    Structural(String),

    /// A line item passed admission but a cell could not be read.
    #[error("row {}: invalid {column} value {value:?}", .row + 1)]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("invalid {field} value {value:?}")]
    Metadata { field: &'static str, value: String },
}

impl NoteError {
    pub(crate) fn parse(row: usize, column: &str, value: impl Into<String>) -> Self {
        NoteError::Parse {
            row,
            column: column.to_string(),
            value: value.into(),
        }
    }
}

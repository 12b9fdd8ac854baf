use thiserror::Error;

use crate::schema::model::{MAX_ELEMENTS, MAX_PATH_DEPTH};

/// Fatal schema errors. Range-syntax misses are deliberately not in here:
/// an unrecognized range normalizes to `Range::None` instead of aborting.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("element '{name}' has an unparseable id '{text}'")]
    BadId { name: String, text: String },
    #[error("element '{name}' has an unknown type '{text}'")]
    UnknownType { name: String, text: String },
    #[error("malformed element path '{text}'")]
    PathSyntax { text: String },
    #[error("element path '{text}' exceeds the maximum depth of {MAX_PATH_DEPTH}")]
    PathTooDeep { text: String },
    #[error("element table is full ({MAX_ELEMENTS} definitions)")]
    TableFull,
}

pub type Result<T> = std::result::Result<T, SchemaError>;

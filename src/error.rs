// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::path::PathBuf;

/// Represents errors that can occur in the storage engine
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Tried to create a store file that already exists
    StoreExists(PathBuf),

    /// Tried to open a store file that does not exist
    StoreMissing(PathBuf),

    /// A record did not fit into a page, even a freshly allocated one
    NoRoom(String),

    /// Stored bytes could not be decoded as a row
    CorruptRow(String),

    /// A row's encoded form exceeds what a page can hold
    TooBig(String),

    /// A row is missing one of the relation's declared columns
    MissingColumn(String),

    /// A referenced column does not exist
    UnknownColumn(String),

    /// Catalog natural-key uniqueness violation
    Duplicate(String),

    /// String is not usable as a SQL identifier
    UnacceptableIdentifier(String),

    /// Data type outside INT, TEXT and BOOLEAN
    UnacceptableDataType(String),

    /// Operation is not implemented
    Unimplemented(&'static str),

    /// Statement-level execution failure
    Sql(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::StoreExists(path) => write!(f, "store file already exists: {}", path.display()),
            Self::StoreMissing(path) => write!(f, "store file missing: {}", path.display()),
            Self::Unimplemented(what) => write!(f, "not implemented: {what}"),
            Self::NoRoom(msg)
            | Self::CorruptRow(msg)
            | Self::TooBig(msg)
            | Self::MissingColumn(msg)
            | Self::UnknownColumn(msg)
            | Self::Duplicate(msg)
            | Self::UnacceptableIdentifier(msg)
            | Self::UnacceptableDataType(msg)
            | Self::Sql(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Storage engine result
pub type Result<T> = std::result::Result<T, Error>;

//! Compound File Binary (OLE2) container access.
//!
//! Legacy HWP documents are compound files: a small FAT-based file system
//! holding the `FileHeader`, `DocInfo`, `BodyText/Section{N}` and `BinData`
//! streams. This module resolves stream paths to their bytes and reads the
//! summary property set.

/// Constants for the compound file format
pub mod consts;

/// Compound file reader
mod file;

/// Summary information property sets
mod metadata;

/// In-memory compound file writer for fixtures
#[cfg(test)]
pub(crate) mod builder;

// Re-export public types for convenient access
pub use file::{CompoundFile, DirectoryEntry, OleError, is_ole_file};
pub use metadata::{OleMetadata, PropertyValue, filetime_to_datetime, parse_property_stream};

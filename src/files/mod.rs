//! Filesystem operations confined to the sandbox root.
//!
//! Every operation goes through [`Sandbox::resolve`] first; nothing here
//! ever touches a client path directly.

pub mod listing;
pub mod read;
pub mod write;

use crate::sandbox::Sandbox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest file the preview endpoint will return inline.
pub const MAX_PREVIEW_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FileOps {
    sandbox: Sandbox,
}

impl FileOps {
    pub fn new(root: PathBuf) -> Self {
        Self { sandbox: Sandbox::new(root) }
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl DirectoryEntry {
    /// Placeholder for a child whose metadata could not be read (broken
    /// symlink, permission denied). It still shows up in the listing.
    pub fn unreadable(name: String, is_directory: bool) -> Self {
        Self { name, is_directory, size: 0, modified: Utc::now() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub content: String,
    pub size: u64,
}

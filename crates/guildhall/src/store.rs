//! On-disk layout of the dataset:
//!
//! ```text
//! <root>/members/<id>.json   one document per member
//! <root>/members.json        roster
//! <root>/wards.json          distinct wards
//! <root>/committees.json     distinct committees
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::MemberDocument;

pub const MEMBERS_FILE: &str = "members.json";
pub const WARDS_FILE: &str = "wards.json";
pub const COMMITTEES_FILE: &str = "committees.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Member documents read back from disk, plus the files that could not be
/// read.
#[derive(Debug, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<MemberDocument>,
    pub rejected: Vec<(PathBuf, StoreError)>,
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn members_dir(&self) -> PathBuf {
        self.root.join("members")
    }

    pub fn member_path(&self, id: u32) -> PathBuf {
        self.members_dir().join(format!("{id}.json"))
    }

    /// Replaces the member's document. The previous document stays in place
    /// until the new one is completely written.
    pub fn write_member(&self, document: &MemberDocument) -> Result<PathBuf, StoreError> {
        let path = self.member_path(document.member.id);
        write_json(&path, document)?;
        Ok(path)
    }

    pub fn read_member(&self, id: u32) -> Result<MemberDocument, StoreError> {
        read_document(&self.member_path(id))
    }

    /// Reads every `members/*.json`. Unreadable documents are reported in
    /// [`LoadedDocuments::rejected`] rather than failing the whole read; only a
    /// missing or unlistable directory is an error.
    pub fn read_members(&self) -> Result<LoadedDocuments, StoreError> {
        let dir = self.members_dir();
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut loaded = LoadedDocuments::default();
        for path in paths {
            match read_document(&path) {
                Ok(document) => loaded.documents.push(document),
                Err(e) => {
                    log::warn!("Skipping unreadable member document: {}", e);
                    loaded.rejected.push((path, e));
                }
            }
        }

        Ok(loaded)
    }

    pub fn write_summary<T: Serialize>(
        &self,
        file_name: &str,
        value: &T,
    ) -> Result<PathBuf, StoreError> {
        let path = self.root.join(file_name);
        write_json(&path, value)?;
        Ok(path)
    }
}

fn read_document(path: &Path) -> Result<MemberDocument, StoreError> {
    let raw = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| StoreError::json(path, e))
}

/// Pretty-printed JSON, written to a sibling temp file and renamed into place.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let mut json = serde_json::to_string_pretty(value).map_err(|e| StoreError::json(path, e))?;
    json.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}

//! Physician registry.
//!
//! The registry is a JSON array in a single file. Older stores hold plain strings
//! (`["Dr. A"]`); current stores hold objects (`[{"name": "Dr. A"}]`). Both are read, and
//! the file is always rewritten in the object form.
//!
//! Every add takes the registry lock for the whole read-modify-write and persists through a
//! temporary file plus rename, so concurrent adds of the same name store it once.

use crate::{write_atomic, FollowUpError, FollowUpResult};
use followup_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredPhysician {
    Name(String),
    Record { name: String },
}

impl StoredPhysician {
    fn into_name(self) -> String {
        match self {
            StoredPhysician::Name(name) | StoredPhysician::Record { name } => name,
        }
    }
}

#[derive(Serialize)]
struct PhysicianRecord<'a> {
    name: &'a str,
}

/// Result of [`PhysicianRegistry::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddPhysicianOutcome {
    /// The name was appended to the store.
    Added(NonEmptyText),
    /// A case-insensitive match was already stored; carries the stored spelling.
    AlreadyExists(NonEmptyText),
}

impl AddPhysicianOutcome {
    pub fn name(&self) -> &NonEmptyText {
        match self {
            AddPhysicianOutcome::Added(name) | AddPhysicianOutcome::AlreadyExists(name) => name,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AddPhysicianOutcome::Added(name) => format!("Physician '{name}' added."),
            AddPhysicianOutcome::AlreadyExists(name) => {
                format!("Physician '{name}' already exists.")
            }
        }
    }
}

/// File-backed list of physician names.
#[derive(Debug)]
pub struct PhysicianRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PhysicianRegistry {
    /// Opens the registry at `path`, creating an empty store (and its directory) if missing.
    ///
    /// # Errors
    ///
    /// Returns `FollowUpError::StoreWrite` if the empty store cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> FollowUpResult<Self> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(FollowUpError::StoreWrite)?;
            }
            write_atomic(&path, b"[]").map_err(FollowUpError::StoreWrite)?;
            tracing::info!("created physician store at {}", path.display());
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns all stored names in storage order.
    ///
    /// # Errors
    ///
    /// Returns `StoreRead` if the file cannot be read, or `StoreParse` if it is not a JSON
    /// array of names.
    pub fn list(&self) -> FollowUpResult<Vec<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.read_names()
    }

    /// Adds `name` unless a case-insensitive duplicate is already stored.
    ///
    /// The name is trimmed first. Existing entries are kept in order and the new name is
    /// appended.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank name, or a store error if reading or writing fails.
    pub fn add(&self, name: &str) -> FollowUpResult<AddPhysicianOutcome> {
        let name = NonEmptyText::new(name)
            .map_err(|_| FollowUpError::InvalidInput("Physician name is required.".into()))?;

        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names = self.read_names()?;

        if let Some(existing) = names.iter().find(|n| name.eq_ignore_case(n)) {
            let stored = NonEmptyText::new(existing).unwrap_or_else(|_| name.clone());
            tracing::debug!("physician already registered: {}", stored);
            return Ok(AddPhysicianOutcome::AlreadyExists(stored));
        }

        names.push(name.as_str().to_owned());
        self.write_names(&names)?;
        tracing::info!("registered physician {}", name);

        Ok(AddPhysicianOutcome::Added(name))
    }

    fn read_names(&self) -> FollowUpResult<Vec<String>> {
        let contents = fs::read_to_string(&self.path).map_err(FollowUpError::StoreRead)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        let stored: Vec<StoredPhysician> =
            serde_json::from_str(&contents).map_err(FollowUpError::StoreParse)?;
        Ok(stored.into_iter().map(StoredPhysician::into_name).collect())
    }

    fn write_names(&self, names: &[String]) -> FollowUpResult<()> {
        let records: Vec<PhysicianRecord<'_>> =
            names.iter().map(|name| PhysicianRecord { name }).collect();
        let json = serde_json::to_vec_pretty(&records).map_err(FollowUpError::Serialization)?;
        write_atomic(&self.path, &json).map_err(FollowUpError::StoreWrite)
    }
}

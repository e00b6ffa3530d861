//! Versioned instruction records.
//!
//! Packages leave instructions behind for the deployment that will later
//! assemble them, e.g. "this file must end up owned by root". The records
//! are one JSON file per package/role under `.braid/instructions/`, with an
//! explicit schema version so a newer tree is rejected rather than
//! misread.

use std::fs;
use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use braid_domain::{
    tags, DomainPart, KindPart, Label, LabelKind, NamePart, RolePart, TagPart,
};

use crate::error::PersistenceError;
use crate::store::{domain_root, STATE_DIR};

/// Schema version written into every record.
pub const INSTRUCTIONS_VERSION: u32 = 1;

const INSTRUCTIONS_DIR: &str = "instructions";
const NO_ROLE_LEAF: &str = "_default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Char,
    Block,
}

/// One thing the deployment must do on the package's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    Chown {
        filespec: String,
        user: Option<String>,
        group: Option<String>,
    },
    Chmod {
        filespec: String,
        mode: String,
    },
    Mknod {
        path: String,
        kind: DeviceKind,
        major: u32,
        minor: u32,
        mode: String,
        uid: u32,
        gid: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionFile {
    pub version: u32,
    pub instructions: Vec<Instruction>,
}

impl InstructionFile {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        InstructionFile {
            version: INSTRUCTIONS_VERSION,
            instructions,
        }
    }
}

pub struct InstructionStore {
    root: Utf8PathBuf,
}

impl InstructionStore {
    pub fn new(root: impl AsRef<Utf8Path>) -> Self {
        InstructionStore {
            root: root.as_ref().to_owned(),
        }
    }

    /// Where this package label's record lives. The tag plays no part in
    /// the path; the leaf is the role, or `_default` when there is none.
    pub fn instruction_file_name(&self, label: &Label) -> Result<Utf8PathBuf, PersistenceError> {
        if !matches!(label.kind(), KindPart::Exact(LabelKind::Package)) {
            return Err(PersistenceError::NotAPackage(label.clone()));
        }
        let wildcard = || PersistenceError::WildcardLabel(label.clone());
        let name = match label.name() {
            NamePart::Exact(name) => name.as_str(),
            NamePart::Wildcard => return Err(wildcard()),
        };
        let leaf = match label.role() {
            RolePart::None => format!("{NO_ROLE_LEAF}.json"),
            RolePart::Exact(role) => format!("{role}.json"),
            RolePart::Wildcard => return Err(wildcard()),
        };
        let mut path = self.instruction_dir(label)?;
        path.push(name);
        path.push(leaf);
        Ok(path)
    }

    /// Persist the record for a package label, or remove it when `file` is
    /// `None`. Removing a record that was never written is a no-op.
    pub fn set_instructions(
        &self,
        label: &Label,
        file: Option<&InstructionFile>,
    ) -> Result<(), PersistenceError> {
        let path = self.instruction_file_name(label)?;
        match file {
            None => match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(%label, "instructions removed");
                    Ok(())
                }
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(source) => Err(PersistenceError::Io { path, source }),
            },
            Some(file) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                        path: parent.to_owned(),
                        source,
                    })?;
                }
                let body = serde_json::to_string_pretty(file)
                    .map_err(|source| PersistenceError::Malformed {
                        path: path.clone(),
                        source,
                    })?;
                fs::write(&path, format!("{body}\n")).map_err(|source| PersistenceError::Io {
                    path: path.clone(),
                    source,
                })?;
                debug!(%label, count = file.instructions.len(), "instructions written");
                Ok(())
            }
        }
    }

    /// Load and validate one record.
    pub fn read_instructions(path: &Utf8Path) -> Result<InstructionFile, PersistenceError> {
        let body = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_owned(),
            source,
        })?;
        let file: InstructionFile =
            serde_json::from_str(&body).map_err(|source| PersistenceError::Malformed {
                path: path.to_owned(),
                source,
            })?;
        if file.version != INSTRUCTIONS_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                path: path.to_owned(),
                found: file.version,
                supported: INSTRUCTIONS_VERSION,
            });
        }
        Ok(file)
    }

    /// Every record whose package label matches `pattern`, with the label it
    /// was recorded under (tagged `temporary`, since a record is not a build
    /// state). Ordered by label.
    pub fn scan_instructions(
        &self,
        pattern: &Label,
    ) -> Result<Vec<(Label, Utf8PathBuf)>, PersistenceError> {
        let dir = self.instruction_dir(pattern)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&dir) {
            let entry = entry.map_err(|err| PersistenceError::Io {
                path: dir.clone(),
                source: err.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(path) = Utf8Path::from_path(entry.path()) else {
                continue;
            };
            let Some(role) = path.file_name().and_then(|f| f.strip_suffix(".json")) else {
                continue;
            };
            let Some(name) = path.parent().and_then(Utf8Path::file_name) else {
                continue;
            };
            let role = if role == NO_ROLE_LEAF {
                RolePart::None
            } else {
                RolePart::Exact(role.to_string())
            };
            let Ok(label) = Label::new(
                KindPart::Exact(LabelKind::Package),
                NamePart::Exact(name.to_string()),
                role,
                TagPart::Exact(tags::TEMPORARY.to_string()),
                pattern.domain().clone(),
            ) else {
                continue;
            };
            if label.match_specificity(pattern).is_some() {
                found.push((label, path.to_owned()));
            }
        }
        found.sort();
        Ok(found)
    }

    /// Remove every record under this store's root.
    pub fn clear_all_instructions(&self) -> Result<(), PersistenceError> {
        let dir = self.root.join(STATE_DIR).join(INSTRUCTIONS_DIR);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Io { path: dir, source }),
        }
    }

    fn instruction_dir(&self, label: &Label) -> Result<Utf8PathBuf, PersistenceError> {
        let domain: &[String] = match label.domain() {
            DomainPart::None => &[],
            DomainPart::Exact(path) => path.components(),
            DomainPart::Wildcard => return Err(PersistenceError::WildcardLabel(label.clone())),
        };
        let mut path = domain_root(&self.root, domain);
        path.push(STATE_DIR);
        path.push(INSTRUCTIONS_DIR);
        Ok(path)
    }
}

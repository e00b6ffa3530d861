//! The tag/completion store.
//!
//! One marker file per asserted non-transient label, under the build tree's
//! `.braid/tags/` directory; the existence of the marker is the ground truth
//! for "this label has been built". Transient labels live in an in-memory
//! set that dies with the process.
//!
//! Concurrent invocations racing on the same markers are an unsupported
//! configuration: there is no lock, by inheritance from the original design.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use braid_domain::{DomainPart, KindPart, Label, NamePart, RolePart, TagPart};

use crate::error::PersistenceError;

/// Name of the state directory kept at the root of a build tree (and at the
/// root of each included domain's subtree).
pub const STATE_DIR: &str = ".braid";

const TAGS_DIR: &str = "tags";
const DOMAINS_DIR: &str = "domains";

/// The identity fields of a concrete label, as path-safe strings.
pub(crate) struct ConcreteParts<'a> {
    pub kind: &'static str,
    pub name: &'a str,
    pub role: Option<&'a str>,
    pub tag: &'a str,
    pub domain: &'a [String],
}

pub(crate) fn concrete_parts(label: &Label) -> Result<ConcreteParts<'_>, PersistenceError> {
    let wildcard = || PersistenceError::WildcardLabel(label.clone());
    let kind = match label.kind() {
        KindPart::Exact(kind) => kind.as_str(),
        KindPart::Wildcard => return Err(wildcard()),
    };
    let name = match label.name() {
        NamePart::Exact(name) => name.as_str(),
        NamePart::Wildcard => return Err(wildcard()),
    };
    let role = match label.role() {
        RolePart::None => None,
        RolePart::Exact(role) => Some(role.as_str()),
        RolePart::Wildcard => return Err(wildcard()),
    };
    let tag = match label.tag() {
        TagPart::Exact(tag) => tag.as_str(),
        TagPart::Wildcard => return Err(wildcard()),
    };
    let domain: &[String] = match label.domain() {
        DomainPart::None => &[],
        DomainPart::Exact(path) => path.components(),
        DomainPart::Wildcard => return Err(wildcard()),
    };
    Ok(ConcreteParts {
        kind,
        name,
        role,
        tag,
        domain,
    })
}

/// The subtree a label's state lives under: the build root itself for
/// top-level labels, `domains/<d1>/domains/<d2>/...` for domain labels.
pub(crate) fn domain_root(root: &Utf8Path, domain: &[String]) -> Utf8PathBuf {
    let mut path = root.to_owned();
    for component in domain {
        path.push(DOMAINS_DIR);
        path.push(component);
    }
    path
}

pub struct TagStore {
    root: Utf8PathBuf,
    transient: BTreeSet<Label>,
}

impl TagStore {
    /// Open (creating if needed) the state directory under `root`.
    pub fn open(root: impl AsRef<Utf8Path>) -> Result<Self, PersistenceError> {
        let root = root.as_ref().to_owned();
        let state = root.join(STATE_DIR);
        fs::create_dir_all(&state).map_err(|source| PersistenceError::Io {
            path: state.clone(),
            source,
        })?;
        Ok(TagStore {
            root,
            transient: BTreeSet::new(),
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Where the marker for this label lives. Labels are grouped by kind and
    /// name; the leaf is `<role>-<tag>`, or just `<tag>` when there is no
    /// role.
    pub fn tag_file_name(&self, label: &Label) -> Result<Utf8PathBuf, PersistenceError> {
        let parts = concrete_parts(label)?;
        let leaf = match parts.role {
            Some(role) => format!("{role}-{}", parts.tag),
            None => parts.tag.to_string(),
        };
        let mut path = domain_root(&self.root, parts.domain);
        path.push(STATE_DIR);
        path.push(TAGS_DIR);
        path.push(parts.kind);
        path.push(parts.name);
        path.push(leaf);
        Ok(path)
    }

    /// Is this label asserted?
    pub fn is_tag(&self, label: &Label) -> bool {
        if label.is_transient() {
            self.transient.contains(label)
        } else {
            self.tag_file_name(label)
                .is_ok_and(|path| path.exists())
        }
    }

    /// Assert this label. Idempotent; the marker carries the assertion time.
    pub fn set_tag(&mut self, label: &Label) -> Result<(), PersistenceError> {
        if label.is_transient() {
            self.transient.insert(label.clone());
            return Ok(());
        }
        let path = self.tag_file_name(label)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                path: parent.to_owned(),
                source,
            })?;
        }
        let stamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|source| PersistenceError::Timestamp { source })?;
        fs::write(&path, format!("{stamp}\n")).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(%label, "tag set");
        Ok(())
    }

    /// Withdraw this label's assertion. A missing marker is a no-op; any
    /// other I/O failure propagates.
    pub fn clear_tag(&mut self, label: &Label) -> Result<(), PersistenceError> {
        if label.is_transient() {
            self.transient.remove(label);
            return Ok(());
        }
        let path = self.tag_file_name(label)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(%label, "tag cleared");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> Label {
        Label::parse(text).expect(text)
    }

    fn store() -> (tempfile::TempDir, TagStore) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let store = TagStore::open(&root).unwrap();
        (dir, store)
    }

    #[test]
    fn markers_live_under_kind_and_name() {
        let (_dir, store) = store();
        let path = store.tag_file_name(&label("package:p1{r1}/built")).unwrap();
        assert!(path.ends_with(".braid/tags/package/p1/r1-built"), "{path}");
        let path = store
            .tag_file_name(&label("checkout:co1/checked_out"))
            .unwrap();
        assert!(path.ends_with(".braid/tags/checkout/co1/checked_out"), "{path}");
    }

    #[test]
    fn domain_labels_live_under_their_domain_subtree() {
        let (_dir, store) = store();
        let path = store
            .tag_file_name(&label("checkout:(outer(inner))co/checked_out"))
            .unwrap();
        assert!(
            path.ends_with("domains/outer/domains/inner/.braid/tags/checkout/co/checked_out"),
            "{path}"
        );
    }

    #[test]
    fn set_tag_is_idempotent_and_observable() {
        let (_dir, mut store) = store();
        let l = label("package:p1{r1}/built");
        assert!(!store.is_tag(&l));
        store.set_tag(&l).unwrap();
        store.set_tag(&l).unwrap();
        assert!(store.is_tag(&l));
        let contents = fs::read_to_string(store.tag_file_name(&l).unwrap()).unwrap();
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn clear_tag_tolerates_missing_markers() {
        let (_dir, mut store) = store();
        let l = label("package:p1{r1}/built");
        store.clear_tag(&l).unwrap();
        store.set_tag(&l).unwrap();
        store.clear_tag(&l).unwrap();
        assert!(!store.is_tag(&l));
    }

    #[test]
    fn transient_tags_never_touch_disk() {
        let (_dir, mut store) = store();
        let l = label("checkout:builds/up_to_date[T]");
        store.set_tag(&l).unwrap();
        assert!(store.is_tag(&l));
        assert!(!store.tag_file_name(&l).unwrap().exists());
        store.clear_tag(&l).unwrap();
        assert!(!store.is_tag(&l));
    }

    #[test]
    fn wildcard_labels_are_never_persisted() {
        let (_dir, mut store) = store();
        let err = store.set_tag(&label("package:*{r1}/built")).unwrap_err();
        assert!(matches!(err, PersistenceError::WildcardLabel(_)));
        assert!(!store.is_tag(&label("package:*{r1}/built")));
    }
}

//! Maps client-supplied logical paths onto the filesystem beneath a fixed root.
//!
//! Resolution is purely lexical: the path does not have to exist, and `..`
//! segments are collapsed before the containment check so that
//! `a/../../etc` can never slip past a prefix test on the raw string.

use crate::errors::AppError;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// `root` should already be absolute and canonical (see `config::canonical_root`).
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `logical` (forward-slash separated, relative to the root) to a
    /// physical path. Fails with `PathEscape` if the result leaves the root.
    pub fn resolve(&self, logical: &str) -> Result<PathBuf, AppError> {
        let cleaned = logical.trim_start_matches('/');
        let mut out = self.root.clone();
        for comp in Path::new(cleaned).components() {
            match comp {
                Component::Normal(seg) => out.push(seg),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !out.pop() {
                        return Err(AppError::PathEscape);
                    }
                }
                // only reachable with drive prefixes or backslash roots on windows
                Component::RootDir | Component::Prefix(_) => return Err(AppError::PathEscape),
            }
        }
        // component-wise: equal to root, or root followed by a separator
        if out.starts_with(&self.root) {
            Ok(out)
        } else {
            Err(AppError::PathEscape)
        }
    }

    pub fn is_root(&self, physical: &Path) -> bool {
        physical == self.root
    }
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::runtime_paths::UPLOADS_DIR_NAME;
use std::path::{Path, PathBuf};

pub const MAX_DIRECTORY_NAME_LEN: usize = 50;
pub const FALLBACK_DIRECTORY_NAME: &str = "untitled";
const MAX_DEDUP_ATTEMPTS: usize = 10_000;

/// Filesystem-safe slug of an entity title.
///
/// Lowercases, drops everything outside `[a-z0-9]`, whitespace and `-`, turns whitespace
/// runs into single hyphens, collapses hyphen runs, trims edge hyphens and truncates to
/// [`MAX_DIRECTORY_NAME_LEN`] characters. An empty result becomes [`FALLBACK_DIRECTORY_NAME`].
pub fn safe_directory_name(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        }
    }

    let truncated: String = slug.chars().take(MAX_DIRECTORY_NAME_LEN).collect();
    if truncated.is_empty() {
        FALLBACK_DIRECTORY_NAME.to_string()
    } else {
        truncated
    }
}

fn with_dedup_suffix(base: &str, counter: usize) -> String {
    let suffix = format!("-{}", counter);
    let room = MAX_DIRECTORY_NAME_LEN.saturating_sub(suffix.len());
    let head: String = base.chars().take(room).collect();
    format!("{}{}", head.trim_end_matches('-'), suffix)
}

/// A per-entity asset directory, addressed both relative to the asset root and absolutely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDirectory {
    name: String,
    relative: String,
    absolute: PathBuf,
}

impl AssetDirectory {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forward-slash path relative to the asset root, e.g. `uploads/projects/sunrise-heights`.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    pub fn exists(&self) -> bool {
        self.absolute.is_dir()
    }
}

/// Maps entity titles to directories under `uploads/<kind>/`.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    asset_root: PathBuf,
    kind: String,
}

impl DirectoryResolver {
    pub fn new(asset_root: impl Into<PathBuf>, kind: impl Into<String>) -> Self {
        Self {
            asset_root: asset_root.into(),
            kind: kind.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Directory for an already assigned name. Nothing is created on disk.
    pub fn directory(&self, name: &str) -> AssetDirectory {
        let relative = format!("{}/{}/{}", UPLOADS_DIR_NAME, self.kind, name);
        let absolute = self
            .asset_root
            .join(UPLOADS_DIR_NAME)
            .join(&self.kind)
            .join(name);
        AssetDirectory {
            name: name.to_string(),
            relative,
            absolute,
        }
    }

    /// Directory a legacy record without a stored name resolves to.
    pub fn for_title(&self, title: &str) -> AssetDirectory {
        self.directory(&safe_directory_name(title))
    }

    /// Picks a fresh directory for a new entity, appending `-2`, `-3`, ... while the name is
    /// claimed by another record or already present on disk.
    pub fn assign<F>(&self, title: &str, mut is_claimed: F) -> AssetDirectory
    where
        F: FnMut(&str) -> bool,
    {
        let base = safe_directory_name(title);
        let candidate = self.directory(&base);
        if !is_claimed(&base) && !candidate.exists() {
            return candidate;
        }

        for counter in 2..MAX_DEDUP_ATTEMPTS {
            let name = with_dedup_suffix(&base, counter);
            let candidate = self.directory(&name);
            if !is_claimed(&name) && !candidate.exists() {
                return candidate;
            }
        }

        let counter = (uuid::Uuid::new_v4().as_u128() % 1_000_000_000) as usize;
        let name = with_dedup_suffix(&base, counter);
        log::warn!(
            "Exhausted directory suffixes for '{}'; falling back to {}",
            base,
            name
        );
        self.directory(&name)
    }
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::batch::{UploadSource, UploadedFile};
use super::directory::AssetDirectory;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

const MAX_NAME_ATTEMPTS: u32 = 32;
const RANDOM_SUFFIX_LEN: usize = 6;

/// Filename prefixes per asset role.
pub mod prefixes {
    pub const BROCHURE: &str = "brochure";
    pub const ABOUT: &str = "about";
    pub const BANNER_DESKTOP: &str = "banner-desktop";
    pub const BANNER_MOBILE: &str = "banner-mobile";
    pub const CARD: &str = "card";
    pub const FLOOR_PLAN: &str = "floorplan";
    pub const GALLERY: &str = "project";
    pub const AMENITY: &str = "amenity";
    pub const UPDATED: &str = "updated";
}

#[derive(Debug)]
pub enum AssetError {
    MissingSource { field: String, original_name: String },
    Io { path: PathBuf, source: io::Error },
    NameExhausted { directory: String },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::MissingSource {
                field,
                original_name,
            } => write!(
                f,
                "upload '{}' in field {} has no readable content",
                original_name, field
            ),
            AssetError::Io { path, source } => {
                write!(f, "asset I/O failed at {}: {}", path.display(), source)
            }
            AssetError::NameExhausted { directory } => {
                write!(f, "could not reserve a unique file name in {}", directory)
            }
        }
    }
}

impl Error for AssetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> AssetError {
    AssetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    Missing,
    Rejected,
    Failed,
}

/// Writes uploads into asset directories and removes stored assets by relative path.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persists `file` into `dir` under a fresh `<prefix>_<millis>_<random>.<ext>` name and
    /// returns the forward-slash path relative to the asset root. The directory is created on
    /// first write.
    pub fn save(
        &self,
        mut file: UploadedFile,
        dir: &AssetDirectory,
        prefix: &str,
    ) -> Result<String, AssetError> {
        let source = file.source.take().ok_or_else(|| AssetError::MissingSource {
            field: file.field.clone(),
            original_name: file.original_name.clone(),
        })?;
        if let UploadSource::Spooled(spooled) = &source
            && !spooled.path().is_file()
        {
            return Err(AssetError::MissingSource {
                field: file.field.clone(),
                original_name: file.original_name.clone(),
            });
        }

        fs::create_dir_all(dir.absolute()).map_err(|err| io_error(dir.absolute(), err))?;

        let extension = sanitized_extension(&file.original_name);
        let (mut reserved, name) = reserve_name(dir, prefix, &extension)?;
        let target = dir.absolute().join(&name);

        let written = match source {
            UploadSource::Memory(bytes) => reserved
                .write_all(&bytes)
                .and_then(|()| reserved.sync_all())
                .map_err(|err| io_error(&target, err)),
            UploadSource::Spooled(spooled) => {
                drop(reserved);
                move_into_place(spooled.path(), &target)
            }
        };
        if let Err(err) = written {
            let _ = fs::remove_file(&target);
            return Err(err);
        }

        let relative = format!("{}/{}", dir.relative(), name);
        log::debug!(
            "Stored {} ({} bytes, {}) as {}",
            file.original_name,
            file.size_bytes,
            file.mime_type,
            relative
        );
        Ok(relative)
    }

    /// Removes a stored asset. Never fails: a missing file counts as already deleted and other
    /// errors are logged.
    pub fn delete(&self, relative: &str) -> DeleteOutcome {
        let Some(path) = self.resolve(relative) else {
            log::warn!("Refusing to delete asset outside the asset root: {}", relative);
            return DeleteOutcome::Rejected;
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted asset {}", relative);
                DeleteOutcome::Removed
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("Asset already absent: {}", relative);
                DeleteOutcome::Missing
            }
            Err(err) => {
                log::warn!("Failed to delete asset {}: {}", relative, err);
                DeleteOutcome::Failed
            }
        }
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.resolve(relative)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Best-effort removal of an asset directory that no longer holds any files.
    pub fn remove_directory_if_empty(&self, dir: &AssetDirectory) -> bool {
        match fs::remove_dir(dir.absolute()) {
            Ok(()) => {
                log::info!("Removed empty asset directory {}", dir.relative());
                true
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => {
                log::debug!(
                    "Asset directory {} kept: {}",
                    dir.relative(),
                    err
                );
                false
            }
        }
    }

    /// Maps a stored relative path (optionally with one leading `/`) onto the asset root.
    /// Absolute paths and parent traversal resolve to `None`.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let trimmed = relative.strip_prefix('/').unwrap_or(relative);
        if trimmed.is_empty() {
            return None;
        }
        let candidate = Path::new(trimmed);
        let safe = candidate
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !safe {
            return None;
        }
        Some(self.root.join(candidate))
    }
}

fn reserve_name(
    dir: &AssetDirectory,
    prefix: &str,
    extension: &str,
) -> Result<(fs::File, String), AssetError> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let name = generate_name(prefix, extension);
        let path = dir.absolute().join(&name);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => return Ok((file, name)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(io_error(&path, err)),
        }
    }
    Err(AssetError::NameExhausted {
        directory: dir.relative().to_string(),
    })
}

fn generate_name(prefix: &str, extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    let random = &random[..RANDOM_SUFFIX_LEN];
    if extension.is_empty() {
        format!("{}_{}_{}", prefix, millis, random)
    } else {
        format!("{}_{}_{}.{}", prefix, millis, random, extension)
    }
}

fn sanitized_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .map(|ext| {
            ext.to_string_lossy()
                .chars()
                .filter(|ch| ch.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .unwrap_or_default()
}

fn move_into_place(source: &Path, target: &Path) -> Result<(), AssetError> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    // Cross-device spool: copy, then drop the spool file.
    fs::copy(source, target).map_err(|err| io_error(target, err))?;
    if let Err(err) = fs::remove_file(source) {
        log::debug!("Spool file {} not removed: {}", source.display(), err);
    }
    Ok(())
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Multipart field names that carry project files.
pub mod fields {
    pub const BROCHURE: &str = "brochure";
    pub const ABOUT_US_IMAGE: &str = "aboutUsImage";
    pub const DESKTOP_BANNER: &str = "desktopBanner";
    pub const MOBILE_BANNER: &str = "mobileBanner";
    pub const CARD_IMAGE: &str = "cardImage";
    pub const FLOOR_PLAN_IMAGES: &str = "floorPlanImages";
    pub const PROJECT_IMAGE_FILES: &str = "projectImageFiles";
    pub const AMENITY_FILES: &str = "amenityFiles";
    pub const UPDATED_IMAGE_FILES: &str = "updatedImageFiles";

    pub const ALL: [&str; 9] = [
        BROCHURE,
        ABOUT_US_IMAGE,
        DESKTOP_BANNER,
        MOBILE_BANNER,
        CARD_IMAGE,
        FLOOR_PLAN_IMAGES,
        PROJECT_IMAGE_FILES,
        AMENITY_FILES,
        UPDATED_IMAGE_FILES,
    ];

    pub fn is_known(field: &str) -> bool {
        ALL.contains(&field)
    }
}

/// An upload spooled to disk. The spool file is removed on drop unless it was moved away first.
#[derive(Debug)]
pub struct SpooledFile {
    path: PathBuf,
}

impl SpooledFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Discarded unconsumed upload {}", self.path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => log::warn!(
                "Failed to discard spooled upload {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}

#[derive(Debug)]
pub enum UploadSource {
    Spooled(SpooledFile),
    Memory(Vec<u8>),
}

#[derive(Debug)]
pub struct UploadedFile {
    pub field: String,
    /// Client token from a `field[token]` part name, used for keyed correlation.
    pub correlation_key: Option<String>,
    pub original_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub source: Option<UploadSource>,
}

impl UploadedFile {
    pub fn in_memory(field: &str, original_name: &str, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            field: field.to_string(),
            correlation_key: None,
            original_name: original_name.to_string(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.to_string(),
            source: Some(UploadSource::Memory(bytes)),
        }
    }

    pub fn with_correlation_key(mut self, key: impl Into<String>) -> Self {
        self.correlation_key = Some(key.into());
        self
    }
}

/// Splits `floorPlanImages[fp-7]` into `("floorPlanImages", Some("fp-7"))`.
pub fn split_field_name(raw: &str) -> (&str, Option<&str>) {
    if let Some(open) = raw.find('[')
        && raw.ends_with(']')
    {
        let key = &raw[open + 1..raw.len() - 1];
        let key = if key.trim().is_empty() {
            None
        } else {
            Some(key)
        };
        return (&raw[..open], key);
    }
    (raw, None)
}

/// Uploaded files grouped by declared field name, each list in arrival order.
#[derive(Debug, Default)]
pub struct FileBatch {
    fields: HashMap<String, Vec<UploadedFile>>,
}

impl FileBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files(files: impl IntoIterator<Item = UploadedFile>) -> Self {
        let mut batch = Self::new();
        for file in files {
            batch.push(file);
        }
        batch
    }

    pub fn push(&mut self, file: UploadedFile) {
        self.fields.entry(file.field.clone()).or_default().push(file);
    }

    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, field: &str) -> usize {
        self.fields.get(field).map(Vec::len).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedFile> {
        self.fields.values().flatten()
    }

    /// Takes the first file of a single-valued field. Extra parts stay behind and are discarded with the batch.
    pub fn take_single(&mut self, field: &str) -> Option<UploadedFile> {
        let files = self.fields.get_mut(field)?;
        if files.is_empty() {
            return None;
        }
        Some(files.remove(0))
    }

    pub fn take_field(&mut self, field: &str) -> FieldFiles {
        FieldFiles::new(self.fields.remove(field).unwrap_or_default())
    }
}

/// Files of one list-valued field, split into keyed parts and an ordinal queue.
#[derive(Debug, Default)]
pub struct FieldFiles {
    positional: VecDeque<UploadedFile>,
    keyed: HashMap<String, UploadedFile>,
}

impl FieldFiles {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        let mut field_files = Self::default();
        for file in files {
            match file.correlation_key.clone() {
                Some(key) => {
                    if let Some(duplicate) = field_files.keyed.insert(key.clone(), file) {
                        log::warn!(
                            "Upload key '{}' used twice in field {}; keeping the later part",
                            key,
                            duplicate.field
                        );
                    }
                }
                None => field_files.positional.push_back(file),
            }
        }
        field_files
    }

    pub fn next_positional(&mut self) -> Option<UploadedFile> {
        self.positional.pop_front()
    }

    pub fn take_keyed(&mut self, key: &str) -> Option<UploadedFile> {
        self.keyed.remove(key)
    }

    pub fn remaining(&self) -> usize {
        self.positional.len() + self.keyed.len()
    }
}

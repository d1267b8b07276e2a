// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Naming and sweeping of spooled multipart parts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

pub const TEMP_UPLOAD_PREFIX: &str = ".propdesk-upload-";
pub const TEMP_UPLOAD_SUFFIX: &str = ".upload";

pub fn is_temp_upload_name(name: &str) -> bool {
    name.starts_with(TEMP_UPLOAD_PREFIX) && name.ends_with(TEMP_UPLOAD_SUFFIX)
}

pub fn temp_upload_path(incoming_dir: &Path) -> PathBuf {
    incoming_dir.join(format!(
        "{}{}{}",
        TEMP_UPLOAD_PREFIX,
        Uuid::new_v4().simple(),
        TEMP_UPLOAD_SUFFIX
    ))
}

/// Removes spool files older than `max_age`, left behind by a crashed process. Returns the count removed.
pub fn sweep_stale_uploads(incoming_dir: &Path, max_age: Duration) -> usize {
    let entries = match fs::read_dir(incoming_dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!(
                "Unable to scan upload spool {}: {}",
                incoming_dir.display(),
                err
            );
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !is_temp_upload_name(&name.to_string_lossy()) {
            continue;
        }
        let age = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if !matches!(age, Some(age) if age >= max_age) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(err) => log::warn!(
                "Failed to remove stale upload {}: {}",
                entry.path().display(),
                err
            ),
        }
    }
    removed
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory (relative to the asset root) that holds every stored upload.
pub const UPLOADS_DIR_NAME: &str = "uploads";
/// Spool directory for multipart parts that have not been bound to an entity yet.
pub const INCOMING_DIR_NAME: &str = ".incoming";

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub projects_data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub incoming_dir: PathBuf,
}

impl RuntimePaths {
    pub fn from_root(root: &Path) -> Result<Self, ConfigError> {
        let root_path = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        };

        ensure_dir_exists(&root_path)?;
        let root_canonical = root_path.canonicalize().map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to canonicalize runtime root '{}': {}",
                root_path.display(),
                e
            ))
        })?;

        let config_file = root_canonical.join("config.yaml");
        let data_dir = root_canonical.join("data");
        let projects_data_dir = data_dir.join("projects");
        let uploads_dir = root_canonical.join(UPLOADS_DIR_NAME);
        let incoming_dir = uploads_dir.join(INCOMING_DIR_NAME);

        ensure_dir_exists(&data_dir)?;
        ensure_dir_exists(&projects_data_dir)?;
        ensure_dir_exists(&uploads_dir)?;
        ensure_dir_exists(&incoming_dir)?;

        Ok(Self {
            root: root_canonical,
            config_file,
            data_dir,
            projects_data_dir,
            uploads_dir,
            incoming_dir,
        })
    }

    /// Root that stored relative asset paths (`uploads/...`) resolve against.
    pub fn asset_root(&self) -> &Path {
        &self.root
    }
}

fn ensure_dir_exists(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to create directory '{}': {}",
                path.display(),
                e
            ))
        })?;
    }

    ensure_dir_writable(path, "Directory must be writable")
}

fn ensure_dir_writable(path: &Path, context: &str) -> Result<(), ConfigError> {
    if !path.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "{} (not a directory): {}",
            context,
            path.display()
        )));
    }

    let check_path = path.join(format!(".propdesk-write-check-{}", Uuid::new_v4()));
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&check_path)
    {
        Ok(_) => fs::remove_file(&check_path).map_err(|err| {
            ConfigError::ValidationError(format!(
                "{} (unable to clean write-check file {}): {}",
                context,
                check_path.display(),
                err
            ))
        }),
        Err(err) => Err(ConfigError::ValidationError(format!(
            "{} ({}): {}",
            context,
            path.display(),
            err
        ))),
    }
}

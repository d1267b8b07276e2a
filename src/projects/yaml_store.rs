// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! One YAML document per project under `data/projects/`, replaced atomically on every commit.

use super::model::{Project, ProjectId};
use super::repository::{
    ProjectRepository, ProjectTable, RepositoryError, SaveOptions, lock_table,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const MAX_TEMP_ATTEMPTS: u32 = 100;
const RECORD_EXTENSION: &str = "yaml";

pub fn read_yaml_file<T: DeserializeOwned>(
    path: &Path,
    label: &str,
) -> Result<Option<T>, RepositoryError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|err| {
        RepositoryError::Storage(format!("Failed to read {} {}: {}", label, path.display(), err))
    })?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str(&content).map(Some).map_err(|err| {
        RepositoryError::Storage(format!("Failed to parse {} {}: {}", label, path.display(), err))
    })
}

/// Serializes `value` to a sibling temp file, syncs it and renames it over `path`.
pub fn write_yaml_file<T: Serialize>(
    path: &Path,
    label: &str,
    value: &T,
) -> Result<(), RepositoryError> {
    let content = serde_yaml::to_string(value)
        .map_err(|err| RepositoryError::Storage(format!("Failed to serialize {}: {}", label, err)))?;
    let parent = path.parent().ok_or_else(|| {
        RepositoryError::Storage(format!("{} path has no parent directory", label))
    })?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| RepositoryError::Storage(format!("{} path has no file name", label)))?;
    let (mut file, temp_path) = create_temp_file(parent, file_name, label)?;

    let written = file
        .write_all(content.as_bytes())
        .and_then(|()| file.sync_all());
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(RepositoryError::Storage(format!(
            "Failed to write {} temp file: {}",
            label, err
        )));
    }
    drop(file);

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(RepositoryError::Storage(format!(
            "Failed to replace {} file: {}",
            label, err
        )));
    }

    #[cfg(unix)]
    {
        if let Err(err) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            log::warn!("{} directory sync failed: {}", label, err);
        }
    }

    Ok(())
}

fn create_temp_file(
    parent: &Path,
    file_name: &str,
    label: &str,
) -> Result<(fs::File, PathBuf), RepositoryError> {
    for attempt in 0..MAX_TEMP_ATTEMPTS {
        let temp_path = parent.join(format!(".{}.tmp.{}.{}", file_name, std::process::id(), attempt));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((file, temp_path)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(RepositoryError::Storage(format!(
                    "Failed to create temp {} file: {}",
                    label, err
                )));
            }
        }
    }
    Err(RepositoryError::Storage(format!(
        "Failed to create temp {} file after multiple attempts",
        label
    )))
}

/// File-backed repository. All records are cached; the lock is held across each disk write so
/// version checks and commits are serialized.
pub struct YamlProjectRepository {
    dir: PathBuf,
    table: Mutex<ProjectTable>,
}

impl YamlProjectRepository {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| {
            RepositoryError::Storage(format!(
                "Failed to create project data directory {}: {}",
                dir.display(),
                err
            ))
        })?;

        let mut rows = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|err| {
            RepositoryError::Storage(format!("Failed to list {}: {}", dir.display(), err))
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_record = path
                .extension()
                .map(|ext| ext == RECORD_EXTENSION)
                .unwrap_or(false);
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !is_record || hidden {
                continue;
            }
            match read_yaml_file::<Project>(&path, "project") {
                Ok(Some(project)) => rows.push(project),
                Ok(None) => log::warn!("Skipping empty project file {}", path.display()),
                Err(err) => log::error!("Skipping unreadable project file: {}", err),
            }
        }
        log::info!("Loaded {} project(s) from {}", rows.len(), dir.display());

        Ok(Self {
            dir,
            table: Mutex::new(ProjectTable::from_rows(rows)),
        })
    }

    fn record_path(&self, id: ProjectId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, RECORD_EXTENSION))
    }
}

impl ProjectRepository for YamlProjectRepository {
    fn create(&self, project: Project, options: SaveOptions) -> Result<Project, RepositoryError> {
        let mut table = lock_table(&self.table)?;
        table.check_insert(&project, options)?;
        write_yaml_file(&self.record_path(project.id), "project", &project)?;
        table.put(project.clone());
        Ok(project)
    }

    fn update(
        &self,
        project: Project,
        expected_version: u64,
        options: SaveOptions,
    ) -> Result<Project, RepositoryError> {
        let mut table = lock_table(&self.table)?;
        table.check_replace(&project, expected_version, options)?;
        write_yaml_file(&self.record_path(project.id), "project", &project)?;
        table.put(project.clone());
        Ok(project)
    }

    fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(lock_table(&self.table)?.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        Ok(lock_table(&self.table)?.all())
    }

    fn delete(&self, id: ProjectId) -> Result<Project, RepositoryError> {
        let mut table = lock_table(&self.table)?;
        if table.get(id).is_none() {
            return Err(RepositoryError::NotFound(id));
        }
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(RepositoryError::Storage(format!(
                    "Failed to remove {}: {}",
                    path.display(),
                    err
                )));
            }
        }
        table.remove(id).ok_or(RepositoryError::NotFound(id))
    }

    fn slug_taken(&self, slug: &str, exclude: Option<ProjectId>) -> Result<bool, RepositoryError> {
        Ok(lock_table(&self.table)?.slug_taken(slug, exclude))
    }
}

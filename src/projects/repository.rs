// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::{Project, ProjectId};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
pub enum RepositoryError {
    Validation(Vec<String>),
    DuplicateSlug(String),
    VersionConflict { expected: u64, actual: u64 },
    NotFound(ProjectId),
    Storage(String),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::Validation(errors) => {
                write!(f, "validation failed: {}", errors.join("; "))
            }
            RepositoryError::DuplicateSlug(slug) => {
                write!(f, "a project with slug '{}' already exists", slug)
            }
            RepositoryError::VersionConflict { expected, actual } => write!(
                f,
                "project was modified concurrently (expected version {}, found {})",
                expected, actual
            ),
            RepositoryError::NotFound(id) => write!(f, "project {} not found", id),
            RepositoryError::Storage(message) => write!(f, "storage error: {}", message),
        }
    }
}

impl Error for RepositoryError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Enforce required fields. Off for drafts.
    pub validate: bool,
}

/// Project persistence. Commits are atomic per record and guarded by the record version.
pub trait ProjectRepository: Send + Sync {
    fn create(&self, project: Project, options: SaveOptions) -> Result<Project, RepositoryError>;

    /// Replaces the stored record if its version still equals `expected_version`.
    fn update(
        &self,
        project: Project,
        expected_version: u64,
        options: SaveOptions,
    ) -> Result<Project, RepositoryError>;

    fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError>;

    fn list(&self) -> Result<Vec<Project>, RepositoryError>;

    fn delete(&self, id: ProjectId) -> Result<Project, RepositoryError>;

    fn slug_taken(&self, slug: &str, exclude: Option<ProjectId>) -> Result<bool, RepositoryError>;
}

/// In-memory table with the uniqueness and version rules every repository enforces.
#[derive(Debug, Default)]
pub struct ProjectTable {
    rows: HashMap<ProjectId, Project>,
}

impl ProjectTable {
    pub fn from_rows(rows: impl IntoIterator<Item = Project>) -> Self {
        Self {
            rows: rows.into_iter().map(|row| (row.id, row)).collect(),
        }
    }

    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.rows.get(&id)
    }

    pub fn all(&self) -> Vec<Project> {
        self.rows.values().cloned().collect()
    }

    pub fn slug_taken(&self, slug: &str, exclude: Option<ProjectId>) -> bool {
        self.rows
            .values()
            .any(|row| row.slug == slug && Some(row.id) != exclude)
    }

    pub fn check_insert(&self, project: &Project, options: SaveOptions) -> Result<(), RepositoryError> {
        check_fields(project, options)?;
        if self.rows.contains_key(&project.id) {
            return Err(RepositoryError::Storage(format!(
                "project {} already exists",
                project.id
            )));
        }
        if self.slug_taken(&project.slug, None) {
            return Err(RepositoryError::DuplicateSlug(project.slug.clone()));
        }
        Ok(())
    }

    pub fn check_replace(
        &self,
        project: &Project,
        expected_version: u64,
        options: SaveOptions,
    ) -> Result<(), RepositoryError> {
        check_fields(project, options)?;
        let current = self
            .rows
            .get(&project.id)
            .ok_or(RepositoryError::NotFound(project.id))?;
        if current.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                actual: current.version,
            });
        }
        if self.slug_taken(&project.slug, Some(project.id)) {
            return Err(RepositoryError::DuplicateSlug(project.slug.clone()));
        }
        Ok(())
    }

    pub fn put(&mut self, project: Project) {
        self.rows.insert(project.id, project);
    }

    pub fn remove(&mut self, id: ProjectId) -> Option<Project> {
        self.rows.remove(&id)
    }
}

fn check_fields(project: &Project, options: SaveOptions) -> Result<(), RepositoryError> {
    if project.slug.trim().is_empty() {
        return Err(RepositoryError::Validation(vec!["slug is required".to_string()]));
    }
    if options.validate {
        let missing = project.missing_required_fields();
        if !missing.is_empty() {
            return Err(RepositoryError::Validation(missing));
        }
    }
    Ok(())
}

pub(crate) fn lock_table(table: &Mutex<ProjectTable>) -> Result<MutexGuard<'_, ProjectTable>, RepositoryError> {
    table
        .lock()
        .map_err(|_| RepositoryError::Storage("project table lock poisoned".to_string()))
}

/// Volatile repository, used where nothing needs to survive a restart.
#[derive(Debug, Default)]
pub struct MemoryProjectRepository {
    table: Mutex<ProjectTable>,
}

impl MemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectRepository for MemoryProjectRepository {
    fn create(&self, project: Project, options: SaveOptions) -> Result<Project, RepositoryError> {
        let mut table = lock_table(&self.table)?;
        table.check_insert(&project, options)?;
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
        lock_table(&self.table)?
            .remove(id)
            .ok_or(RepositoryError::NotFound(id))
    }

    fn slug_taken(&self, slug: &str, exclude: Option<ProjectId>) -> Result<bool, RepositoryError> {
        Ok(lock_table(&self.table)?.slug_taken(slug, exclude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(slug: &str) -> Project {
        let mut project = Project::blank(ProjectId::generate(), Utc::now());
        project.project_title = slug.to_string();
        project.slug = slug.to_string();
        project.short_address = "Main road".to_string();
        project.about_us_detail.description1 = "About".to_string();
        project
    }

    const VALIDATE: SaveOptions = SaveOptions { validate: true };

    #[test]
    fn create_rejects_duplicate_slug() {
        let repo = MemoryProjectRepository::new();
        repo.create(project("palm"), VALIDATE).expect("first");
        let err = repo.create(project("palm"), VALIDATE).expect_err("duplicate");
        assert!(matches!(err, RepositoryError::DuplicateSlug(_)));
    }

    #[test]
    fn update_checks_version() {
        let repo = MemoryProjectRepository::new();
        let stored = repo.create(project("palm"), VALIDATE).expect("create");
        let mut next = stored.clone();
        next.version = 2;
        repo.update(next.clone(), 1, VALIDATE).expect("first update");

        let err = repo.update(next, 1, VALIDATE).expect_err("stale");
        assert!(matches!(
            err,
            RepositoryError::VersionConflict {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn validation_is_skipped_for_drafts() {
        let repo = MemoryProjectRepository::new();
        let mut draft = project("draft-1");
        draft.short_address.clear();
        assert!(matches!(
            repo.create(draft.clone(), VALIDATE),
            Err(RepositoryError::Validation(_))
        ));
        repo.create(draft, SaveOptions { validate: false })
            .expect("draft save");
    }

    #[test]
    fn delete_reports_missing_record() {
        let repo = MemoryProjectRepository::new();
        let id = ProjectId::generate();
        assert!(matches!(repo.delete(id), Err(RepositoryError::NotFound(_))));
    }
}

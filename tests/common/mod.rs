// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::App;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::web;
use propdesk::api::{self, UploadLimits};
use propdesk::app_state::AppState;
use propdesk::assets::UploadedFile;
use propdesk::projects::{
    FormFields, Project, ProjectId, ProjectInput, ProjectRepository, ProjectService,
    RepositoryError, SaveOptions, YamlProjectRepository,
};
use propdesk::runtime_paths::RuntimePaths;
use propdesk::util::BlockingPool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0x0d];
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%test\n";

pub struct TestHarness {
    pub root: TempDir,
    pub runtime_paths: RuntimePaths,
    pub service: Arc<ProjectService>,
    pub app_state: Arc<AppState>,
}

impl TestHarness {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let runtime_paths = RuntimePaths::from_root(root.path()).expect("runtime paths");
        let repository = Arc::new(
            YamlProjectRepository::open(&runtime_paths.projects_data_dir).expect("project store"),
        );
        Self::with_repository(root, runtime_paths, repository)
    }

    pub fn with_repository(
        root: TempDir,
        runtime_paths: RuntimePaths,
        repository: Arc<dyn ProjectRepository>,
    ) -> Self {
        let service = Arc::new(ProjectService::new(
            repository,
            runtime_paths.asset_root().to_path_buf(),
        ));
        let app_state = Arc::new(AppState::new(
            runtime_paths.clone(),
            service.clone(),
            BlockingPool::new(4, 1),
            UploadLimits {
                max_file_size: Some(1024 * 1024),
                max_files: 20,
            },
        ));
        Self {
            root,
            runtime_paths,
            service,
            app_state,
        }
    }

    pub fn asset(&self, relative: &str) -> PathBuf {
        self.runtime_paths.asset_root().join(relative)
    }

    pub fn project_dir(&self, name: &str) -> PathBuf {
        self.runtime_paths.uploads_dir.join("projects").join(name)
    }
}

pub fn build_test_app(
    app_state: Arc<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::from(app_state))
        .configure(api::configure)
}

pub fn publishable_form(title: &str) -> FormFields {
    FormFields::new()
        .with("projectTitle", title)
        .with("shortAddress", "12 Lake Road")
        .with("projectState", "on-going")
        .with("projectType", "residential")
        .with("cardProjectType", "residential")
        .with("projectStatusPercentage", "40")
        .with("description1", "Homes by the lake")
}

pub fn input(form: &FormFields) -> ProjectInput {
    ProjectInput::from_form(form).expect("project input")
}

pub fn png(field: &str, name: &str) -> UploadedFile {
    UploadedFile::in_memory(field, name, "image/png", PNG_BYTES.to_vec())
}

pub fn pdf(field: &str, name: &str) -> UploadedFile {
    UploadedFile::in_memory(field, name, "application/pdf", PDF_BYTES.to_vec())
}

/// Files under `dir`, recursively, relative to it.
pub fn files_under(dir: &Path) -> Vec<String> {
    let mut found = Vec::new();
    collect_files(dir, dir, &mut found);
    found.sort();
    found
}

fn collect_files(base: &Path, dir: &Path, found: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(base, &path, found);
        } else if let Ok(relative) = path.strip_prefix(base) {
            found.push(relative.to_string_lossy().into_owned());
        }
    }
}

/// Repository whose commits fail on demand; reads go to the wrapped store.
pub struct FailingRepository {
    inner: Arc<dyn ProjectRepository>,
    fail_commits: AtomicBool,
}

impl FailingRepository {
    pub fn new(inner: Arc<dyn ProjectRepository>) -> Self {
        Self {
            inner,
            fail_commits: AtomicBool::new(false),
        }
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("disk unavailable".to_string()));
        }
        Ok(())
    }
}

impl ProjectRepository for FailingRepository {
    fn create(&self, project: Project, options: SaveOptions) -> Result<Project, RepositoryError> {
        self.check()?;
        self.inner.create(project, options)
    }

    fn update(
        &self,
        project: Project,
        expected_version: u64,
        options: SaveOptions,
    ) -> Result<Project, RepositoryError> {
        self.check()?;
        self.inner.update(project, expected_version, options)
    }

    fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        self.inner.find_by_id(id)
    }

    fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        self.inner.list()
    }

    fn delete(&self, id: ProjectId) -> Result<Project, RepositoryError> {
        self.inner.delete(id)
    }

    fn slug_taken(&self, slug: &str, exclude: Option<ProjectId>) -> Result<bool, RepositoryError> {
        self.inner.slug_taken(slug, exclude)
    }
}

/// Hand-assembled `multipart/form-data` body.
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "----propdesk-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Returns the `Content-Type` header value and the finished body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::draft::SaveKind;
use super::errors::ProjectError;
use super::form::{DeletionDirectives, ProjectInput};
use super::model::{
    Project, ProjectId, ProjectState, ProjectType, assign_missing_ids,
    clear_upload_hints, normalize_phone,
};
use super::query::{self, MIN_SEARCH_LEN, ProjectPage, ProjectQuery, ProjectStats};
use super::repository::{ProjectRepository, SaveOptions};
use super::slug::{generate_slug, unique_slug};
use crate::assets::batch::fields;
use crate::assets::correlator::{self, AssetEntry, SaveMode};
use crate::assets::reconciler::{AssetLedger, apply_delete_list, supersede_abandoned};
use crate::assets::store::prefixes;
use crate::assets::{
    AssetDirectory, AssetError, AssetStore, DirectoryResolver, FieldFiles, FileBatch,
    safe_directory_name,
};
use crate::util::mime_helper::{is_image, is_pdf};
use chrono::Utc;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

pub const ASSET_KIND: &str = "projects";

/// Runs project saves through the asset pipeline:
/// fields normalized, assets correlated, deletions scheduled, record persisted, then either
/// superseded assets reclaimed or newly written assets rolled back.
pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
    store: AssetStore,
    directories: DirectoryResolver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    Soft,
    Permanent,
}

impl ProjectService {
    pub fn new(repository: Arc<dyn ProjectRepository>, asset_root: impl Into<PathBuf>) -> Self {
        let asset_root = asset_root.into();
        Self {
            repository,
            store: AssetStore::new(asset_root.clone()),
            directories: DirectoryResolver::new(asset_root, ASSET_KIND),
        }
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn create(
        &self,
        input: ProjectInput,
        mut files: FileBatch,
        draft: bool,
    ) -> Result<Project, ProjectError> {
        let now = Utc::now();
        let kind = SaveKind::from_flag(draft);
        let mut doc = Project::blank(ProjectId::generate(), now);
        apply_fields(&mut doc, &input);
        kind.prepare(&mut doc, now);

        match input.slug.as_deref().filter(|slug| !slug.is_empty()) {
            Some(slug) => {
                if self.repository.slug_taken(slug, None)? {
                    return Err(duplicate_slug(slug));
                }
                doc.slug = slug.to_string();
            }
            None => doc.slug = self.generate_unique_slug(&doc.project_title, None)?,
        }
        kind.check(&doc).map_err(ProjectError::Validation)?;
        screen_files(&files)?;

        let dir = self.assign_directory(&doc.project_title)?;
        doc.asset_directory = dir.name().to_string();

        let mut ledger = AssetLedger::new(&self.store);
        if let Err(err) = bind_assets(
            &mut doc,
            None,
            &DeletionDirectives::default(),
            &mut files,
            &dir,
            &mut ledger,
        ) {
            return Err(self.abort(ledger, &dir, err.into()));
        }
        drop(files);
        strip_hints(&mut doc);

        match self
            .repository
            .create(doc, SaveOptions { validate: !draft })
        {
            Ok(saved) => {
                ledger.reclaim(&saved.asset_path_set());
                log::info!(
                    "Created project {} '{}'{}",
                    saved.id,
                    saved.project_title,
                    if draft { " (draft)" } else { "" }
                );
                Ok(saved)
            }
            Err(err) => Err(self.abort(ledger, &dir, err.into())),
        }
    }

    pub fn update(
        &self,
        id: ProjectId,
        input: ProjectInput,
        mut files: FileBatch,
        draft: bool,
    ) -> Result<Project, ProjectError> {
        let existing = self.require(id)?;
        if let Some(expected) = input.expected_version
            && expected != existing.version
        {
            return Err(ProjectError::VersionMismatch {
                expected,
                actual: existing.version,
            });
        }

        let now = Utc::now();
        let kind = SaveKind::from_flag(draft);
        let mut doc = existing.clone();
        apply_fields(&mut doc, &input);
        kind.prepare(&mut doc, now);

        if let Some(slug) = input.slug.as_deref().filter(|slug| !slug.is_empty())
            && slug != existing.slug
        {
            if self.repository.slug_taken(slug, Some(id))? {
                return Err(duplicate_slug(slug));
            }
            doc.slug = slug.to_string();
        }
        if doc.slug.is_empty() {
            doc.slug = self.generate_unique_slug(&doc.project_title, Some(id))?;
        }
        kind.check(&doc).map_err(ProjectError::Validation)?;
        screen_files(&files)?;

        let dir = if existing.asset_directory.is_empty() {
            let dir = self.directories.for_title(&existing.project_title);
            doc.asset_directory = dir.name().to_string();
            dir
        } else {
            self.directories.directory(&existing.asset_directory)
        };

        let mut ledger = AssetLedger::new(&self.store);
        if let Err(err) = bind_assets(
            &mut doc,
            Some(&existing),
            &input.deletions,
            &mut files,
            &dir,
            &mut ledger,
        ) {
            return Err(self.abort(ledger, &dir, err.into()));
        }
        drop(files);
        strip_hints(&mut doc);
        doc.version = existing.version + 1;
        doc.updated_at = now;

        match self.repository.update(
            doc,
            existing.version,
            SaveOptions { validate: !draft },
        ) {
            Ok(saved) => {
                let summary = ledger.reclaim(&saved.asset_path_set());
                log::info!(
                    "Updated project {} to version {} ({} superseded asset(s) deleted)",
                    saved.id,
                    saved.version,
                    summary.deleted
                );
                Ok(saved)
            }
            Err(err) => Err(self.abort(ledger, &dir, err.into())),
        }
    }

    pub fn get_by_id(&self, id: ProjectId) -> Result<Project, ProjectError> {
        self.require(id)
    }

    /// Public lookup: inactive records are hidden.
    pub fn get_by_slug(&self, slug: &str) -> Result<Project, ProjectError> {
        self.repository
            .list()?
            .into_iter()
            .find(|project| project.slug == slug && project.is_active)
            .ok_or_else(|| ProjectError::NotFound("Project not found".to_string()))
    }

    pub fn list(&self, query: &ProjectQuery) -> Result<ProjectPage, ProjectError> {
        Ok(query::paginate(self.repository.list()?, query))
    }

    pub fn by_state(&self, state: ProjectState, limit: u32) -> Result<Vec<Project>, ProjectError> {
        Ok(query::newest_active(self.repository.list()?, limit, |p| {
            p.project_state == state
        }))
    }

    pub fn by_type(&self, kind: ProjectType, limit: u32) -> Result<Vec<Project>, ProjectError> {
        Ok(query::newest_active(self.repository.list()?, limit, |p| {
            p.project_type == kind
        }))
    }

    pub fn search(&self, term: &str, limit: u32) -> Result<Vec<Project>, ProjectError> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_LEN {
            return Err(ProjectError::validation(format!(
                "Search term must be at least {} characters long",
                MIN_SEARCH_LEN
            )));
        }
        Ok(query::newest_active(self.repository.list()?, limit, |p| {
            query::matches_term(p, term)
        }))
    }

    pub fn stats(&self) -> Result<ProjectStats, ProjectError> {
        Ok(query::stats(&self.repository.list()?))
    }

    pub fn toggle_status(&self, id: ProjectId, is_active: bool) -> Result<Project, ProjectError> {
        let existing = self.require(id)?;
        let mut doc = existing.clone();
        doc.is_active = is_active;
        doc.version = existing.version + 1;
        doc.updated_at = Utc::now();
        let saved = self
            .repository
            .update(doc, existing.version, SaveOptions { validate: false })?;
        log::info!(
            "Project {} {}",
            saved.id,
            if is_active { "activated" } else { "deactivated" }
        );
        Ok(saved)
    }

    /// Soft delete hides the record and keeps its files. Permanent delete removes every recorded
    /// asset, then the record, then the asset directory if it ended up empty.
    pub fn delete(&self, id: ProjectId, mode: DeleteMode) -> Result<Project, ProjectError> {
        match mode {
            DeleteMode::Soft => self.toggle_status(id, false),
            DeleteMode::Permanent => {
                let existing = self.require(id)?;
                for path in existing.asset_paths() {
                    self.store.delete(&path);
                }
                let removed = self.repository.delete(id)?;
                let dir = self.directory_of(&removed);
                self.store.remove_directory_if_empty(&dir);
                log::info!("Permanently deleted project {}", removed.id);
                Ok(removed)
            }
        }
    }

    fn require(&self, id: ProjectId) -> Result<Project, ProjectError> {
        self.repository
            .find_by_id(id)?
            .ok_or_else(|| ProjectError::NotFound("Project not found".to_string()))
    }

    fn directory_of(&self, project: &Project) -> AssetDirectory {
        if project.asset_directory.is_empty() {
            self.directories.for_title(&project.project_title)
        } else {
            self.directories.directory(&project.asset_directory)
        }
    }

    fn generate_unique_slug(
        &self,
        title: &str,
        exclude: Option<ProjectId>,
    ) -> Result<String, ProjectError> {
        let base = generate_slug(title);
        if base.is_empty() {
            return Ok(base);
        }
        Ok(unique_slug(&base, |candidate| {
            self.repository.slug_taken(candidate, exclude)
        })?)
    }

    /// Picks a directory no other record uses. Legacy records claim the name their title maps to.
    fn assign_directory(&self, title: &str) -> Result<AssetDirectory, ProjectError> {
        let claimed: HashSet<String> = self
            .repository
            .list()?
            .into_iter()
            .map(|project| {
                if project.asset_directory.is_empty() {
                    safe_directory_name(&project.project_title)
                } else {
                    project.asset_directory
                }
            })
            .collect();
        Ok(self.directories.assign(title, |name| claimed.contains(name)))
    }

    fn abort(&self, ledger: AssetLedger<'_>, dir: &AssetDirectory, err: ProjectError) -> ProjectError {
        let removed = ledger.rollback();
        self.store.remove_directory_if_empty(dir);
        log::error!("Project save failed, {} new asset(s) rolled back: {}", removed, err);
        err
    }
}

fn duplicate_slug(slug: &str) -> ProjectError {
    ProjectError::Conflict(format!("Project with slug '{}' already exists", slug))
}

/// Copies every supplied field onto `doc`; omitted fields keep their current value.
/// The slug is handled by the caller since it needs a uniqueness check.
pub fn apply_fields(doc: &mut Project, input: &ProjectInput) {
    fn set(target: &mut String, value: &Option<String>) {
        if let Some(value) = value {
            *target = value.clone();
        }
    }

    set(&mut doc.project_title, &input.project_title);
    set(&mut doc.short_address, &input.short_address);
    if let Some(state) = input.project_state {
        doc.project_state = state;
    }
    if let Some(kind) = input.project_type {
        doc.project_type = kind;
    }
    if let Some(kind) = input.card_project_type {
        doc.card_project_type = kind;
    }
    if let Some(percentage) = input.project_status_percentage {
        doc.project_status_percentage = percentage;
    }
    if let Some(number) = &input.number1 {
        doc.number1 = normalize_phone(number);
    }
    if let Some(number) = &input.number2 {
        doc.number2 = normalize_phone(number);
    }

    let about = &mut doc.about_us_detail;
    set(&mut about.description1, &input.description1);
    set(&mut about.description2, &input.description2);
    set(&mut about.description3, &input.description3);
    set(&mut about.description4, &input.description4);
    set(&mut about.image.alt, &input.about_image_alt);
    set(&mut doc.banner_section.alt, &input.banner_alt);

    if let Some(active) = input.is_active {
        doc.is_active = active;
    }
    if let Some(plans) = &input.floor_plans {
        doc.floor_plans = plans.clone();
    }
    if let Some(images) = &input.gallery_images {
        doc.gallery_images = images.clone();
    }
    if let Some(amenities) = &input.amenities {
        doc.amenities = amenities.clone();
    }
    if let Some(images) = &input.updated_images {
        doc.updated_images = images.clone();
    }
}

/// Rejects files whose detected type does not fit their field.
pub fn screen_files(files: &FileBatch) -> Result<(), ProjectError> {
    let rejected: Vec<String> = files
        .iter()
        .filter(|file| {
            if file.field == fields::BROCHURE {
                !is_pdf(&file.mime_type)
            } else {
                !is_image(&file.mime_type)
            }
        })
        .map(|file| {
            let expected = if file.field == fields::BROCHURE {
                "a PDF"
            } else {
                "an image"
            };
            format!(
                "{}: '{}' is {}, expected {}",
                file.field, file.original_name, file.mime_type, expected
            )
        })
        .collect();
    if rejected.is_empty() {
        Ok(())
    } else {
        Err(ProjectError::Validation(rejected))
    }
}

fn bind_assets(
    doc: &mut Project,
    existing: Option<&Project>,
    deletions: &DeletionDirectives,
    files: &mut FileBatch,
    dir: &AssetDirectory,
    ledger: &mut AssetLedger<'_>,
) -> Result<(), AssetError> {
    let mode = if existing.is_some() {
        SaveMode::Update
    } else {
        SaveMode::Create
    };

    correlator::replace_single(
        &mut doc.brochure,
        files.take_single(fields::BROCHURE),
        dir,
        prefixes::BROCHURE,
        ledger,
    )?;
    let hero_replaced = correlator::replace_single(
        &mut doc.about_us_detail.image.url,
        files.take_single(fields::ABOUT_US_IMAGE),
        dir,
        prefixes::ABOUT,
        ledger,
    )?;
    if !hero_replaced && deletions.about_image {
        let old = std::mem::take(&mut doc.about_us_detail.image.url);
        ledger.supersede(&old);
    }
    correlator::replace_single(
        &mut doc.banner_section.desktop_banner_image,
        files.take_single(fields::DESKTOP_BANNER),
        dir,
        prefixes::BANNER_DESKTOP,
        ledger,
    )?;
    correlator::replace_single(
        &mut doc.banner_section.mobile_banner_image,
        files.take_single(fields::MOBILE_BANNER),
        dir,
        prefixes::BANNER_MOBILE,
        ledger,
    )?;
    correlator::replace_single(
        &mut doc.card_image,
        files.take_single(fields::CARD_IMAGE),
        dir,
        prefixes::CARD,
        ledger,
    )?;

    let binding = CollectionBinding { mode, dir };
    binding.bind(
        &mut doc.floor_plans,
        existing.map(|p| p.floor_plans.as_slice()).unwrap_or_default(),
        files.take_field(fields::FLOOR_PLAN_IMAGES),
        prefixes::FLOOR_PLAN,
        &deletions.floor_plans,
        ledger,
    )?;
    binding.bind(
        &mut doc.gallery_images,
        existing.map(|p| p.gallery_images.as_slice()).unwrap_or_default(),
        files.take_field(fields::PROJECT_IMAGE_FILES),
        prefixes::GALLERY,
        &deletions.gallery_images,
        ledger,
    )?;
    binding.bind(
        &mut doc.amenities,
        existing.map(|p| p.amenities.as_slice()).unwrap_or_default(),
        files.take_field(fields::AMENITY_FILES),
        prefixes::AMENITY,
        &deletions.amenities,
        ledger,
    )?;
    binding.bind(
        &mut doc.updated_images,
        existing.map(|p| p.updated_images.as_slice()).unwrap_or_default(),
        files.take_field(fields::UPDATED_IMAGE_FILES),
        prefixes::UPDATED,
        &deletions.updated_images,
        ledger,
    )?;
    Ok(())
}

struct CollectionBinding<'d> {
    mode: SaveMode,
    dir: &'d AssetDirectory,
}

impl CollectionBinding<'_> {
    /// Delete lists run first so a removed entry never consumes an upload. Paths an entry stops
    /// referencing are scheduled before assetless entries are dropped.
    fn bind<T: AssetEntry>(
        &self,
        entries: &mut Vec<T>,
        existing: &[T],
        files: FieldFiles,
        prefix: &str,
        delete_ids: &[String],
        ledger: &mut AssetLedger<'_>,
    ) -> Result<(), AssetError> {
        correlator::retain_trusted_paths(entries, existing);
        apply_delete_list(entries, existing, delete_ids, ledger);
        correlator::correlate(entries, files, existing, self.mode, self.dir, prefix, ledger)?;
        supersede_abandoned(entries, existing, ledger);
        correlator::drop_assetless(entries);
        assign_missing_ids(entries);
        Ok(())
    }
}

fn strip_hints(doc: &mut Project) {
    clear_upload_hints(&mut doc.floor_plans);
    clear_upload_hints(&mut doc.gallery_images);
    clear_upload_hints(&mut doc.amenities);
    clear_upload_hints(&mut doc.updated_images);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::UploadedFile;
    use crate::projects::form::FormFields;
    use crate::projects::repository::MemoryProjectRepository;

    fn service() -> (tempfile::TempDir, ProjectService) {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = ProjectService::new(Arc::new(MemoryProjectRepository::new()), temp.path());
        (temp, service)
    }

    fn publishable(title: &str) -> FormFields {
        FormFields::new()
            .with("projectTitle", title)
            .with("shortAddress", "Ring road")
            .with("projectState", "on-going")
            .with("projectType", "residential")
            .with("description1", "About the project")
    }

    fn png(field: &str) -> UploadedFile {
        UploadedFile::in_memory(field, "photo.png", "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn create_assigns_slug_and_directory() {
        let (_temp, service) = service();
        let input = ProjectInput::from_form(&publishable("Sunrise Heights!! 2024")).expect("input");
        let project = service
            .create(input, FileBatch::from_files(vec![png(fields::CARD_IMAGE)]), false)
            .expect("create");

        assert_eq!(project.slug, "sunrise-heights-2024");
        assert_eq!(project.asset_directory, "sunrise-heights-2024");
        assert!(project.card_image.starts_with("uploads/projects/sunrise-heights-2024/card_"));
        assert!(service.store().exists(&project.card_image));
        assert_eq!(project.version, 1);
    }

    #[test]
    fn wrong_file_type_is_rejected_before_writing() {
        let (temp, service) = service();
        let input = ProjectInput::from_form(&publishable("Palm Grove")).expect("input");
        let err = service
            .create(input, FileBatch::from_files(vec![png(fields::BROCHURE)]), false)
            .expect_err("png brochure");
        assert!(matches!(err, ProjectError::Validation(_)));
        assert!(!temp.path().join("uploads/projects/palm-grove").exists());
    }

    #[test]
    fn search_requires_two_characters() {
        let (_temp, service) = service();
        assert!(matches!(service.search(" a ", 10), Err(ProjectError::Validation(_))));
        assert!(service.search("ab", 10).expect("search").is_empty());
    }

    #[test]
    fn toggle_status_bumps_version() {
        let (_temp, service) = service();
        let input = ProjectInput::from_form(&publishable("Palm Grove")).expect("input");
        let project = service.create(input, FileBatch::new(), false).expect("create");
        let toggled = service.toggle_status(project.id, false).expect("toggle");
        assert!(!toggled.is_active);
        assert_eq!(toggled.version, 2);
        assert!(matches!(
            service.get_by_slug("palm-grove"),
            Err(ProjectError::NotFound(_))
        ));
    }
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::assets::AssetEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const PHONE_PREFIX: &str = "+91";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(u64);

impl ProjectId {
    pub fn generate() -> Self {
        let (high, _) = Uuid::new_v4().as_u64_pair();
        Self(high)
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.len() != 16 {
            return Err(format!("invalid project id '{}'", raw));
        }
        u64::from_str_radix(raw, 16)
            .map(Self)
            .map_err(|_| format!("invalid project id '{}'", raw))
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for ProjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ProjectId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectState {
    #[serde(rename = "on-going")]
    OnGoing,
    #[serde(rename = "completed")]
    Completed,
}

impl ProjectState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectState::OnGoing => "on-going",
            ProjectState::Completed => "completed",
        }
    }
}

impl FromStr for ProjectState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "on-going" => Ok(ProjectState::OnGoing),
            "completed" => Ok(ProjectState::Completed),
            other => Err(format!(
                "Invalid project state '{}'. Must be 'on-going' or 'completed'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Residential,
    Commercial,
    Plot,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Residential => "residential",
            ProjectType::Commercial => "commercial",
            ProjectType::Plot => "plot",
        }
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "residential" => Ok(ProjectType::Residential),
            "commercial" => Ok(ProjectType::Commercial),
            "plot" => Ok(ProjectType::Plot),
            other => Err(format!(
                "Invalid project type '{}'. Must be 'residential', 'commercial', or 'plot'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroImage {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutUsDetail {
    pub description1: String,
    pub description2: String,
    pub description3: String,
    pub description4: String,
    pub image: HeroImage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BannerSection {
    pub desktop_banner_image: String,
    pub mobile_banner_image: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlan {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing)]
    pub has_new_file: bool,
    #[serde(default, skip_serializing)]
    pub upload_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing)]
    pub has_new_file: bool,
    #[serde(default, skip_serializing)]
    pub upload_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amenity {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub svg_or_image: String,
    #[serde(default, skip_serializing)]
    pub has_new_file: bool,
    #[serde(default, skip_serializing)]
    pub upload_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedImage {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing)]
    pub has_new_file: bool,
    #[serde(default, skip_serializing)]
    pub upload_key: Option<String>,
}

macro_rules! impl_asset_entry {
    ($ty:ty, $kind:literal, $path:ident) => {
        impl AssetEntry for $ty {
            const KIND: &'static str = $kind;

            fn entry_id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_entry_id(&mut self, id: String) {
                self.id = Some(id);
            }

            fn asset_path(&self) -> &str {
                &self.$path
            }

            fn set_asset_path(&mut self, path: String) {
                self.$path = path;
            }

            fn has_new_file(&self) -> bool {
                self.has_new_file
            }

            fn upload_key(&self) -> Option<&str> {
                self.upload_key.as_deref()
            }
        }
    };
}

impl_asset_entry!(FloorPlan, "floor plan", image);
impl_asset_entry!(GalleryImage, "gallery image", image);
impl_asset_entry!(Amenity, "amenity", svg_or_image);
impl_asset_entry!(UpdatedImage, "updated image", image);

/// Gives every entry without an id a fresh one.
pub fn assign_missing_ids<T: AssetEntry>(entries: &mut [T]) {
    for entry in entries {
        if entry.entry_id().map(str::is_empty).unwrap_or(true) {
            entry.set_entry_id(Uuid::new_v4().simple().to_string());
        }
    }
}

/// Clears request-only correlation hints before a record is stored.
pub fn clear_upload_hints<T: UploadHints>(entries: &mut [T]) {
    for entry in entries {
        entry.clear_hints();
    }
}

pub trait UploadHints {
    fn clear_hints(&mut self);
}

macro_rules! impl_upload_hints {
    ($($ty:ty),*) => {
        $(impl UploadHints for $ty {
            fn clear_hints(&mut self) {
                self.has_new_file = false;
                self.upload_key = None;
            }
        })*
    };
}

impl_upload_hints!(FloorPlan, GalleryImage, Amenity, UpdatedImage);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub project_title: String,
    pub slug: String,
    pub short_address: String,
    pub project_state: ProjectState,
    pub project_type: ProjectType,
    pub card_project_type: ProjectType,
    pub project_status_percentage: u8,
    #[serde(default)]
    pub number1: String,
    #[serde(default)]
    pub number2: String,
    #[serde(default)]
    pub about_us_detail: AboutUsDetail,
    #[serde(default)]
    pub banner_section: BannerSection,
    #[serde(default)]
    pub brochure: String,
    #[serde(default)]
    pub card_image: String,
    #[serde(default)]
    pub floor_plans: Vec<FloorPlan>,
    #[serde(default, rename = "projectImages")]
    pub gallery_images: Vec<GalleryImage>,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
    #[serde(default)]
    pub updated_images: Vec<UpdatedImage>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_draft: bool,
    /// Stable per-record directory under `uploads/projects/`, fixed at creation.
    #[serde(default)]
    pub asset_directory: String,
    #[serde(default = "default_version")]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u64 {
    1
}

impl Project {
    /// An empty record: active, not yet titled, version 1.
    pub fn blank(id: ProjectId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            project_title: String::new(),
            slug: String::new(),
            short_address: String::new(),
            project_state: ProjectState::OnGoing,
            project_type: ProjectType::Residential,
            card_project_type: ProjectType::Residential,
            project_status_percentage: 0,
            number1: String::new(),
            number2: String::new(),
            about_us_detail: AboutUsDetail::default(),
            banner_section: BannerSection::default(),
            brochure: String::new(),
            card_image: String::new(),
            floor_plans: Vec::new(),
            gallery_images: Vec::new(),
            amenities: Vec::new(),
            updated_images: Vec::new(),
            is_active: true,
            is_draft: false,
            asset_directory: String::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Every non-empty asset path the record references.
    pub fn asset_paths(&self) -> Vec<String> {
        let singles = [
            &self.brochure,
            &self.card_image,
            &self.about_us_detail.image.url,
            &self.banner_section.desktop_banner_image,
            &self.banner_section.mobile_banner_image,
        ];
        let collections = self
            .floor_plans
            .iter()
            .map(AssetEntry::asset_path)
            .chain(self.gallery_images.iter().map(AssetEntry::asset_path))
            .chain(self.amenities.iter().map(AssetEntry::asset_path))
            .chain(self.updated_images.iter().map(AssetEntry::asset_path));

        singles
            .into_iter()
            .map(String::as_str)
            .chain(collections)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn asset_path_set(&self) -> HashSet<String> {
        self.asset_paths().into_iter().collect()
    }

    /// Names of required fields that are missing or invalid for a published record.
    pub fn missing_required_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let required = [
            ("projectTitle", &self.project_title),
            ("slug", &self.slug),
            ("shortAddress", &self.short_address),
            ("aboutUsDetail.description1", &self.about_us_detail.description1),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                missing.push(format!("{} is required", name));
            }
        }
        if self.project_status_percentage > 100 {
            missing.push("projectStatusPercentage must be between 0 and 100".to_string());
        }
        missing
    }
}

/// Prefixes a non-empty phone number with the country code unless already present.
pub fn normalize_phone(number: &str) -> String {
    let trimmed = number.trim();
    if trimmed.is_empty() || trimmed.starts_with(PHONE_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{}{}", PHONE_PREFIX, trimmed)
    }
}

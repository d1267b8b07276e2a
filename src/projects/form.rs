// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Decoding of the text parts of a project save request.

use super::model::{Amenity, FloorPlan, GalleryImage, ProjectState, ProjectType, UpdatedImage};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    field: String,
    message: String,
}

impl FormError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Error for FormError {}

/// Text parts of a multipart request, keyed by part name. Repeated names keep arrival order.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: HashMap<String, Vec<String>>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.insert(name, value);
        self
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Values under `name` and `name[]`.
    pub fn all(&self, name: &str) -> Vec<&str> {
        let bracketed = format!("{}[]", name);
        [name, bracketed.as_str()]
            .iter()
            .filter_map(|key| self.values.get(*key))
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

/// Ids of collection entries the client asked to remove, plus the hero image flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionDirectives {
    pub floor_plans: Vec<String>,
    pub gallery_images: Vec<String>,
    pub amenities: Vec<String>,
    pub updated_images: Vec<String>,
    pub about_image: bool,
}

impl DeletionDirectives {
    pub fn is_empty(&self) -> bool {
        self.floor_plans.is_empty()
            && self.gallery_images.is_empty()
            && self.amenities.is_empty()
            && self.updated_images.is_empty()
            && !self.about_image
    }
}

/// Client-supplied project fields. `None` means the field was omitted and keeps its stored value.
#[derive(Debug, Clone, Default)]
pub struct ProjectInput {
    pub project_title: Option<String>,
    pub slug: Option<String>,
    pub short_address: Option<String>,
    pub project_state: Option<ProjectState>,
    pub project_type: Option<ProjectType>,
    pub card_project_type: Option<ProjectType>,
    pub project_status_percentage: Option<u8>,
    pub number1: Option<String>,
    pub number2: Option<String>,
    pub description1: Option<String>,
    pub description2: Option<String>,
    pub description3: Option<String>,
    pub description4: Option<String>,
    pub about_image_alt: Option<String>,
    pub banner_alt: Option<String>,
    pub is_active: Option<bool>,
    pub floor_plans: Option<Vec<FloorPlan>>,
    pub gallery_images: Option<Vec<GalleryImage>>,
    pub amenities: Option<Vec<Amenity>>,
    pub updated_images: Option<Vec<UpdatedImage>>,
    pub deletions: DeletionDirectives,
    pub expected_version: Option<u64>,
}

impl ProjectInput {
    pub fn from_form(form: &FormFields) -> Result<Self, FormError> {
        let text = |name: &str| form.first(name).map(|value| value.trim().to_string());

        let floor_plans = parse_collection::<FloorPlan>(form, "floorPlans")?.map(|plans| {
            plans
                .into_iter()
                .filter(|plan| !plan.title.trim().is_empty())
                .collect()
        });
        let gallery_images =
            parse_collection::<GalleryImage>(form, "projectImages")?.map(|images| {
                images
                    .into_iter()
                    .filter(|image| !image.alt.trim().is_empty())
                    .collect()
            });
        let amenities = parse_collection::<Amenity>(form, "amenities")?.map(|amenities| {
            amenities
                .into_iter()
                .filter(|amenity| !amenity.title.trim().is_empty())
                .collect()
        });
        let updated_images =
            parse_collection::<UpdatedImage>(form, "updatedImages")?.map(|images| {
                images
                    .into_iter()
                    .filter(|image| !image.alt.trim().is_empty())
                    .collect()
            });

        Ok(Self {
            project_title: text("projectTitle"),
            slug: text("slug"),
            short_address: text("shortAddress"),
            project_state: parse_enum(form, "projectState")?,
            project_type: parse_enum(form, "projectType")?,
            card_project_type: parse_enum(form, "cardProjectType")?,
            project_status_percentage: parse_percentage(form.first("projectStatusPercentage"))?,
            number1: text("number1"),
            number2: text("number2"),
            description1: text("description1"),
            description2: text("description2"),
            description3: text("description3"),
            description4: text("description4"),
            about_image_alt: text("aboutUsAlt"),
            banner_alt: text("bannerAlt"),
            is_active: parse_bool(form, "isActive")?,
            floor_plans,
            gallery_images,
            amenities,
            updated_images,
            deletions: DeletionDirectives {
                floor_plans: parse_id_list(form, "deleteFloorPlans")?,
                gallery_images: parse_id_list(form, "deleteProjectImages")?,
                amenities: parse_id_list(form, "deleteAmenities")?,
                updated_images: parse_id_list(form, "deleteUpdatedImages")?,
                about_image: parse_bool(form, "deleteAboutImage")?.unwrap_or(false),
            },
            expected_version: parse_version(form.first("expectedVersion"))?,
        })
    }
}

fn parse_collection<T: DeserializeOwned>(
    form: &FormFields,
    name: &str,
) -> Result<Option<Vec<T>>, FormError> {
    let Some(raw) = form.first(name) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return Ok(Some(Vec::new()));
    }
    serde_json::from_str::<Vec<T>>(raw)
        .map(Some)
        .map_err(|err| FormError::new(name, format!("Invalid {} data: {}", name, err)))
}

fn parse_enum<T>(form: &FormFields, name: &str) -> Result<Option<T>, FormError>
where
    T: std::str::FromStr<Err = String>,
{
    match form.first(name).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|err| FormError::new(name, err)),
    }
}

fn parse_percentage(raw: Option<&str>) -> Result<Option<u8>, FormError> {
    let field = "projectStatusPercentage";
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let parsed: f64 = value
                .parse()
                .map_err(|_| FormError::new(field, format!("'{}' is not a number", value)))?;
            if !(0.0..=100.0).contains(&parsed) {
                return Err(FormError::new(field, "must be between 0 and 100"));
            }
            Ok(Some(parsed.round() as u8))
        }
    }
}

fn parse_version(raw: Option<&str>) -> Result<Option<u64>, FormError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| FormError::new("expectedVersion", format!("'{}' is not a version", value))),
    }
}

fn parse_bool(form: &FormFields, name: &str) -> Result<Option<bool>, FormError> {
    match form.first(name).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Ok(Some(true)),
            "false" | "0" | "off" | "no" => Ok(Some(false)),
            _ => Err(FormError::new(name, format!("'{}' is not a boolean", value))),
        },
    }
}

/// Accepts a JSON array of ids, a single id, or repeated parts.
fn parse_id_list(form: &FormFields, name: &str) -> Result<Vec<String>, FormError> {
    let mut ids = Vec::new();
    for raw in form.all(name) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        if raw.starts_with('[') {
            let values: Vec<serde_json::Value> = serde_json::from_str(raw)
                .map_err(|err| FormError::new(name, format!("Invalid id list: {}", err)))?;
            for value in values {
                match value {
                    serde_json::Value::String(id) if !id.trim().is_empty() => {
                        ids.push(id.trim().to_string())
                    }
                    serde_json::Value::Number(id) => ids.push(id.to_string()),
                    _ => {}
                }
            }
        } else {
            ids.push(raw.to_string());
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_stay_none() {
        let input = ProjectInput::from_form(&FormFields::new().with("projectTitle", " Palm Grove "))
            .expect("parse");
        assert_eq!(input.project_title.as_deref(), Some("Palm Grove"));
        assert!(input.short_address.is_none());
        assert!(input.floor_plans.is_none());
        assert!(input.deletions.is_empty());
    }

    #[test]
    fn collections_drop_undescribed_entries() {
        let form = FormFields::new()
            .with(
                "floorPlans",
                r#"[{"title":"2BHK","alt":"plan","hasNewFile":true},{"title":" "}]"#,
            )
            .with("amenities", "null");
        let input = ProjectInput::from_form(&form).expect("parse");
        let plans = input.floor_plans.expect("floor plans");
        assert_eq!(plans.len(), 1);
        assert!(plans[0].has_new_file);
        assert_eq!(input.amenities, Some(Vec::new()));
    }

    #[test]
    fn malformed_collection_is_rejected() {
        let err = ProjectInput::from_form(&FormFields::new().with("projectImages", "[{"))
            .expect_err("malformed");
        assert_eq!(err.field(), "projectImages");
    }

    #[test]
    fn delete_lists_accept_several_shapes() {
        let form = FormFields::new()
            .with("deleteAmenities", r#"["a1","a2"]"#)
            .with("deleteFloorPlans[]", "fp1")
            .with("deleteFloorPlans[]", "fp2")
            .with("deleteProjectImages", "g1")
            .with("deleteAboutImage", "true");
        let deletions = ProjectInput::from_form(&form).expect("parse").deletions;
        assert_eq!(deletions.amenities, vec!["a1", "a2"]);
        assert_eq!(deletions.floor_plans, vec!["fp1", "fp2"]);
        assert_eq!(deletions.gallery_images, vec!["g1"]);
        assert!(deletions.about_image);
    }

    #[test]
    fn scalar_validation() {
        assert!(
            ProjectInput::from_form(&FormFields::new().with("projectState", "paused")).is_err()
        );
        assert!(
            ProjectInput::from_form(&FormFields::new().with("projectStatusPercentage", "140"))
                .is_err()
        );
        let input = ProjectInput::from_form(
            &FormFields::new()
                .with("projectStatusPercentage", "45")
                .with("expectedVersion", "3")
                .with("isActive", "false"),
        )
        .expect("parse");
        assert_eq!(input.project_status_percentage, Some(45));
        assert_eq!(input.expected_version, Some(3));
        assert_eq!(input.is_active, Some(false));
    }
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::Project;
use chrono::{DateTime, Utc};

pub const DRAFT_ADDRESS: &str = "Draft address";
pub const DRAFT_DESCRIPTION: &str = "Draft description";

/// Whether a save may persist an incomplete record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Draft,
    Publish,
}

impl SaveKind {
    pub fn from_flag(draft: bool) -> Self {
        if draft { SaveKind::Draft } else { SaveKind::Publish }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, SaveKind::Draft)
    }

    /// Marks the record and, for drafts, fills missing required fields with placeholders.
    pub fn prepare(&self, project: &mut Project, now: DateTime<Utc>) {
        project.is_draft = self.is_draft();
        if self.is_draft() {
            let filled = fill_placeholders(project, now);
            if !filled.is_empty() {
                log::debug!("Draft {} backfilled: {}", project.id, filled.join(", "));
            }
        }
    }

    /// Published saves must be complete. Drafts always pass.
    pub fn check(&self, project: &Project) -> Result<(), Vec<String>> {
        if self.is_draft() {
            return Ok(());
        }
        let missing = project.missing_required_fields();
        if missing.is_empty() { Ok(()) } else { Err(missing) }
    }
}

/// Placeholder title for a draft saved at `now`.
pub fn draft_title(now: DateTime<Utc>) -> String {
    format!("Draft {}", now.timestamp_millis())
}

/// Fills empty required fields. The slug is left to the caller since it must be unique.
pub fn fill_placeholders(project: &mut Project, now: DateTime<Utc>) -> Vec<&'static str> {
    let mut filled = Vec::new();
    if project.project_title.trim().is_empty() {
        project.project_title = draft_title(now);
        filled.push("projectTitle");
    }
    if project.short_address.trim().is_empty() {
        project.short_address = DRAFT_ADDRESS.to_string();
        filled.push("shortAddress");
    }
    if project.about_us_detail.description1.trim().is_empty() {
        project.about_us_detail.description1 = DRAFT_DESCRIPTION.to_string();
        filled.push("aboutUsDetail.description1");
    }
    if project.project_status_percentage > 100 {
        project.project_status_percentage = 0;
        filled.push("projectStatusPercentage");
    }
    filled
}

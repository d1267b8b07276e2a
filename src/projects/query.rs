// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::{Project, ProjectState, ProjectType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MIN_SEARCH_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    ProjectTitle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: SortField,
    pub order: SortOrder,
    pub state: Option<ProjectState>,
    pub project_type: Option<ProjectType>,
    pub card_type: Option<ProjectType>,
}

impl ProjectQuery {
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn limit(&self) -> u32 {
        clamp_limit(self.limit)
    }

    fn matches(&self, project: &Project) -> bool {
        self.state.is_none_or(|state| project.project_state == state)
            && self
                .project_type
                .is_none_or(|kind| project.project_type == kind)
            && self
                .card_type
                .is_none_or(|kind| project.card_project_type == kind)
    }
}

pub fn clamp_limit(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        limit.min(MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: u32,
    pub pages: u32,
    pub total: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectPage {
    pub projects: Vec<Project>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateCounts {
    pub on_going: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub residential: usize,
    pub commercial: usize,
    pub plot: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total: usize,
    pub by_state: StateCounts,
    pub by_type: TypeCounts,
}

fn compare(sort: SortField, a: &Project, b: &Project) -> Ordering {
    match sort {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::ProjectTitle => a
            .project_title
            .to_lowercase()
            .cmp(&b.project_title.to_lowercase()),
    }
}

fn sort_projects(projects: &mut [Project], sort: SortField, order: SortOrder) {
    projects.sort_by(|a, b| {
        let ordering = compare(sort, a, b).then_with(|| a.id.cmp(&b.id));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Filters, sorts and pages `projects`. Inactive records are included.
pub fn paginate(projects: Vec<Project>, query: &ProjectQuery) -> ProjectPage {
    let mut matching: Vec<Project> = projects.into_iter().filter(|p| query.matches(p)).collect();
    sort_projects(&mut matching, query.sort, query.order);

    let page = query.page();
    let limit = query.limit();
    let total = matching.len();
    let pages = total.div_ceil(limit as usize) as u32;
    let skip = (page as usize - 1).saturating_mul(limit as usize);
    let projects = matching.into_iter().skip(skip).take(limit as usize).collect();

    ProjectPage {
        projects,
        pagination: Pagination {
            current: page,
            pages,
            total,
            has_next: (page as usize).saturating_mul(limit as usize) < total,
            has_prev: page > 1,
        },
    }
}

/// Active records matching `keep`, newest first, at most `limit`.
pub fn newest_active<F>(projects: Vec<Project>, limit: u32, keep: F) -> Vec<Project>
where
    F: Fn(&Project) -> bool,
{
    let mut matching: Vec<Project> = projects
        .into_iter()
        .filter(|p| p.is_active && keep(p))
        .collect();
    sort_projects(&mut matching, SortField::CreatedAt, SortOrder::Desc);
    matching.truncate(clamp_limit(limit) as usize);
    matching
}

/// Case-insensitive substring match on title, address, slug and descriptions.
pub fn matches_term(project: &Project, term: &str) -> bool {
    let needle = term.to_lowercase();
    let about = &project.about_us_detail;
    [
        &project.project_title,
        &project.short_address,
        &project.slug,
        &about.description1,
        &about.description2,
        &about.description3,
        &about.description4,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

pub fn stats(projects: &[Project]) -> ProjectStats {
    let mut stats = ProjectStats::default();
    for project in projects.iter().filter(|p| p.is_active) {
        stats.total += 1;
        match project.project_state {
            ProjectState::OnGoing => stats.by_state.on_going += 1,
            ProjectState::Completed => stats.by_state.completed += 1,
        }
        match project.card_project_type {
            ProjectType::Residential => stats.by_type.residential += 1,
            ProjectType::Commercial => stats.by_type.commercial += 1,
            ProjectType::Plot => stats.by_type.plot += 1,
        }
    }
    stats
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::multipart::{ParsedMultipart, read_multipart};
use super::response::{
    json_error_response, multipart_error_response, project_error_response, success,
    success_with_message,
};
use crate::app_state::AppState;
use crate::projects::query::{SortField, SortOrder};
use crate::projects::{
    DeleteMode, ProjectError, ProjectId, ProjectInput, ProjectQuery, ProjectService, ProjectState,
    ProjectType,
};
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    page: Option<u32>,
    limit: Option<u32>,
    sort: Option<String>,
    order: Option<String>,
    state: Option<String>,
    #[serde(rename = "type")]
    project_type: Option<String>,
    card_type: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DraftParams {
    draft: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    permanent: Option<bool>,
}

/// Runs a service call on the save pipeline pool; saturation arrives as `ProjectError::Busy`.
async fn run<T, F>(state: &AppState, operation: &'static str, task: F) -> Result<T, HttpResponse>
where
    F: FnOnce(&ProjectService) -> Result<T, ProjectError> + Send + 'static,
    T: Send + 'static,
{
    let service = state.projects.clone();
    state
        .blocking
        .run(operation, move || task(service.as_ref()))
        .await
        .map_err(|err: ProjectError| project_error_response(operation, &err))
}

fn parse_id(raw: &str) -> Result<ProjectId, HttpResponse> {
    ProjectId::parse(raw)
        .map_err(|_| json_error_response("Invalid project ID format", StatusCode::BAD_REQUEST))
}

fn parse_param<T>(raw: Option<&str>) -> Result<Option<T>, HttpResponse>
where
    T: std::str::FromStr<Err = String>,
{
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|err: String| json_error_response(&err, StatusCode::BAD_REQUEST)),
    }
}

fn parse_sort(raw: Option<&str>) -> Result<SortField, HttpResponse> {
    match raw {
        None | Some("") | Some("createdAt") => Ok(SortField::CreatedAt),
        Some("updatedAt") => Ok(SortField::UpdatedAt),
        Some("projectTitle") => Ok(SortField::ProjectTitle),
        Some(other) => Err(json_error_response(
            &format!("Unsupported sort field '{}'", other),
            StatusCode::BAD_REQUEST,
        )),
    }
}

fn parse_order(raw: Option<&str>) -> SortOrder {
    match raw {
        Some("asc") => SortOrder::Asc,
        _ => SortOrder::Desc,
    }
}

fn into_response<T>(
    result: Result<T, HttpResponse>,
    respond: impl FnOnce(T) -> HttpResponse,
) -> HttpResponse {
    match result {
        Ok(value) => respond(value),
        Err(response) => response,
    }
}

pub async fn list_projects(
    state: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> HttpResponse {
    let params = params.into_inner();

    if let Some(term) = params.search.clone().filter(|term| !term.trim().is_empty()) {
        let limit = params.limit.unwrap_or(0);
        return into_response(
            run(&state, "search projects", move |service| service.search(&term, limit)).await,
            |projects| success(projects),
        );
    }

    let query = match build_query(&params) {
        Ok(query) => query,
        Err(response) => return response,
    };
    into_response(
        run(&state, "list projects", move |service| service.list(&query)).await,
        |page| {
            HttpResponse::Ok().json(json!({
                "success": true,
                "data": page.projects,
                "pagination": page.pagination,
            }))
        },
    )
}

fn build_query(params: &ListParams) -> Result<ProjectQuery, HttpResponse> {
    Ok(ProjectQuery {
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(0),
        sort: parse_sort(params.sort.as_deref())?,
        order: parse_order(params.order.as_deref()),
        state: parse_param::<ProjectState>(params.state.as_deref())?,
        project_type: parse_param::<ProjectType>(params.project_type.as_deref())?,
        card_type: parse_param::<ProjectType>(params.card_type.as_deref())?,
    })
}

pub async fn project_stats(state: web::Data<AppState>) -> HttpResponse {
    into_response(
        run(&state, "load project statistics", |service| service.stats()).await,
        |stats| success(stats),
    )
}

pub async fn search_projects(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> HttpResponse {
    let params = params.into_inner();
    let term = params.q.unwrap_or_default();
    let limit = params.limit.unwrap_or(0);
    let echoed = term.trim().to_string();
    into_response(
        run(&state, "search projects", move |service| service.search(&term, limit)).await,
        |projects| {
            HttpResponse::Ok().json(json!({
                "success": true,
                "data": projects,
                "searchTerm": echoed,
            }))
        },
    )
}

pub async fn projects_by_state(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<LimitParams>,
) -> HttpResponse {
    let project_state = match path.parse::<ProjectState>() {
        Ok(project_state) => project_state,
        Err(err) => return json_error_response(&err, StatusCode::BAD_REQUEST),
    };
    let limit = params.limit.unwrap_or(0);
    into_response(
        run(&state, "list projects by state", move |service| {
            service.by_state(project_state, limit)
        })
        .await,
        |projects| success(projects),
    )
}

pub async fn projects_by_type(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<LimitParams>,
) -> HttpResponse {
    let project_type = match path.parse::<ProjectType>() {
        Ok(project_type) => project_type,
        Err(err) => return json_error_response(&err, StatusCode::BAD_REQUEST),
    };
    let limit = params.limit.unwrap_or(0);
    into_response(
        run(&state, "list projects by type", move |service| {
            service.by_type(project_type, limit)
        })
        .await,
        |projects| success(projects),
    )
}

pub async fn project_by_slug(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let slug = path.into_inner();
    into_response(
        run(&state, "load project by slug", move |service| service.get_by_slug(&slug)).await,
        |project| success(project),
    )
}

pub async fn project_by_id(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = match parse_id(&path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    into_response(
        run(&state, "load project", move |service| service.get_by_id(id)).await,
        |project| success(project),
    )
}

async fn read_save_request(
    state: &AppState,
    payload: Multipart,
) -> Result<(ProjectInput, crate::assets::FileBatch), HttpResponse> {
    let ParsedMultipart { fields, files } =
        read_multipart(payload, &state.runtime_paths.incoming_dir, state.upload_limits)
            .await
            .map_err(|err| multipart_error_response(&err))?;
    let input = ProjectInput::from_form(&fields)
        .map_err(|err| project_error_response("parse project form", &err.into()))?;
    Ok((input, files))
}

pub async fn create_project(
    state: web::Data<AppState>,
    params: web::Query<DraftParams>,
    payload: Multipart,
) -> HttpResponse {
    let draft = params.draft.unwrap_or(false);
    let (input, files) = match read_save_request(&state, payload).await {
        Ok(request) => request,
        Err(response) => return response,
    };
    into_response(
        run(&state, "create project", move |service| {
            service.create(input, files, draft)
        })
        .await,
        |project| {
            let message = if draft {
                "Draft saved successfully"
            } else {
                "Project created successfully"
            };
            success_with_message(StatusCode::CREATED, message, project)
        },
    )
}

pub async fn update_project(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<DraftParams>,
    payload: Multipart,
) -> HttpResponse {
    let id = match parse_id(&path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let draft = params.draft.unwrap_or(false);
    let (input, files) = match read_save_request(&state, payload).await {
        Ok(request) => request,
        Err(response) => return response,
    };
    into_response(
        run(&state, "update project", move |service| {
            service.update(id, input, files, draft)
        })
        .await,
        |project| {
            let message = if draft {
                "Draft saved successfully"
            } else {
                "Project updated successfully"
            };
            success_with_message(StatusCode::OK, message, project)
        },
    )
}

pub async fn delete_project(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<DeleteParams>,
) -> HttpResponse {
    let id = match parse_id(&path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let mode = if params.permanent.unwrap_or(true) {
        DeleteMode::Permanent
    } else {
        DeleteMode::Soft
    };
    into_response(
        run(&state, "delete project", move |service| service.delete(id, mode)).await,
        |project| {
            let message = match mode {
                DeleteMode::Permanent => "Project deleted permanently",
                DeleteMode::Soft => "Project deactivated",
            };
            success_with_message(StatusCode::OK, message, json!({ "id": project.id }))
        },
    )
}

pub async fn toggle_project_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    let id = match parse_id(&path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Some(is_active) = body.get("isActive").and_then(Value::as_bool) else {
        return json_error_response("isActive must be a boolean value", StatusCode::BAD_REQUEST);
    };
    into_response(
        run(&state, "toggle project status", move |service| {
            service.toggle_status(id, is_active)
        })
        .await,
        |project| {
            let message = if is_active {
                "Project activated successfully"
            } else {
                "Project deactivated successfully"
            };
            success_with_message(StatusCode::OK, message, project)
        },
    )
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpResponse, web};
use serde_json::json;

pub mod multipart;
mod projects;
pub mod response;

pub use multipart::UploadLimits;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api/projects")
            .route("", web::get().to(projects::list_projects))
            .route("", web::post().to(projects::create_project))
            .route("/stats", web::get().to(projects::project_stats))
            .route("/search", web::get().to(projects::search_projects))
            .route("/state/{state}", web::get().to(projects::projects_by_state))
            .route("/type/{type}", web::get().to(projects::projects_by_type))
            .route("/slug/{slug}", web::get().to(projects::project_by_slug))
            .route(
                "/{id}/toggle-status",
                web::patch().to(projects::toggle_project_status),
            )
            .route("/{id}", web::get().to(projects::project_by_id))
            .route("/{id}", web::put().to(projects::update_project))
            .route("/{id}", web::delete().to(projects::delete_project)),
    );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

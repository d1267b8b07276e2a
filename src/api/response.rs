// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::multipart::MultipartReadError;
use crate::projects::{ProjectError, ProjectErrorKind};
use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header;
use serde::Serialize;
use serde_json::json;

const RETRY_AFTER_SECS: u64 = 1;

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

pub fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope {
        success: true,
        message: None,
        data: Some(data),
    })
}

pub fn success_with_message<T: Serialize>(status: StatusCode, message: &str, data: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        success: true,
        message: Some(message.to_string()),
        data: Some(data),
    })
}

pub fn json_error_response(message: &str, status_code: StatusCode) -> HttpResponse {
    HttpResponse::build(status_code).json(json!({
        "success": false,
        "message": message,
    }))
}

/// Log detailed error server-side and return generic JSON error response to client
pub fn log_and_return_generic_error(
    operation: &str,
    error: &dyn std::fmt::Display,
    status_code: StatusCode,
) -> HttpResponse {
    log::error!("Failed to {}: {}", operation, error);

    let generic_message = match status_code {
        StatusCode::SERVICE_UNAVAILABLE => "Server is busy, please retry shortly",
        StatusCode::INTERNAL_SERVER_ERROR => "An internal error occurred",
        _ => "An error occurred",
    };

    json_error_response(generic_message, status_code)
}

pub fn project_error_response(operation: &str, error: &ProjectError) -> HttpResponse {
    match error.kind() {
        ProjectErrorKind::Validation => {
            let errors = match error {
                ProjectError::Validation(errors) => errors.clone(),
                other => vec![other.to_string()],
            };
            log::info!("Rejected {}: {}", operation, errors.join("; "));
            HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": "Validation failed",
                "errors": errors,
            }))
        }
        ProjectErrorKind::NotFound => json_error_response(&error.to_string(), StatusCode::NOT_FOUND),
        ProjectErrorKind::Conflict => {
            log::info!("Conflict during {}: {}", operation, error);
            json_error_response(&error.to_string(), StatusCode::CONFLICT)
        }
        ProjectErrorKind::Busy => {
            log::warn!("Shedding {}: {}", operation, error);
            HttpResponse::ServiceUnavailable()
                .insert_header((header::RETRY_AFTER, RETRY_AFTER_SECS.to_string()))
                .json(json!({
                    "success": false,
                    "message": "Server is busy, please retry shortly",
                }))
        }
        ProjectErrorKind::AssetWrite
        | ProjectErrorKind::Persistence
        | ProjectErrorKind::Internal => {
            log_and_return_generic_error(operation, error, StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub fn multipart_error_response(error: &MultipartReadError) -> HttpResponse {
    if error.is_client_error() {
        json_error_response(&error.to_string(), StatusCode::BAD_REQUEST)
    } else {
        log_and_return_generic_error("read upload", error, StatusCode::INTERNAL_SERVER_ERROR)
    }
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::test;
use common::{MultipartBody, PDF_BYTES, PNG_BYTES, TestHarness};
use serde_json::{Value, json};

fn project_form(title: &str) -> MultipartBody {
    MultipartBody::new()
        .text("projectTitle", title)
        .text("shortAddress", "12 Lake Road")
        .text("projectState", "on-going")
        .text("projectType", "residential")
        .text("cardProjectType", "commercial")
        .text("description1", "Homes by the lake")
}

fn multipart_request(method: &str, uri: &str, body: MultipartBody) -> test::TestRequest {
    let (content_type, payload) = body.finish();
    let request = match method {
        "PUT" => test::TestRequest::put(),
        _ => test::TestRequest::post(),
    };
    request
        .uri(uri)
        .insert_header((CONTENT_TYPE, content_type))
        .set_payload(payload)
}

async fn read_json(resp: actix_web::dev::ServiceResponse) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).expect("json body")
}

#[actix_web::test]
async fn health_reports_ok() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await, json!({ "status": "ok" }));
}

#[actix_web::test]
async fn multipart_create_stores_uploads() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    let body = project_form("Lakeview Residency")
        .text("floorPlans", r#"[{"title":"2 BHK","alt":"two"}]"#)
        .file("cardImage", "card.png", "image/png", PNG_BYTES)
        .file("brochure", "brochure.pdf", "application/pdf", PDF_BYTES)
        .file("floorPlanImages", "plan.png", "image/png", PNG_BYTES);
    let resp = test::call_service(&app, multipart_request("POST", "/api/projects", body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = read_json(resp).await;
    assert_eq!(json["success"], json!(true));
    assert_eq!(json["message"], json!("Project created successfully"));
    let data = &json["data"];
    assert_eq!(data["slug"], json!("lakeview-residency"));
    assert_eq!(data["version"], json!(1));

    let card = data["cardImage"].as_str().expect("card path");
    assert!(card.starts_with("uploads/projects/lakeview-residency/card_"));
    assert!(harness.asset(card).is_file());
    let plan = data["floorPlans"][0]["image"].as_str().expect("plan path");
    assert!(harness.asset(plan).is_file());
    assert!(data["floorPlans"][0].get("hasNewFile").is_none());

    assert!(common::files_under(&harness.runtime_paths.incoming_dir).is_empty());
}

#[actix_web::test]
async fn wrong_file_type_is_a_validation_error() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    let body = project_form("Palm Grove").file("brochure", "brochure.pdf", "application/pdf", PNG_BYTES);
    let resp = test::call_service(&app, multipart_request("POST", "/api/projects", body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = read_json(resp).await;
    assert_eq!(json["success"], json!(false));
    assert_eq!(json["message"], json!("Validation failed"));
    assert!(json["errors"].as_array().is_some_and(|errors| !errors.is_empty()));
    assert!(common::files_under(&harness.runtime_paths.uploads_dir).is_empty());
}

#[actix_web::test]
async fn malformed_collection_json_is_rejected() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    let body = project_form("Palm Grove").text("amenities", "[{not json");
    let resp = test::call_service(&app, multipart_request("POST", "/api/projects", body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await["message"], json!("Validation failed"));
}

#[actix_web::test]
async fn update_merges_and_reports_conflicts() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    let first = read_json(
        test::call_service(
            &app,
            multipart_request("POST", "/api/projects", project_form("Palm Grove")).to_request(),
        )
        .await,
    )
    .await;
    let second = read_json(
        test::call_service(
            &app,
            multipart_request("POST", "/api/projects", project_form("Royal Palms")).to_request(),
        )
        .await,
    )
    .await;
    let id = second["data"]["id"].as_str().expect("id").to_string();

    let body = MultipartBody::new()
        .text("shortAddress", "14 Lake Road")
        .file("cardImage", "card.png", "image/png", PNG_BYTES);
    let resp = test::call_service(
        &app,
        multipart_request("PUT", &format!("/api/projects/{}", id), body).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = read_json(resp).await;
    assert_eq!(updated["message"], json!("Project updated successfully"));
    assert_eq!(updated["data"]["shortAddress"], json!("14 Lake Road"));
    assert_eq!(updated["data"]["projectTitle"], json!("Royal Palms"));
    assert_eq!(updated["data"]["version"], json!(2));

    let taken = first["data"]["slug"].as_str().expect("slug");
    let body = MultipartBody::new().text("slug", taken);
    let resp = test::call_service(
        &app,
        multipart_request("PUT", &format!("/api/projects/{}", id), body).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body = MultipartBody::new()
        .text("expectedVersion", "1")
        .text("shortAddress", "Elsewhere");
    let resp = test::call_service(
        &app,
        multipart_request("PUT", &format!("/api/projects/{}", id), body).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn lookups_validate_identifiers() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/projects/not-an-id").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/projects/00000000000000ff")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/projects/type/villa").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/projects/search?q=a").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn list_paginates_and_filters() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    for title in ["Palm Grove", "Royal Palms", "Lake Shore"] {
        let resp = test::call_service(
            &app,
            multipart_request("POST", "/api/projects", project_form(title)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/projects?limit=2&sort=projectTitle&order=asc")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = read_json(resp).await;
    let data = json["data"].as_array().expect("data");
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["projectTitle"], json!("Lake Shore"));
    assert_eq!(json["pagination"]["total"], json!(3));
    assert_eq!(json["pagination"]["pages"], json!(2));
    assert_eq!(json["pagination"]["hasNext"], json!(true));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/projects?state=finished")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/projects/search?q=royal")
            .to_request(),
    )
    .await;
    let json = read_json(resp).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["searchTerm"], json!("royal"));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/projects/stats").to_request(),
    )
    .await;
    let json = read_json(resp).await;
    assert_eq!(json["data"]["total"], json!(3));
    assert_eq!(json["data"]["byState"]["onGoing"], json!(3));
    assert_eq!(json["data"]["byType"]["commercial"], json!(3));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/projects/slug/royal-palms")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn toggle_status_requires_boolean() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    let created = read_json(
        test::call_service(
            &app,
            multipart_request("POST", "/api/projects", project_form("Palm Grove")).to_request(),
        )
        .await,
    )
    .await;
    let uri = format!(
        "/api/projects/{}/toggle-status",
        created["data"]["id"].as_str().expect("id")
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "isActive": "no" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(resp).await["message"],
        json!("isActive must be a boolean value")
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "isActive": false }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["data"]["isActive"], json!(false));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/projects/slug/palm-grove")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn permanent_delete_removes_record_and_files() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    let body = project_form("Palm Grove").file("cardImage", "card.png", "image/png", PNG_BYTES);
    let created = read_json(
        test::call_service(&app, multipart_request("POST", "/api/projects", body).to_request()).await,
    )
    .await;
    let id = created["data"]["id"].as_str().expect("id").to_string();
    let card = created["data"]["cardImage"].as_str().expect("card").to_string();
    assert!(harness.asset(&card).is_file());

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/projects/{}", id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!harness.asset(&card).exists());
    assert!(!harness.project_dir("palm-grove").exists());

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/projects/{}", id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn draft_create_skips_required_fields() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_state.clone())).await;

    let body = MultipartBody::new().text("projectTitle", "Half Done");
    let resp = test::call_service(
        &app,
        multipart_request("POST", "/api/projects?draft=true", body).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = read_json(resp).await;
    assert_eq!(json["data"]["isDraft"], json!(true));
    assert_eq!(json["data"]["slug"], json!("half-done"));
}

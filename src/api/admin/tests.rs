use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::repositories;
use crate::test_support;

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn admin_login_issues_token_and_rejects_others() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "Root Admin", "root@academy.test").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/admin/login",
            None,
            Some(json!({ "email": admin.email, "password": "test-password" })),
        ))
        .await
        .expect("admin login");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["role"], "admin");

    // valid credentials on a non-admin account still fail here
    let student =
        test_support::insert_student(ctx.state.db(), "Not Admin", "na@academy.test").await;
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/admin/login",
            None,
            Some(json!({ "email": student.email, "password": "test-password" })),
        ))
        .await
        .expect("admin login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn teacher_approval_unlocks_login() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "Gate Admin", "ga@academy.test").await;
    let teacher = test_support::insert_teacher(
        ctx.state.db(),
        "Waiting Teacher",
        "waiting@academy.test",
        false,
    )
    .await;

    // blocked while pending
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": teacher.email, "password": "test-password" })),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_token = test_support::bearer_token(&admin, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/admin/pending-teachers",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("pending teachers");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().expect("array").len(), 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/admin/approve-teacher/{}", teacher.id),
            Some(&admin_token),
            Some(json!({ "action": "approve" })),
        ))
        .await
        .expect("approve teacher");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": teacher.email, "password": "test-password" })),
        ))
        .await
        .expect("login");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert!(body["token"].is_string());
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn approving_a_course_request_materializes_the_course() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "Course Admin", "ca@academy.test").await;
    let teacher = test_support::insert_teacher(
        ctx.state.db(),
        "Request Teacher",
        "rt@academy.test",
        true,
    )
    .await;
    let teacher_token = test_support::bearer_token(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/courses",
            Some(&teacher_token),
            Some(json!({
                "title": "Requested Course",
                "subject": "physics",
                "grade": 11,
                "description": "Mechanics"
            })),
        ))
        .await
        .expect("request course");
    let body = test_support::read_json(response).await;
    let request_id = body["request_id"].as_str().expect("request id").to_string();

    let admin_token = test_support::bearer_token(&admin, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/admin/approve-course/{request_id}"),
            Some(&admin_token),
            Some(json!({ "action": "approve", "admin_notes": "looks good" })),
        ))
        .await
        .expect("approve course");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let courses =
        repositories::courses::list_approved(ctx.state.db()).await.expect("list courses");
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].title, "Requested Course");
    assert_eq!(courses[0].teacher_id, teacher.id);
    assert!(courses[0].is_approved);
    assert!(courses[0].approval_date.is_some());

    // terminal requests cannot be re-reviewed
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/admin/approve-course/{request_id}"),
            Some(&admin_token),
            Some(json!({ "action": "reject" })),
        ))
        .await
        .expect("re-review");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["message"], "Request already processed");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn reviewing_a_missing_request_returns_not_found() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "Lost Admin", "la@academy.test").await;
    let admin_token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/admin/approve-course/{}", uuid::Uuid::new_v4()),
            Some(&admin_token),
            Some(json!({ "action": "approve" })),
        ))
        .await
        .expect("review missing request");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "response: {body}");
    assert_eq!(body["message"], "Request not found");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn rejecting_a_course_request_creates_nothing() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "Reject Admin", "ra@academy.test").await;
    let teacher = test_support::insert_teacher(
        ctx.state.db(),
        "Rejected Teacher",
        "rejt@academy.test",
        true,
    )
    .await;
    let teacher_token = test_support::bearer_token(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/courses",
            Some(&teacher_token),
            Some(json!({
                "title": "Doomed Course",
                "subject": "chemistry",
                "grade": 10
            })),
        ))
        .await
        .expect("request course");
    let body = test_support::read_json(response).await;
    let request_id = body["request_id"].as_str().expect("request id").to_string();

    let admin_token = test_support::bearer_token(&admin, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/admin/approve-course/{request_id}"),
            Some(&admin_token),
            Some(json!({ "action": "reject", "admin_notes": "duplicate content" })),
        ))
        .await
        .expect("reject course");
    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["admin_notes"], "duplicate content");

    let courses =
        repositories::courses::list_approved(ctx.state.db()).await.expect("list courses");
    assert!(courses.is_empty());
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn dashboard_counts_platform_entities() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "Dash Admin", "da@academy.test").await;
    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Dash Teacher", "dat@academy.test", true)
            .await;
    test_support::insert_teacher(ctx.state.db(), "Dash Pending", "dap@academy.test", false).await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "Algebra").await;
    let student =
        test_support::insert_student(ctx.state.db(), "Dash Student", "das@academy.test").await;
    test_support::insert_enrollment(ctx.state.db(), &student, &course).await;

    let token = test_support::bearer_token(&admin, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/admin/dashboard-stats",
            Some(&token),
            None,
        ))
        .await
        .expect("dashboard");
    let body = test_support::read_json(response).await;
    assert_eq!(body["total_students"], 1);
    assert_eq!(body["total_teachers"], 2);
    assert_eq!(body["total_courses"], 1);
    assert_eq!(body["total_enrollments"], 1);
    assert_eq!(body["pending_teachers"], 1);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn admin_endpoints_reject_non_admin_tokens() {
    let ctx = test_support::setup_test_context().await;

    let student =
        test_support::insert_student(ctx.state.db(), "Sneaky Student", "ss@academy.test").await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/admin/dashboard-stats",
            Some(&token),
            None,
        ))
        .await
        .expect("dashboard");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn admin_cannot_be_deleted_through_the_api() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "Del Admin", "dela@academy.test").await;
    let other = test_support::insert_admin(ctx.state.db(), "Other Admin", "oa@academy.test").await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/admin/users/{}", other.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete admin");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let student =
        test_support::insert_student(ctx.state.db(), "Del Student", "dels@academy.test").await;
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/admin/users/{}", student.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete student");
    assert_eq!(response.status(), StatusCode::OK);

    let found =
        repositories::users::find_by_id(ctx.state.db(), student.id).await.expect("find user");
    assert!(found.is_none());
}

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn student_registration_assigns_sequential_student_ids() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "role": "student",
                "name": "First Student",
                "email": "first@academy.test",
                "password": "s3cure-pass",
                "grade": 9,
                "division": "science"
            })),
        ))
        .await
        .expect("register");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["student_id"], "STU000001");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "role": "student",
                "name": "Second Student",
                "email": "second@academy.test",
                "password": "s3cure-pass",
                "grade": 5
            })),
        ))
        .await
        .expect("register");
    let body = test_support::read_json(response).await;
    assert_eq!(body["user"]["student_id"], "STU000002");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn division_is_required_from_grade_nine() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "role": "student",
                "name": "No Division",
                "email": "nodiv@academy.test",
                "password": "s3cure-pass",
                "grade": 10
            })),
        ))
        .await
        .expect("register");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn teacher_registration_withholds_the_token() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "role": "teacher",
                "name": "New Teacher",
                "email": "newteacher@academy.test",
                "password": "s3cure-pass",
                "subject": "physics",
                "experience_years": 4
            })),
        ))
        .await
        .expect("register");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert!(body["token"].is_null());
    assert!(body["message"].as_str().expect("message").contains("pending"));
    assert_eq!(body["user"]["is_approved"], false);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn parent_registration_requires_an_existing_student() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "role": "parent",
                "name": "Orphan Parent",
                "email": "op@academy.test",
                "password": "s3cure-pass",
                "child_student_id": "STU999999"
            })),
        ))
        .await
        .expect("register");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["message"], "Student ID not found");

    let child =
        test_support::insert_student(ctx.state.db(), "Real Child", "realchild@academy.test").await;
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "role": "parent",
                "name": "Linked Parent",
                "email": "lp@academy.test",
                "password": "s3cure-pass",
                "childStudentId": child.student_id
            })),
        ))
        .await
        .expect("register");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["user"]["child_student_id"], child.student_id.expect("student id"));
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn duplicate_email_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    test_support::insert_student(ctx.state.db(), "Taken Email", "taken@academy.test").await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "role": "student",
                "name": "Copy Cat",
                "email": "Taken@academy.test",
                "password": "s3cure-pass",
                "grade": 3
            })),
        ))
        .await
        .expect("register");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["message"], "An account with this email already exists");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn verify_student_is_public() {
    let ctx = test_support::setup_test_context().await;

    let student =
        test_support::insert_student(ctx.state.db(), "Visible Student", "vs@academy.test").await;
    let student_number = student.student_id.expect("student id");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/auth/verify-student/{student_number}"),
            None,
            None,
        ))
        .await
        .expect("verify");
    let body = test_support::read_json(response).await;
    assert_eq!(body["exists"], true);
    assert_eq!(body["name"], "Visible Student");
    assert_eq!(body["grade"], 9);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/auth/verify-student/STU424242",
            None,
            None,
        ))
        .await
        .expect("verify");
    let body = test_support::read_json(response).await;
    assert_eq!(body["exists"], false);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn profile_update_can_rotate_the_password() {
    let ctx = test_support::setup_test_context().await;

    let student =
        test_support::insert_student(ctx.state.db(), "Rotate Student", "rot@academy.test").await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            "/api/auth/profile",
            Some(&token),
            Some(json!({ "name": "Renamed Student", "password": "brand-new-pass" })),
        ))
        .await
        .expect("update profile");
    let body = test_support::read_json(response).await;
    assert_eq!(body["name"], "Renamed Student");

    // old password no longer works, new one does
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": student.email, "password": "test-password" })),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": student.email, "password": "brand-new-pass" })),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
}

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::{RequestStatus, RequestType};
use crate::repositories;
use crate::test_support;

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn course_creation_records_a_pending_request() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Alice Teacher", "alice@academy.test", true)
            .await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/courses",
            Some(&token),
            Some(json!({
                "title": "Algebra Basics",
                "subject": "mathematics",
                "grade": 9,
                "description": "Linear equations and inequalities"
            })),
        ))
        .await
        .expect("create course");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["success"], true);
    assert!(body["request_id"].is_string());

    let requests = repositories::requests::list(ctx.state.db(), Some(RequestStatus::Pending))
        .await
        .expect("list requests");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].request_type, RequestType::CourseCreation);
    assert_eq!(requests[0].requester_id, teacher.id);

    // no course exists until an admin approves the request
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/courses", None, None))
        .await
        .expect("list courses");
    let catalog = test_support::read_json(response).await;
    assert_eq!(catalog.as_array().expect("array").len(), 0);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn unapproved_teacher_cannot_create_courses() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Bob Pending", "bob@academy.test", false)
            .await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/courses",
            Some(&token),
            Some(json!({
                "title": "Geometry",
                "subject": "mathematics",
                "grade": 8
            })),
        ))
        .await
        .expect("create course");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "response: {body}");
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn duplicate_course_title_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Carol Teacher", "carol@academy.test", true)
            .await;
    test_support::insert_approved_course(ctx.state.db(), &teacher, "Chemistry 101").await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/courses",
            Some(&token),
            Some(json!({
                "title": "chemistry 101",
                "subject": "chemistry",
                "grade": 10
            })),
        ))
        .await
        .expect("create course");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn catalog_hides_unapproved_courses() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Dana Teacher", "dana@academy.test", true)
            .await;
    let course =
        test_support::insert_approved_course(ctx.state.db(), &teacher, "Physics").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/courses", None, None))
        .await
        .expect("list courses");
    let catalog = test_support::read_json(response).await;
    assert_eq!(catalog.as_array().expect("array").len(), 1);
    assert_eq!(catalog[0]["title"], "Physics");
    assert_eq!(catalog[0]["teacher_name"], "Dana Teacher");

    sqlx::query("UPDATE courses SET is_approved = FALSE WHERE id = $1")
        .bind(course.id)
        .execute(ctx.state.db())
        .await
        .expect("unapprove course");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/courses", None, None))
        .await
        .expect("list courses");
    let catalog = test_support::read_json(response).await;
    assert_eq!(catalog.as_array().expect("array").len(), 0);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/courses/{}", course.id),
            None,
            None,
        ))
        .await
        .expect("course detail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn owner_can_delete_their_course() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Erin Teacher", "erin@academy.test", true)
            .await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "Biology").await;
    test_support::insert_video(ctx.state.db(), &course, "Cells").await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/courses/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete course");
    assert_eq!(response.status(), StatusCode::OK);

    let found = repositories::courses::find_by_id(ctx.state.db(), course.id)
        .await
        .expect("find course");
    assert!(found.is_none());
    let videos = repositories::videos::list_by_course(ctx.state.db(), course.id)
        .await
        .expect("list videos");
    assert!(videos.is_empty());
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn student_cannot_delete_a_course() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Frank Teacher", "frank@academy.test", true)
            .await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "History").await;
    let student =
        test_support::insert_student(ctx.state.db(), "Sam Student", "sam@academy.test").await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/courses/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete course");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

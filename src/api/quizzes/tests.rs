use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::repositories;
use crate::test_support;

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn student_view_never_exposes_correct_answers() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Quiz Teacher", "qt@academy.test", true)
            .await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "Algebra").await;
    let quiz = test_support::insert_quiz(ctx.state.db(), &course, "Midterm").await;
    let student =
        test_support::insert_student(ctx.state.db(), "Quiz Student", "qs@academy.test").await;
    test_support::insert_enrollment(ctx.state.db(), &student, &course).await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/quizzes/{}", quiz.id),
            Some(&token),
            None,
        ))
        .await
        .expect("quiz detail");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let questions = body["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 8);
    for question in questions {
        assert!(question["correct_answer"].is_null(), "leaked: {question}");
        assert_eq!(question["options"].as_array().expect("options").len(), 4);
    }

    // the owning teacher still sees the stored layout
    let teacher_token = test_support::bearer_token(&teacher, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/quizzes/{}", quiz.id),
            Some(&teacher_token),
            None,
        ))
        .await
        .expect("quiz detail");
    let body = test_support::read_json(response).await;
    assert_eq!(body["questions"][0]["correct_answer"], 1);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn submission_grades_and_tracks_best_score() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Grade Teacher", "gt@academy.test", true)
            .await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "Algebra").await;
    let quiz = test_support::insert_quiz(ctx.state.db(), &course, "Final").await;
    let student =
        test_support::insert_student(ctx.state.db(), "Grade Student", "gs@academy.test").await;
    test_support::insert_enrollment(ctx.state.db(), &student, &course).await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    // five correct out of eight rounds up to 63, below the 60 pass mark it is not
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/quizzes/{}/submit", quiz.id),
            Some(&token),
            Some(json!({ "answers": [1, 1, 1, 1, 1, 0, 0, 0] })),
        ))
        .await
        .expect("submit");
    let body = test_support::read_json(response).await;
    assert_eq!(body["score"], 63);
    assert_eq!(body["correct_answers"], 5);
    assert_eq!(body["passed"], true);
    assert_eq!(body["attempts_used"], 1);
    assert_eq!(body["attempts_left"], 2);

    // a worse retake does not lower the recorded best score
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/quizzes/{}/submit", quiz.id),
            Some(&token),
            Some(json!({ "answers": [0, 0, 0, 0, 0, 0, 0, 0] })),
        ))
        .await
        .expect("submit");
    let body = test_support::read_json(response).await;
    assert_eq!(body["score"], 0);
    assert_eq!(body["passed"], false);
    assert_eq!(body["best_score"], 63);

    let enrollment = repositories::enrollments::find_by_student_course(
        ctx.state.db(),
        student.id,
        course.id,
    )
    .await
    .expect("find enrollment")
    .expect("enrollment");
    assert_eq!(enrollment.quiz_scores.0.get(&quiz.id), Some(&63));
    assert!(enrollment.completed_quizzes.0.contains(&quiz.id));
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn attempt_cap_is_enforced() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Cap Teacher", "ct@academy.test", true).await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "Algebra").await;
    let quiz = test_support::insert_quiz(ctx.state.db(), &course, "Capped").await;
    let student =
        test_support::insert_student(ctx.state.db(), "Cap Student", "cs@academy.test").await;
    test_support::insert_enrollment(ctx.state.db(), &student, &course).await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    for _ in 0..3 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/quizzes/{}/submit", quiz.id),
                Some(&token),
                Some(json!({ "answers": [1, 1, 1, 1, 1, 1, 1, 1] })),
            ))
            .await
            .expect("submit");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/quizzes/{}/submit", quiz.id),
            Some(&token),
            Some(json!({ "answers": [1, 1, 1, 1, 1, 1, 1, 1] })),
        ))
        .await
        .expect("submit");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["message"], "Maximum attempts reached");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn wrong_answer_count_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Len Teacher", "lt@academy.test", true).await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "Algebra").await;
    let quiz = test_support::insert_quiz(ctx.state.db(), &course, "Short").await;
    let student =
        test_support::insert_student(ctx.state.db(), "Len Student", "ls@academy.test").await;
    test_support::insert_enrollment(ctx.state.db(), &student, &course).await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/quizzes/{}/submit", quiz.id),
            Some(&token),
            Some(json!({ "answers": [1, 1, 1] })),
        ))
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn quiz_creation_requires_exactly_eight_questions() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Shape Teacher", "st@academy.test", true)
            .await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "Algebra").await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let question = json!({
        "text": "Pick b",
        "options": ["a", "b", "c", "d"],
        "correct_answer": 1
    });
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/quizzes",
            Some(&token),
            Some(json!({
                "course_id": course.id,
                "title": "Too short",
                "questions": [question.clone(), question.clone(), question]
            })),
        ))
        .await
        .expect("create quiz");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn quiz_defaults_fill_omitted_settings() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Def Teacher", "deft@academy.test", true)
            .await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "Algebra").await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let questions: Vec<_> = (0..8)
        .map(|i| {
            json!({
                "text": format!("Question {i}"),
                "options": ["a", "b", "c", "d"],
                "correct_answer": 1
            })
        })
        .collect();
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/quizzes",
            Some(&token),
            Some(json!({
                "course_id": course.id,
                "title": "Bare-bones quiz",
                "questions": questions
            })),
        ))
        .await
        .expect("create quiz");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["passing_score"], 60);
    assert_eq!(body["time_limit_minutes"], 15);
    assert_eq!(body["max_attempts"], 3);
}

#[tokio::test]
#[ignore = "requires a local Postgres"]
async fn unenrolled_student_cannot_read_quizzes() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "Gate Teacher", "gate@academy.test", true)
            .await;
    let course = test_support::insert_approved_course(ctx.state.db(), &teacher, "Algebra").await;
    let quiz = test_support::insert_quiz(ctx.state.db(), &course, "Gated").await;
    let student =
        test_support::insert_student(ctx.state.db(), "Gate Student", "gsx@academy.test").await;
    let token = test_support::bearer_token(&student, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/quizzes/{}", quiz.id),
            Some(&token),
            None,
        ))
        .await
        .expect("quiz detail");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

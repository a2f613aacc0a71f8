use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Quiz, QuizQuestion};
use crate::services::grading::SanitizedQuestion;

#[derive(Debug, Deserialize)]
pub(crate) struct QuizQuestionPayload {
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: usize,
}

impl QuizQuestionPayload {
    pub(crate) fn into_question(self) -> QuizQuestion {
        QuizQuestion {
            text: self.text,
            options: self.options,
            correct_answer: self.correct_answer,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    pub(crate) course_id: Uuid,
    #[serde(default)]
    pub(crate) video_id: Option<Uuid>,
    #[validate(length(min = 3, max = 200))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    pub(crate) questions: Vec<QuizQuestionPayload>,
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub(crate) passing_score: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 1, max = 180))]
    pub(crate) time_limit_minutes: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 1, max = 10))]
    pub(crate) max_attempts: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizSubmit {
    pub(crate) answers: Vec<usize>,
    #[serde(default)]
    pub(crate) time_taken_seconds: Option<i32>,
}

/// Teacher/admin view: questions with correct indices intact.
#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: Uuid,
    pub(crate) course_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) video_id: Option<Uuid>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) questions: Vec<QuizQuestion>,
    pub(crate) passing_score: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) max_attempts: i32,
    pub(crate) created_at: String,
}

impl QuizResponse {
    pub(crate) fn from_db(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            course_id: quiz.course_id,
            video_id: quiz.video_id,
            title: quiz.title,
            description: quiz.description,
            questions: quiz.questions.0,
            passing_score: quiz.passing_score,
            time_limit_minutes: quiz.time_limit_minutes,
            max_attempts: quiz.max_attempts,
            created_at: format_primitive(quiz.created_at),
        }
    }
}

/// Student view: correct indices stripped, order shuffled per request.
#[derive(Debug, Serialize)]
pub(crate) struct SanitizedQuizResponse {
    pub(crate) id: Uuid,
    pub(crate) course_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) video_id: Option<Uuid>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) questions: Vec<SanitizedQuestion>,
    pub(crate) passing_score: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) max_attempts: i32,
}

impl SanitizedQuizResponse {
    pub(crate) fn from_db(quiz: Quiz, questions: Vec<SanitizedQuestion>) -> Self {
        Self {
            id: quiz.id,
            course_id: quiz.course_id,
            video_id: quiz.video_id,
            title: quiz.title,
            description: quiz.description,
            questions,
            passing_score: quiz.passing_score,
            time_limit_minutes: quiz.time_limit_minutes,
            max_attempts: quiz.max_attempts,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizSubmitResponse {
    pub(crate) score: i32,
    pub(crate) passed: bool,
    pub(crate) correct_answers: usize,
    pub(crate) best_score: i32,
    pub(crate) attempts_used: i64,
    pub(crate) attempts_left: i64,
}

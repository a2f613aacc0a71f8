use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::db::models::QuizQuestion;

/// Every quiz carries exactly this many questions.
pub(crate) const QUESTION_COUNT: usize = 8;
/// Every question carries exactly this many options.
pub(crate) const OPTION_COUNT: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum GradingError {
    #[error("quiz must contain exactly {QUESTION_COUNT} questions")]
    WrongQuestionCount,
    #[error("each question must offer exactly {OPTION_COUNT} options")]
    WrongOptionCount,
    #[error("correct answer index out of range")]
    CorrectAnswerOutOfRange,
    #[error("question text must not be empty")]
    EmptyQuestionText,
    #[error("option text must not be empty")]
    EmptyOptionText,
    #[error("expected exactly {QUESTION_COUNT} answers")]
    WrongAnswerCount,
}

#[derive(Debug, PartialEq)]
pub(crate) struct GradeOutcome {
    pub(crate) score: i32,
    pub(crate) correct_answers: usize,
}

/// Shape check applied before a quiz is stored.
pub(crate) fn validate_questions(questions: &[QuizQuestion]) -> Result<(), GradingError> {
    if questions.len() != QUESTION_COUNT {
        return Err(GradingError::WrongQuestionCount);
    }
    for question in questions {
        if question.text.trim().is_empty() {
            return Err(GradingError::EmptyQuestionText);
        }
        if question.options.len() != OPTION_COUNT {
            return Err(GradingError::WrongOptionCount);
        }
        if question.options.iter().any(|option| option.trim().is_empty()) {
            return Err(GradingError::EmptyOptionText);
        }
        if question.correct_answer >= OPTION_COUNT {
            return Err(GradingError::CorrectAnswerOutOfRange);
        }
    }
    Ok(())
}

/// Grades a submission against the stored question order. The score is the
/// percentage of correct answers rounded to the nearest integer, so 5 of 8
/// yields 63.
pub(crate) fn grade(
    questions: &[QuizQuestion],
    answers: &[usize],
) -> Result<GradeOutcome, GradingError> {
    if answers.len() != QUESTION_COUNT || questions.len() != QUESTION_COUNT {
        return Err(GradingError::WrongAnswerCount);
    }

    let correct_answers = questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| question.correct_answer == **answer)
        .count();

    let score = ((100.0 * correct_answers as f64) / QUESTION_COUNT as f64).round() as i32;

    Ok(GradeOutcome { score, correct_answers })
}

/// A question as shown to students: no correct index, options re-ordered.
#[derive(Debug, serde::Serialize)]
pub(crate) struct SanitizedQuestion {
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
}

/// Strips correct indices and shuffles both question and option order.
/// Grading still runs against the stored order, so submissions reference
/// the stored layout, not the shuffled one.
pub(crate) fn sanitize_for_student<R: Rng>(
    questions: &[QuizQuestion],
    rng: &mut R,
) -> Vec<SanitizedQuestion> {
    let mut sanitized: Vec<SanitizedQuestion> = questions
        .iter()
        .map(|question| {
            let mut options = question.options.clone();
            options.shuffle(rng);
            SanitizedQuestion { text: question.text.clone(), options }
        })
        .collect();
    sanitized.shuffle(rng);
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: usize) -> QuizQuestion {
        QuizQuestion {
            text: "What is 2 + 2?".to_string(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct_answer: correct,
        }
    }

    fn eight_questions() -> Vec<QuizQuestion> {
        (0..8).map(|i| question(i % 4)).collect()
    }

    #[test]
    fn validate_accepts_well_formed_quiz() {
        assert_eq!(validate_questions(&eight_questions()), Ok(()));
    }

    #[test]
    fn validate_rejects_wrong_question_count() {
        let questions: Vec<_> = (0..7).map(|_| question(0)).collect();
        assert_eq!(validate_questions(&questions), Err(GradingError::WrongQuestionCount));
    }

    #[test]
    fn validate_rejects_out_of_range_correct_index() {
        let mut questions = eight_questions();
        questions[3].correct_answer = 4;
        assert_eq!(validate_questions(&questions), Err(GradingError::CorrectAnswerOutOfRange));
    }

    #[test]
    fn validate_rejects_wrong_option_count() {
        let mut questions = eight_questions();
        questions[0].options.pop();
        assert_eq!(validate_questions(&questions), Err(GradingError::WrongOptionCount));
    }

    #[test]
    fn grade_rejects_wrong_answer_count() {
        let questions = eight_questions();
        assert_eq!(grade(&questions, &[0, 1, 2]), Err(GradingError::WrongAnswerCount));
    }

    #[test]
    fn grade_rounds_five_of_eight_to_63() {
        let questions = eight_questions();
        // questions repeat the pattern 0,1,2,3; answer the first five
        // correctly and miss the rest.
        let answers = vec![0, 1, 2, 3, 0, 0, 0, 0];
        let outcome = grade(&questions, &answers).expect("grade");
        assert_eq!(outcome.correct_answers, 5);
        assert_eq!(outcome.score, 63);
    }

    #[test]
    fn grade_full_marks() {
        let questions = eight_questions();
        let answers = vec![0, 1, 2, 3, 0, 1, 2, 3];
        let outcome = grade(&questions, &answers).expect("grade");
        assert_eq!(outcome.correct_answers, 8);
        assert_eq!(outcome.score, 100);
    }

    #[test]
    fn grade_zero_marks() {
        let questions = eight_questions();
        let answers = vec![1, 0, 0, 0, 1, 0, 0, 0];
        let outcome = grade(&questions, &answers).expect("grade");
        assert_eq!(outcome.correct_answers, 0);
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn sanitize_strips_correct_index_and_keeps_options() {
        let questions = eight_questions();
        let mut rng = rand::thread_rng();
        let sanitized = sanitize_for_student(&questions, &mut rng);

        assert_eq!(sanitized.len(), QUESTION_COUNT);
        for question in &sanitized {
            assert_eq!(question.options.len(), OPTION_COUNT);
            let mut options = question.options.clone();
            options.sort();
            assert_eq!(options, vec!["3", "4", "5", "6"]);
        }
    }
}

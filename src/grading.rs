// src/grading.rs

//! Quiz grading and score bookkeeping.
//!
//! Everything here is pure: the submit handler loads the quiz, calls
//! [`grade`], then persists the outcome and uses [`decide`] to settle the
//! user's stored record.

use std::fmt;

use serde::Serialize;

use crate::models::{quiz::Question, score::ScoreRecord};

/// How a single question was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    NotAnswered,
}

/// Review entry for one question of a graded submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_index: usize,
    pub question_text: String,
    /// `None` when the question was left unanswered.
    pub user_answer: Option<usize>,
    pub correct_answer: usize,
    pub is_correct: bool,
    pub outcome: AnswerOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradedQuiz {
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub results: Vec<QuestionResult>,
}

impl GradedQuiz {
    pub fn passed(&self, passing_score_percent: i64) -> bool {
        self.percentage >= passing_score_percent
    }
}

/// Why a submission could not be graded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradingError {
    /// The quiz has no questions to grade against.
    EmptyQuiz,
    AnswerCountMismatch { expected: usize, got: usize },
    AnswerOutOfRange { index: usize, answer: i64, options: usize },
}

impl fmt::Display for GradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingError::EmptyQuiz => write!(f, "quiz has no questions"),
            GradingError::AnswerCountMismatch { expected, got } => write!(
                f,
                "answers: expected {} answers, got {}; number of answers must match number of questions",
                expected, got
            ),
            GradingError::AnswerOutOfRange {
                index,
                answer,
                options,
            } => write!(
                f,
                "answers[{}]: {} is not a valid option index (question has {} options)",
                index, answer, options
            ),
        }
    }
}

impl std::error::Error for GradingError {}

/// `round(100 * score / total)`, halves rounded up. Zero when `total` is zero.
pub fn percentage(score: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (200 * score + total) / (2 * total)
}

/// Grades `answers` against `questions`.
///
/// All answers are checked before anything is scored, so a malformed
/// submission never produces a partial result.
pub fn grade(questions: &[Question], answers: &[Option<i64>]) -> Result<GradedQuiz, GradingError> {
    if questions.is_empty() {
        return Err(GradingError::EmptyQuiz);
    }
    if answers.len() != questions.len() {
        return Err(GradingError::AnswerCountMismatch {
            expected: questions.len(),
            got: answers.len(),
        });
    }

    let mut chosen = Vec::with_capacity(answers.len());
    for (index, (question, answer)) in questions.iter().zip(answers).enumerate() {
        let picked = match *answer {
            None => None,
            Some(a) if a >= 0 && (a as usize) < question.options.len() => Some(a as usize),
            Some(a) => {
                return Err(GradingError::AnswerOutOfRange {
                    index,
                    answer: a,
                    options: question.options.len(),
                });
            }
        };
        chosen.push(picked);
    }

    let results: Vec<QuestionResult> = questions
        .iter()
        .zip(chosen)
        .enumerate()
        .map(|(index, (question, user_answer))| {
            let outcome = match user_answer {
                None => AnswerOutcome::NotAnswered,
                Some(a) if a == question.correct_answer => AnswerOutcome::Correct,
                Some(_) => AnswerOutcome::Incorrect,
            };
            QuestionResult {
                question_index: index,
                question_text: question.text.clone(),
                user_answer,
                correct_answer: question.correct_answer,
                is_correct: outcome == AnswerOutcome::Correct,
                outcome,
                explanation: question.explanation.clone(),
            }
        })
        .collect();

    let score = results.iter().filter(|r| r.is_correct).count() as i64;
    let total_questions = results.len() as i64;

    Ok(GradedQuiz {
        score,
        total_questions,
        percentage: percentage(score, total_questions),
        results,
    })
}

/// Quiz-level running statistics over every submission, as stored after
/// an attempt has been folded in.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct QuizStats {
    pub attempts: i64,
    pub average_score: f64,
}

/// What to do with a user's stored record after a new attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreDecision {
    /// No record for this quiz yet.
    Insert,
    /// The new attempt beats the stored one.
    Replace,
    /// Tie or worse: keep the stored record.
    Discard,
}

/// Best score wins. Ties keep the earlier record.
pub fn decide(existing: Option<&ScoreRecord>, new: &ScoreRecord) -> ScoreDecision {
    match existing {
        None => ScoreDecision::Insert,
        Some(old) if new.percentage > old.percentage => ScoreDecision::Replace,
        Some(_) => ScoreDecision::Discard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn quiz(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                text: format!("Question number {}", i),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: i % 4,
                explanation: (i == 0).then(|| "Because.".to_string()),
            })
            .collect()
    }

    fn all_correct(questions: &[Question]) -> Vec<Option<i64>> {
        questions
            .iter()
            .map(|q| Some(q.correct_answer as i64))
            .collect()
    }

    fn record(percentage: i64) -> ScoreRecord {
        ScoreRecord {
            quiz_id: 1,
            score: percentage / 10,
            total_questions: 10,
            percentage,
            date: Utc::now(),
        }
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let questions = quiz(5);
        let graded = grade(&questions, &all_correct(&questions)).unwrap();
        assert_eq!(graded.score, 5);
        assert_eq!(graded.total_questions, 5);
        assert_eq!(graded.percentage, 100);
        assert!(graded.passed(60));
        assert!(graded.passed(100));
        assert!(graded.results.iter().all(|r| r.outcome == AnswerOutcome::Correct));
        assert_eq!(graded.results[0].explanation.as_deref(), Some("Because."));
    }

    #[test]
    fn wrong_answer_count_is_rejected() {
        let questions = quiz(3);
        let err = grade(&questions, &[Some(0), Some(1)]).unwrap_err();
        assert_eq!(
            err,
            GradingError::AnswerCountMismatch {
                expected: 3,
                got: 2
            }
        );
        assert!(grade(&questions, &[None, None, None, None]).is_err());
    }

    #[test]
    fn out_of_range_answer_names_its_index() {
        let questions = quiz(3);
        let err = grade(&questions, &[Some(0), Some(4), Some(0)]).unwrap_err();
        assert_eq!(
            err,
            GradingError::AnswerOutOfRange {
                index: 1,
                answer: 4,
                options: 4
            }
        );
        assert!(err.to_string().starts_with("answers[1]"));

        let err = grade(&questions, &[Some(-1), Some(0), Some(0)]).unwrap_err();
        assert!(matches!(err, GradingError::AnswerOutOfRange { index: 0, .. }));
    }

    #[test]
    fn empty_quiz_cannot_be_graded() {
        assert_eq!(grade(&[], &[]).unwrap_err(), GradingError::EmptyQuiz);
    }

    #[test]
    fn unanswered_questions_are_incorrect_and_flagged() {
        let questions = quiz(2);
        let graded = grade(&questions, &[None, Some(1)]).unwrap();
        assert_eq!(graded.score, 1);
        assert_eq!(graded.percentage, 50);

        let first = &graded.results[0];
        assert_eq!(first.user_answer, None);
        assert!(!first.is_correct);
        assert_eq!(first.outcome, AnswerOutcome::NotAnswered);

        let json = serde_json::to_value(first).unwrap();
        assert!(json["userAnswer"].is_null());
        assert_eq!(json["outcome"], "notAnswered");
    }

    #[test]
    fn wrong_answer_is_incorrect_not_unanswered() {
        let questions = quiz(1);
        let graded = grade(&questions, &[Some(3)]).unwrap();
        assert_eq!(graded.results[0].outcome, AnswerOutcome::Incorrect);
        assert_eq!(graded.results[0].user_answer, Some(3));
        assert_eq!(graded.percentage, 0);
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5 rounds up
        assert_eq!(percentage(0, 7), 0);
        assert_eq!(percentage(7, 7), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn percentage_matches_score_for_every_size() {
        for total in 1..=40 {
            for score in 0..=total {
                let p = percentage(score, total);
                let expected = (100.0 * score as f64 / total as f64).round() as i64;
                assert_eq!(p, expected, "score {} of {}", score, total);
                assert!((0..=100).contains(&p));
            }
        }
    }

    #[test]
    fn best_score_wins() {
        let first = record(50);
        assert_eq!(decide(None, &first), ScoreDecision::Insert);

        let better = record(70);
        assert_eq!(decide(Some(&first), &better), ScoreDecision::Replace);

        let worse = record(60);
        assert_eq!(decide(Some(&better), &worse), ScoreDecision::Discard);

        let tie = record(70);
        assert_eq!(decide(Some(&better), &tie), ScoreDecision::Discard);
    }
}

//! Canonical validation of question answer encodings.
//!
//! Three shapes historically reached different entry points: an index into
//! the option list, a literal option value, and a plural `correctAnswers`
//! index list. They are normalized here into one [`CorrectAnswer`] union and
//! validated against the declared question type.

use std::collections::HashSet;

use thiserror::Error;

use crate::dao::models::{CorrectAnswer, QuestionType};

/// Violation of the answer-encoding rules for a single question.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerSchemaError {
    #[error("a correct answer is required")]
    MissingAnswer,
    #[error("both `correctAnswer` and `correctAnswers` were supplied; use one")]
    AmbiguousEncoding,
    #[error("options must not be empty")]
    EmptyOptions,
    #[error("answer index {index} is out of range for {option_count} option(s)")]
    IndexOutOfRange { index: usize, option_count: usize },
    #[error("answer value `{value}` is not one of the options")]
    UnknownValue { value: String },
    #[error("answer set must not be empty")]
    EmptyAnswerSet,
    #[error("answer set contains duplicate entries")]
    DuplicateAnswer,
    #[error("{question_type} questions require exactly one correct answer")]
    ExpectedSingleAnswer { question_type: QuestionType },
    #[error("{question_type} questions require a set of correct answers")]
    ExpectedAnswerSet { question_type: QuestionType },
}

/// Normalize the two wire fields into one canonical encoding.
///
/// The plural legacy field maps to [`CorrectAnswer::IndexSet`]; supplying
/// both fields at once is ambiguous and rejected rather than silently
/// preferring either.
pub fn resolve_encoding(
    correct_answer: Option<CorrectAnswer>,
    correct_answers: Option<Vec<usize>>,
) -> Result<CorrectAnswer, AnswerSchemaError> {
    match (correct_answer, correct_answers) {
        (Some(_), Some(_)) => Err(AnswerSchemaError::AmbiguousEncoding),
        (Some(answer), None) => Ok(answer),
        (None, Some(indices)) => Ok(CorrectAnswer::IndexSet(indices)),
        (None, None) => Err(AnswerSchemaError::MissingAnswer),
    }
}

/// Validate a canonical answer encoding against the declared question type
/// and option list.
pub fn validate_answer(
    question_type: &QuestionType,
    options: &[String],
    answer: &CorrectAnswer,
) -> Result<(), AnswerSchemaError> {
    if options.is_empty() {
        return Err(AnswerSchemaError::EmptyOptions);
    }

    match question_type {
        QuestionType::SingleChoice => match answer {
            CorrectAnswer::Index(index) => check_index(*index, options),
            CorrectAnswer::Value(value) => check_value(value, options),
            CorrectAnswer::IndexSet(_) | CorrectAnswer::ValueSet(_) => {
                Err(AnswerSchemaError::ExpectedSingleAnswer {
                    question_type: question_type.clone(),
                })
            }
        },
        QuestionType::MultipleChoice => match answer {
            CorrectAnswer::IndexSet(indices) => check_index_set(indices, options),
            CorrectAnswer::ValueSet(values) => check_value_set(values, options),
            CorrectAnswer::Index(_) | CorrectAnswer::Value(_) => {
                Err(AnswerSchemaError::ExpectedAnswerSet {
                    question_type: question_type.clone(),
                })
            }
        },
        // Unrecognized types accept any shape, validated member-wise.
        QuestionType::Other(_) => match answer {
            CorrectAnswer::Index(index) => check_index(*index, options),
            CorrectAnswer::Value(value) => check_value(value, options),
            CorrectAnswer::IndexSet(indices) => check_index_set(indices, options),
            CorrectAnswer::ValueSet(values) => check_value_set(values, options),
        },
    }
}

fn check_index(index: usize, options: &[String]) -> Result<(), AnswerSchemaError> {
    if index >= options.len() {
        return Err(AnswerSchemaError::IndexOutOfRange {
            index,
            option_count: options.len(),
        });
    }
    Ok(())
}

fn check_value(value: &str, options: &[String]) -> Result<(), AnswerSchemaError> {
    if !options.iter().any(|option| option == value) {
        return Err(AnswerSchemaError::UnknownValue {
            value: value.to_owned(),
        });
    }
    Ok(())
}

fn check_index_set(indices: &[usize], options: &[String]) -> Result<(), AnswerSchemaError> {
    if indices.is_empty() {
        return Err(AnswerSchemaError::EmptyAnswerSet);
    }
    let mut seen = HashSet::new();
    for &index in indices {
        check_index(index, options)?;
        if !seen.insert(index) {
            return Err(AnswerSchemaError::DuplicateAnswer);
        }
    }
    Ok(())
}

fn check_value_set(values: &[String], options: &[String]) -> Result<(), AnswerSchemaError> {
    if values.is_empty() {
        return Err(AnswerSchemaError::EmptyAnswerSet);
    }
    let mut seen = HashSet::new();
    for value in values {
        check_value(value, options)?;
        if !seen.insert(value.as_str()) {
            return Err(AnswerSchemaError::DuplicateAnswer);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn single_choice_accepts_in_range_index() {
        let result = validate_answer(
            &QuestionType::SingleChoice,
            &options(&["a", "b", "c"]),
            &CorrectAnswer::Index(2),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn single_choice_rejects_out_of_range_index() {
        let result = validate_answer(
            &QuestionType::SingleChoice,
            &options(&["a", "b", "c"]),
            &CorrectAnswer::Index(5),
        );
        assert_eq!(
            result,
            Err(AnswerSchemaError::IndexOutOfRange {
                index: 5,
                option_count: 3
            })
        );
    }

    #[test]
    fn single_choice_accepts_matching_value() {
        let opts = options(&["Paris", "Lyon"]);
        assert_eq!(
            validate_answer(
                &QuestionType::SingleChoice,
                &opts,
                &CorrectAnswer::Value("Paris".to_owned())
            ),
            Ok(())
        );
        assert_eq!(
            validate_answer(
                &QuestionType::SingleChoice,
                &opts,
                &CorrectAnswer::Value("Nice".to_owned())
            ),
            Err(AnswerSchemaError::UnknownValue {
                value: "Nice".to_owned()
            })
        );
    }

    #[test]
    fn single_choice_rejects_sets() {
        let result = validate_answer(
            &QuestionType::SingleChoice,
            &options(&["a", "b"]),
            &CorrectAnswer::IndexSet(vec![0]),
        );
        assert!(matches!(
            result,
            Err(AnswerSchemaError::ExpectedSingleAnswer { .. })
        ));
    }

    #[test]
    fn multiple_choice_requires_non_empty_distinct_set() {
        let opts = options(&["a", "b", "c"]);
        assert_eq!(
            validate_answer(
                &QuestionType::MultipleChoice,
                &opts,
                &CorrectAnswer::IndexSet(vec![0, 2])
            ),
            Ok(())
        );
        assert_eq!(
            validate_answer(
                &QuestionType::MultipleChoice,
                &opts,
                &CorrectAnswer::IndexSet(vec![])
            ),
            Err(AnswerSchemaError::EmptyAnswerSet)
        );
        assert_eq!(
            validate_answer(
                &QuestionType::MultipleChoice,
                &opts,
                &CorrectAnswer::IndexSet(vec![1, 1])
            ),
            Err(AnswerSchemaError::DuplicateAnswer)
        );
        assert!(matches!(
            validate_answer(&QuestionType::MultipleChoice, &opts, &CorrectAnswer::Index(0)),
            Err(AnswerSchemaError::ExpectedAnswerSet { .. })
        ));
    }

    #[test]
    fn multiple_choice_validates_each_value_independently() {
        let opts = options(&["red", "green", "blue"]);
        assert_eq!(
            validate_answer(
                &QuestionType::MultipleChoice,
                &opts,
                &CorrectAnswer::ValueSet(vec!["red".to_owned(), "blue".to_owned()])
            ),
            Ok(())
        );
        assert_eq!(
            validate_answer(
                &QuestionType::MultipleChoice,
                &opts,
                &CorrectAnswer::ValueSet(vec!["red".to_owned(), "yellow".to_owned()])
            ),
            Err(AnswerSchemaError::UnknownValue {
                value: "yellow".to_owned()
            })
        );
    }

    #[test]
    fn other_types_accept_any_valid_shape() {
        let opts = options(&["a", "b"]);
        let kind = QuestionType::Other("sort-order".to_owned());
        assert_eq!(
            validate_answer(&kind, &opts, &CorrectAnswer::Index(1)),
            Ok(())
        );
        assert_eq!(
            validate_answer(&kind, &opts, &CorrectAnswer::IndexSet(vec![0, 1])),
            Ok(())
        );
        assert_eq!(
            validate_answer(&kind, &opts, &CorrectAnswer::IndexSet(vec![])),
            Err(AnswerSchemaError::EmptyAnswerSet)
        );
    }

    #[test]
    fn empty_options_always_fail() {
        assert_eq!(
            validate_answer(&QuestionType::SingleChoice, &[], &CorrectAnswer::Index(0)),
            Err(AnswerSchemaError::EmptyOptions)
        );
    }

    #[test]
    fn legacy_plural_field_normalizes_to_index_set() {
        let resolved = resolve_encoding(None, Some(vec![0, 2])).unwrap();
        assert_eq!(resolved, CorrectAnswer::IndexSet(vec![0, 2]));
    }

    #[test]
    fn supplying_both_encodings_is_ambiguous() {
        let result = resolve_encoding(Some(CorrectAnswer::Index(0)), Some(vec![1]));
        assert_eq!(result, Err(AnswerSchemaError::AmbiguousEncoding));
    }

    #[test]
    fn missing_answer_is_rejected() {
        assert_eq!(
            resolve_encoding(None, None),
            Err(AnswerSchemaError::MissingAnswer)
        );
    }
}

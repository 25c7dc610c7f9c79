use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::models::{Assessment, Question, QuestionKind};

/// One rule violated by one answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerError {
    pub question_id: String,
    pub message: String,
}

impl AnswerError {
    fn new(question: &Question, message: impl Into<String>) -> Self {
        AnswerError {
            question_id: question.id.clone(),
            message: message.into(),
        }
    }
}

impl fmt::Display for AnswerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.question_id, self.message)
    }
}

/// Checks `answers` against every visible question of `assessment`.
///
/// Hidden questions are neither required nor checked. Answers keyed by ids
/// that are not questions of this assessment are rejected. All violations are
/// collected rather than stopping at the first.
pub fn validate_answers(
    assessment: &Assessment,
    answers: &BTreeMap<String, Value>,
) -> Result<(), Vec<AnswerError>> {
    let mut errors = Vec::new();

    for question in assessment.questions() {
        if !is_visible(question, answers) {
            continue;
        }
        match answers.get(&question.id).filter(|v| !is_blank(v)) {
            None if question.validation.required => {
                errors.push(AnswerError::new(question, "an answer is required"));
            }
            None => {}
            Some(answer) => {
                if let Err(message) = check_answer(question, answer) {
                    errors.push(AnswerError::new(question, message));
                }
            }
        }
    }

    for id in answers.keys() {
        if !assessment.questions().any(|q| &q.id == id) {
            errors.push(AnswerError {
                question_id: id.clone(),
                message: "not a question in this assessment".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_visible(question: &Question, answers: &BTreeMap<String, Value>) -> bool {
    match &question.show_when {
        None => true,
        Some(rule) => match answers.get(&rule.question_id) {
            Some(Value::String(answer)) => *answer == rule.equals,
            Some(Value::Array(choices)) => choices
                .iter()
                .any(|choice| choice.as_str() == Some(rule.equals.as_str())),
            _ => false,
        },
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn check_answer(question: &Question, answer: &Value) -> Result<(), String> {
    let rules = &question.validation;
    match question.kind {
        QuestionKind::SingleChoice => {
            let choice = answer.as_str().ok_or("expected a single option")?;
            check_option(question, choice)
        }
        QuestionKind::MultiChoice => {
            let choices = answer.as_array().ok_or("expected a list of options")?;
            for choice in choices {
                let choice = choice.as_str().ok_or("options must be strings")?;
                check_option(question, choice)?;
            }
            Ok(())
        }
        QuestionKind::ShortText | QuestionKind::LongText => {
            let text = answer.as_str().ok_or("expected text")?;
            match rules.max_length {
                Some(limit) if text.chars().count() > limit => {
                    Err(format!("must be at most {limit} characters"))
                }
                _ => Ok(()),
            }
        }
        QuestionKind::Numeric => {
            let number = match answer {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .ok_or("expected a number")?;
            if let Some(min) = rules.min.filter(|min| number < *min) {
                return Err(format!("must be at least {min}"));
            }
            if let Some(max) = rules.max.filter(|max| number > *max) {
                return Err(format!("must be at most {max}"));
            }
            Ok(())
        }
        QuestionKind::FileUpload => answer
            .as_str()
            .map(|_| ())
            .ok_or_else(|| "expected a file reference".to_string()),
    }
}

fn check_option(question: &Question, choice: &str) -> Result<(), String> {
    if question.options.is_empty() || question.options.iter().any(|o| o == choice) {
        Ok(())
    } else {
        Err(format!("'{choice}' is not one of the options"))
    }
}

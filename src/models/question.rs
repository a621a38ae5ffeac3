// src/models/question.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// One of the four option letters of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum OptionTag {
    A,
    B,
    C,
    D,
}

impl OptionTag {
    pub const ALL: [OptionTag; 4] = [OptionTag::A, OptionTag::B, OptionTag::C, OptionTag::D];

    /// Position of the option in `Question::options()`.
    pub fn index(self) -> usize {
        match self {
            OptionTag::A => 0,
            OptionTag::B => 1,
            OptionTag::C => 2,
            OptionTag::D => 3,
        }
    }
}

impl fmt::Display for OptionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            OptionTag::A => "A",
            OptionTag::B => "B",
            OptionTag::C => "C",
            OptionTag::D => "D",
        };
        f.write_str(letter)
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    /// The text of the question.
    pub question: String,

    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,

    /// The correct option.
    pub answer: OptionTag,

    /// Marks awarded for the correct option. Never negative.
    pub marks: i64,

    /// Explanation of the correct answer, revealed once results are published.
    pub explanation: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn options(&self) -> [&str; 4] {
        [
            self.option1.as_str(),
            self.option2.as_str(),
            self.option3.as_str(),
            self.option4.as_str(),
        ]
    }

    /// Text of the correct option.
    pub fn correct_text(&self) -> &str {
        self.options()[self.answer.index()]
    }

    /// Marks earned by `selected`: all of them on a match, nothing otherwise.
    pub fn award(&self, selected: Option<OptionTag>) -> i64 {
        if selected == Some(self.answer) {
            self.marks
        } else {
            0
        }
    }
}

/// DTO for sending a question to a student taking the quiz (no answer, no explanation).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question: String,
    pub options: [String; 4],
    pub marks: i64,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            question: q.question,
            options: [q.option1, q.option2, q.option3, q.option4],
            marks: q.marks,
        }
    }
}

/// DTO for adding a question to a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    pub answer: OptionTag,
    #[validate(range(min = 0, message = "Marks cannot be negative."))]
    pub marks: i64,
    #[validate(length(max = 5000))]
    pub explanation: Option<String>,
}

/// Exactly four options, each non-empty.
fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != 4 {
        return Err(validator::ValidationError::new("exactly_four_options_required"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 1000 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(answer: OptionTag, marks: i64) -> Question {
        Question {
            id: 1,
            quiz_id: 1,
            question: "Which layer routes packets?".to_string(),
            option1: "Physical".to_string(),
            option2: "Network".to_string(),
            option3: "Session".to_string(),
            option4: "Application".to_string(),
            answer,
            marks,
            explanation: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_award_is_all_or_nothing() {
        let q = sample(OptionTag::B, 5);
        assert_eq!(q.award(Some(OptionTag::B)), 5);
        assert_eq!(q.award(Some(OptionTag::C)), 0);
        assert_eq!(q.award(None), 0);
    }

    #[test]
    fn test_correct_text_follows_tag() {
        assert_eq!(sample(OptionTag::B, 1).correct_text(), "Network");
        assert_eq!(sample(OptionTag::D, 1).correct_text(), "Application");
    }

    #[test]
    fn test_request_rejects_three_options() {
        let req = CreateQuestionRequest {
            question: "Q".to_string(),
            options: vec!["a".into(), "b".into(), "c".into()],
            answer: OptionTag::A,
            marks: 1,
            explanation: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_request_rejects_negative_marks() {
        let req = CreateQuestionRequest {
            question: "Q".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer: OptionTag::A,
            marks: -1,
            explanation: None,
        };
        assert!(req.validate().is_err());
    }
}

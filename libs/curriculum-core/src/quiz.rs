//! Quiz model: one tagged body per answer modality.
//!
//! On the wire a quiz is a flat record (`mode`, `type`, `question`,
//! `choices`, `answer`, `matchingMap`, ...). Deserializing validates the
//! record, so a malformed payload never becomes a [`Quiz`].

use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::error::{Result, ValidationError};
use crate::grading::{answers_match, normalize_answer, Comparison};
use crate::pairs::MatchingMap;
use crate::types::{CefrLevel, QuizId, QuizMode, QuizType, UnitId};

/// Mode-specific quiz payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizBody {
    TextToText {
        question: String,
        choices: Vec<String>,
        answer: String,
    },
    /// Choices and answer are image locators.
    TextToImage {
        question: String,
        choices: Vec<String>,
        answer: String,
    },
    /// Choices and answer are image locators.
    DefinitionToImage {
        definition: String,
        choices: Vec<String>,
        answer: String,
    },
    /// The prompt is an image locator; choices are text.
    ImageToText {
        image: String,
        choices: Vec<String>,
        answer: String,
    },
    MatchTextText {
        question: String,
        pairs: MatchingMap,
    },
}

impl QuizBody {
    pub fn mode(&self) -> QuizMode {
        match self {
            Self::TextToText { .. } => QuizMode::TextToText,
            Self::TextToImage { .. } => QuizMode::TextToImage,
            Self::DefinitionToImage { .. } => QuizMode::DefinitionToImage,
            Self::ImageToText { .. } => QuizMode::ImageToText,
            Self::MatchTextText { .. } => QuizMode::MatchTextText,
        }
    }

    /// Question text, definition, or image locator depending on mode.
    pub fn prompt(&self) -> &str {
        match self {
            Self::TextToText { question, .. }
            | Self::TextToImage { question, .. }
            | Self::MatchTextText { question, .. } => question,
            Self::DefinitionToImage { definition, .. } => definition,
            Self::ImageToText { image, .. } => image,
        }
    }

    /// Choices for choice-based modes; empty for matching.
    pub fn choices(&self) -> &[String] {
        match self {
            Self::TextToText { choices, .. }
            | Self::TextToImage { choices, .. }
            | Self::DefinitionToImage { choices, .. }
            | Self::ImageToText { choices, .. } => choices,
            Self::MatchTextText { .. } => &[],
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::TextToText { answer, .. }
            | Self::TextToImage { answer, .. }
            | Self::DefinitionToImage { answer, .. }
            | Self::ImageToText { answer, .. } => Some(answer),
            Self::MatchTextText { .. } => None,
        }
    }

    pub fn matching_map(&self) -> Option<&MatchingMap> {
        match self {
            Self::MatchTextText { pairs, .. } => Some(pairs),
            _ => None,
        }
    }

    fn comparison(&self) -> Comparison {
        if self.mode().has_image_choices() {
            Comparison::Locator
        } else {
            Comparison::Text
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            // MatchingMap cannot be built in a malformed state.
            Self::MatchTextText { pairs, .. } => {
                if pairs.is_empty() {
                    return Err(ValidationError::EmptyMatchingMap);
                }
                Ok(())
            }
            _ => {
                let choices = self.choices();
                if choices.is_empty() {
                    return Err(ValidationError::NoChoices);
                }
                let answer = self.answer().unwrap_or_default();
                let wanted = normalize_answer(answer);
                if !choices.iter().any(|c| normalize_answer(c) == wanted) {
                    return Err(ValidationError::AnswerNotInChoices {
                        answer: answer.to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Grade a choice-based answer. `None` for matching bodies, which are
    /// graded through a matching engine instead.
    pub fn grade(&self, submitted: &str) -> Option<bool> {
        let correct = self.answer()?;
        Some(answers_match(submitted, correct, self.comparison()))
    }
}

/// A quiz item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "QuizRecord")]
pub struct Quiz {
    /// Zero for items that were never stored, such as a generated placement list.
    pub id: QuizId,
    pub unit_id: Option<UnitId>,
    pub quiz_type: QuizType,
    pub cefr: Option<CefrLevel>,
    pub body: QuizBody,
    pub explanation: Option<String>,
}

impl Quiz {
    pub fn mode(&self) -> QuizMode {
        self.body.mode()
    }

    pub fn is_matching(&self) -> bool {
        self.body.matching_map().is_some()
    }

    pub fn validate(&self) -> Result<()> {
        check_type_and_mode(self.quiz_type, self.body.mode())?;
        self.body.validate()
    }

    pub fn grade(&self, submitted: &str) -> Option<bool> {
        self.body.grade(submitted)
    }
}

/// A quiz waiting to be stored under a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuiz {
    pub unit_id: UnitId,
    pub quiz_type: QuizType,
    pub cefr: Option<CefrLevel>,
    pub body: QuizBody,
    pub explanation: Option<String>,
}

impl NewQuiz {
    /// Re-home a quiz (for example one returned by a generator) under `unit_id`.
    pub fn from_quiz(quiz: Quiz, unit_id: UnitId) -> Self {
        Self {
            unit_id,
            quiz_type: quiz.quiz_type,
            cefr: quiz.cefr,
            body: quiz.body,
            explanation: quiz.explanation,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_type_and_mode(self.quiz_type, self.body.mode())?;
        self.body.validate()
    }

    pub fn into_quiz(self, id: QuizId) -> Quiz {
        Quiz {
            id,
            unit_id: Some(self.unit_id),
            quiz_type: self.quiz_type,
            cefr: self.cefr,
            body: self.body,
            explanation: self.explanation,
        }
    }
}

fn check_type_and_mode(quiz_type: QuizType, mode: QuizMode) -> Result<()> {
    let matching_type = quiz_type == QuizType::Matching;
    let matching_mode = mode == QuizMode::MatchTextText;
    if matching_type != matching_mode {
        return Err(ValidationError::ModeMismatch { quiz_type, mode });
    }
    Ok(())
}

fn default_type_for(mode: QuizMode) -> QuizType {
    match mode {
        QuizMode::MatchTextText => QuizType::Matching,
        _ => QuizType::Mcq,
    }
}

/// Flat wire form of a quiz.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizRecord {
    #[serde(default)]
    id: QuizId,
    #[serde(default)]
    unit_id: Option<UnitId>,
    #[serde(default, rename = "type")]
    quiz_type: Option<QuizType>,
    mode: QuizMode,
    #[serde(default)]
    cefr: Option<CefrLevel>,
    #[serde(default)]
    question: String,
    #[serde(default, alias = "options")]
    choices: Vec<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    /// Either an object or a string holding an encoded object.
    #[serde(default)]
    matching_map: Option<Box<RawValue>>,
}

fn parse_matching_map(raw: &RawValue) -> Result<MatchingMap> {
    let raw = raw.get().trim();
    if raw.starts_with('"') {
        let encoded: String = serde_json::from_str(raw)
            .map_err(|e| ValidationError::MalformedMatchingMap(e.to_string()))?;
        MatchingMap::from_json_str(&encoded)
    } else {
        MatchingMap::from_json_str(raw)
    }
}

impl TryFrom<QuizRecord> for Quiz {
    type Error = ValidationError;

    fn try_from(record: QuizRecord) -> Result<Self> {
        let answer = || record.answer.clone().ok_or(ValidationError::MissingField("answer"));

        let body = match record.mode {
            QuizMode::TextToText => QuizBody::TextToText {
                answer: answer()?,
                question: record.question,
                choices: record.choices,
            },
            QuizMode::TextToImage => QuizBody::TextToImage {
                answer: answer()?,
                question: record.question,
                choices: record.choices,
            },
            QuizMode::DefinitionToImage => QuizBody::DefinitionToImage {
                answer: answer()?,
                definition: record.question,
                choices: record.choices,
            },
            QuizMode::ImageToText => QuizBody::ImageToText {
                answer: answer()?,
                image: record.question,
                choices: record.choices,
            },
            QuizMode::MatchTextText => {
                let raw = record
                    .matching_map
                    .as_deref()
                    .ok_or(ValidationError::MissingField("matchingMap"))?;
                QuizBody::MatchTextText {
                    pairs: parse_matching_map(raw)?,
                    question: record.question,
                }
            }
        };

        let quiz = Quiz {
            id: record.id,
            unit_id: record.unit_id,
            quiz_type: record
                .quiz_type
                .unwrap_or_else(|| default_type_for(body.mode())),
            cefr: record.cefr,
            body,
            explanation: record.explanation,
        };
        quiz.validate()?;
        Ok(quiz)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizRecordRef<'a> {
    id: QuizId,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_id: Option<UnitId>,
    #[serde(rename = "type")]
    quiz_type: QuizType,
    mode: QuizMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    cefr: Option<CefrLevel>,
    question: &'a str,
    #[serde(skip_serializing_if = "no_choices")]
    choices: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matching_map: Option<&'a MatchingMap>,
}

fn no_choices(choices: &&[String]) -> bool {
    choices.is_empty()
}

impl Serialize for Quiz {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        QuizRecordRef {
            id: self.id,
            unit_id: self.unit_id,
            quiz_type: self.quiz_type,
            mode: self.body.mode(),
            cefr: self.cefr,
            question: self.body.prompt(),
            choices: self.body.choices(),
            answer: self.body.answer(),
            explanation: self.explanation.as_deref(),
            matching_map: self.body.matching_map(),
        }
        .serialize(serializer)
    }
}

//! Core types for the curriculum hierarchy.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize};

pub type SectionId = i64;
pub type UnitId = i64;
pub type StoryId = i64;
pub type VocabularyId = i64;
pub type QuizId = i64;

/// Patch field that tells "absent" apart from an explicit `null`. Only called
/// for present fields, so `null` becomes `Some(None)`; absence falls back to
/// the `default` of `None`.
fn present_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// CEFR proficiency level tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Section,
    Unit,
    Story,
    Vocabulary,
    Quiz,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Section => "section",
            Self::Unit => "unit",
            Self::Story => "story",
            Self::Vocabulary => "vocabulary item",
            Self::Quiz => "quiz",
        };
        f.write_str(name)
    }
}

/// Top-level grouping of units, tagged with a CEFR level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub cefr: CefrLevel,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSection {
    pub title: String,
    pub cefr: CefrLevel,
    #[serde(default)]
    pub order: i32,
}

impl NewSection {
    pub fn into_section(self, id: SectionId) -> Section {
        Section {
            id,
            title: self.title,
            cefr: self.cefr,
            order: self.order,
        }
    }
}

/// Partial section update (absent fields are left unchanged).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cefr: Option<CefrLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

impl SectionPatch {
    pub fn apply(self, section: &mut Section) {
        if let Some(title) = self.title {
            section.title = title;
        }
        if let Some(cefr) = self.cefr {
            section.cefr = cefr;
        }
        if let Some(order) = self.order {
            section.order = order;
        }
    }
}

/// A unit of study focused on one grammar point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: UnitId,
    pub section_id: SectionId,
    pub grammar_point: String,
    pub name: String,
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<StoryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUnit {
    pub section_id: SectionId,
    pub grammar_point: String,
    pub name: String,
    #[serde(default)]
    pub order: i32,
}

impl NewUnit {
    /// New units start without a story; one is linked when the first story
    /// for the unit is created.
    pub fn into_unit(self, id: UnitId) -> Unit {
        Unit {
            id,
            section_id: self.section_id,
            grammar_point: self.grammar_point,
            name: self.name,
            order: self.order,
            story_id: None,
        }
    }
}

/// Partial unit update. Moving a unit between sections goes through
/// `section_id` here and nowhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<SectionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_point: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    /// `Some(None)` unlinks the story; on the wire that is an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub story_id: Option<Option<StoryId>>,
}

impl UnitPatch {
    pub fn apply(self, unit: &mut Unit) {
        if let Some(section_id) = self.section_id {
            unit.section_id = section_id;
        }
        if let Some(grammar_point) = self.grammar_point {
            unit.grammar_point = grammar_point;
        }
        if let Some(name) = self.name {
            unit.name = name;
        }
        if let Some(order) = self.order {
            unit.order = order;
        }
        if let Some(story_id) = self.story_id {
            unit.story_id = story_id;
        }
    }
}

/// Requested story length for generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryLength {
    Short,
    #[default]
    Medium,
    Long,
}

/// Parameters passed to the external story generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub length: StoryLength,
}

/// Reading passage attached to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub unit_id: UnitId,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub keywords: IndexSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    pub unit_id: UnitId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub keywords: IndexSet<String>,
}

impl NewStory {
    pub fn into_story(self, id: StoryId) -> Story {
        Story {
            id,
            unit_id: self.unit_id,
            title: self.title,
            content: self.content,
            audio_url: self.audio_url,
            keywords: self.keywords,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// `Some(None)` clears the audio locator.
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub audio_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<IndexSet<String>>,
}

impl StoryPatch {
    pub fn apply(self, story: &mut Story) {
        if let Some(title) = self.title {
            story.title = title;
        }
        if let Some(content) = self.content {
            story.content = content;
        }
        if let Some(audio_url) = self.audio_url {
            story.audio_url = audio_url;
        }
        if let Some(keywords) = self.keywords {
            story.keywords = keywords;
        }
    }
}

/// A word with its definition, optionally illustrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    pub id: VocabularyId,
    pub unit_id: UnitId,
    pub word: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVocabularyItem {
    pub unit_id: UnitId,
    pub word: String,
    pub definition: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewVocabularyItem {
    pub fn into_item(self, id: VocabularyId) -> VocabularyItem {
        VocabularyItem {
            id,
            unit_id: self.unit_id,
            word: self.word,
            definition: self.definition,
            image_url: self.image_url,
        }
    }
}

/// Quiz authoring category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizType {
    Mcq,
    SentenceOrder,
    Matching,
}

impl QuizType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "MCQ",
            Self::SentenceOrder => "SENTENCE_ORDER",
            Self::Matching => "MATCHING",
        }
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer modality of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizMode {
    TextToText,
    TextToImage,
    DefinitionToImage,
    ImageToText,
    MatchTextText,
}

impl QuizMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextToText => "TEXT_TO_TEXT",
            Self::TextToImage => "TEXT_TO_IMAGE",
            Self::DefinitionToImage => "DEFINITION_TO_IMAGE",
            Self::ImageToText => "IMAGE_TO_TEXT",
            Self::MatchTextText => "MATCH_TEXT_TEXT",
        }
    }

    /// Whether choices are image locators rather than literal text.
    pub fn has_image_choices(&self) -> bool {
        matches!(self, Self::TextToImage | Self::DefinitionToImage)
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

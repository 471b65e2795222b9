//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext wiring an in-memory store and a mock generator into AppState
//! - MockGenerator with scripted placement lists and a failure switch
//! - Helpers for seeding a section/unit tree
//! - InterleavingStore for commits landing between a read and a write

#![allow(dead_code)]

pub mod fixtures;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use curriculum_core::types::{QuizId, SectionId, StoryId, UnitId, VocabularyId};
use curriculum_core::{
    AssessmentSettings, CefrLevel, EntityKind, NewSection, NewUnit, Quiz, QuizType, Section, Story,
    StoryRequest, Unit, VocabularyItem,
};

use curriculum_service::config::ServiceConfig;
use curriculum_service::db::{ChangeSet, ContentStore, MemoryStore, StoreResult};
use curriculum_service::generator::{ContentGenerator, GeneratedStory};
use curriculum_service::services::ContentHierarchy;
use curriculum_service::AppState;

/// Generator stand-in. Placement lists are served from a queue, falling back
/// to [`fixtures::placement_list`] when the queue is empty.
#[derive(Default)]
pub struct MockGenerator {
    lists: Mutex<VecDeque<Vec<Quiz>>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a list for the next `generate_quiz_list` call.
    pub fn push_list(&self, quizzes: Vec<Quiz>) {
        self.lists.lock().unwrap().push_back(quizzes);
    }

    /// Make every generator call fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("mock generator offline");
        }
        Ok(())
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_quiz(&self, unit: &Unit, quiz_type: QuizType) -> anyhow::Result<Quiz> {
        self.begin()?;
        Ok(match quiz_type {
            QuizType::Matching => fixtures::matching_quiz(&[("dog", "perro"), ("cat", "gato")]),
            QuizType::Mcq | QuizType::SentenceOrder => {
                let mut quiz = fixtures::mcq(&format!("{} answer", unit.grammar_point));
                quiz.quiz_type = quiz_type;
                quiz
            }
        })
    }

    async fn generate_story(&self, unit: &Unit, request: &StoryRequest) -> anyhow::Result<GeneratedStory> {
        self.begin()?;
        let theme = request.theme.clone().unwrap_or_else(|| "daily life".to_string());
        Ok(GeneratedStory {
            title: format!("{}: {}", unit.name, theme),
            content: format!("A {:?} story about {}.", request.length, theme),
            audio_url: None,
            keywords: ["story", "theme", "story"].into_iter().map(String::from).collect(),
        })
    }

    async fn generate_quiz_list(&self) -> anyhow::Result<Vec<Quiz>> {
        self.begin()?;
        let queued = self.lists.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(fixtures::placement_list))
    }
}

/// Test context holding the state under test and handles to its fakes.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub generator: Arc<MockGenerator>,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(AssessmentSettings::default())
    }

    pub fn with_settings(assessment: AssessmentSettings) -> Self {
        curriculum_service::init_tracing("debug");

        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(MockGenerator::new());
        let config = ServiceConfig {
            assessment,
            ..ServiceConfig::default()
        };
        let state = AppState::new(store.clone(), generator.clone(), config);

        Self {
            store,
            generator,
            state,
        }
    }

    pub fn hierarchy(&self) -> &ContentHierarchy {
        &self.state.hierarchy
    }

    pub async fn create_section(&self, title: &str, order: i32) -> Section {
        self.hierarchy()
            .create_section(NewSection {
                title: title.to_string(),
                cefr: CefrLevel::A1,
                order,
            })
            .await
            .expect("Failed to create section")
    }

    pub async fn create_unit(&self, section_id: i64, name: &str, order: i32) -> Unit {
        self.hierarchy()
            .create_unit(NewUnit {
                section_id,
                grammar_point: "present simple".to_string(),
                name: name.to_string(),
                order,
            })
            .await
            .expect("Failed to create unit")
    }
}

/// Read after which [`InterleavingStore`] commits its queued change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterRead {
    UnitsBySection,
    Unit,
    Stories,
}

/// Store wrapper that commits a queued change set straight after a chosen
/// read, as another writer would between a check and the write it guards.
pub struct InterleavingStore {
    pub inner: Arc<MemoryStore>,
    queued: Mutex<Option<(AfterRead, ChangeSet)>>,
}

impl InterleavingStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
            queued: Mutex::new(None),
        }
    }

    /// Commit `changes` once, right after the next `read`.
    pub fn queue(&self, read: AfterRead, changes: ChangeSet) {
        *self.queued.lock().unwrap() = Some((read, changes));
    }

    async fn interleave(&self, read: AfterRead) {
        let changes = {
            let mut queued = self.queued.lock().unwrap();
            match queued.take() {
                Some((after, changes)) if after == read => Some(changes),
                other => {
                    *queued = other;
                    None
                }
            }
        };
        if let Some(changes) = changes {
            self.inner
                .apply(changes)
                .await
                .expect("Interleaved commit failed");
        }
    }
}

#[async_trait]
impl ContentStore for InterleavingStore {
    async fn allocate_id(&self, kind: EntityKind) -> StoreResult<i64> {
        self.inner.allocate_id(kind).await
    }

    async fn apply(&self, changes: ChangeSet) -> StoreResult<()> {
        self.inner.apply(changes).await
    }

    async fn list_sections(&self) -> StoreResult<Vec<Section>> {
        self.inner.list_sections().await
    }

    async fn get_section(&self, id: SectionId) -> StoreResult<Option<Section>> {
        self.inner.get_section(id).await
    }

    async fn list_units(&self) -> StoreResult<Vec<Unit>> {
        self.inner.list_units().await
    }

    async fn list_units_by_section(&self, section_id: SectionId) -> StoreResult<Vec<Unit>> {
        let units = self.inner.list_units_by_section(section_id).await;
        self.interleave(AfterRead::UnitsBySection).await;
        units
    }

    async fn get_unit(&self, id: UnitId) -> StoreResult<Option<Unit>> {
        let unit = self.inner.get_unit(id).await;
        self.interleave(AfterRead::Unit).await;
        unit
    }

    async fn list_stories(&self) -> StoreResult<Vec<Story>> {
        let stories = self.inner.list_stories().await;
        self.interleave(AfterRead::Stories).await;
        stories
    }

    async fn get_story(&self, id: StoryId) -> StoreResult<Option<Story>> {
        self.inner.get_story(id).await
    }

    async fn list_vocabulary(&self) -> StoreResult<Vec<VocabularyItem>> {
        self.inner.list_vocabulary().await
    }

    async fn list_vocabulary_by_unit(&self, unit_id: UnitId) -> StoreResult<Vec<VocabularyItem>> {
        self.inner.list_vocabulary_by_unit(unit_id).await
    }

    async fn get_vocabulary(&self, id: VocabularyId) -> StoreResult<Option<VocabularyItem>> {
        self.inner.get_vocabulary(id).await
    }

    async fn list_quizzes_by_unit(&self, unit_id: UnitId) -> StoreResult<Vec<Quiz>> {
        self.inner.list_quizzes_by_unit(unit_id).await
    }

    async fn get_quiz(&self, id: QuizId) -> StoreResult<Option<Quiz>> {
        self.inner.get_quiz(id).await
    }
}

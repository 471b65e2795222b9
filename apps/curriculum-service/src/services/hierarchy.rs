//! Content hierarchy service.
//!
//! Owns the Section → Unit → (Story, Vocabulary, Quiz) rules on top of a
//! [`ContentStore`]. Every write is a single [`ChangeSet`], so a cascade or a
//! story link either lands completely or not at all. Parent checks are read
//! up front for a clear error and repeated as guards inside the change set,
//! so a concurrent delete between the read and the commit cannot orphan a row.

use std::sync::Arc;

use curriculum_core::hierarchy::{self, Counts};
use curriculum_core::types::{QuizId, SectionId, StoryId, UnitId, VocabularyId};
use curriculum_core::{
    ensure_section_deletable, sort_for_display, EntityKind, IntegrityError, NewQuiz, NewSection,
    NewStory, NewUnit, NewVocabularyItem, Quiz, QuizType, Section, SectionPatch, Story, StoryPatch,
    StoryRequest, Unit, UnitCascade, UnitPatch, VocabularyItem,
};

use crate::db::{ChangeSet, ContentStore, EntityKey, Record, StoreError};
use crate::error::{Result, ServiceError};
use crate::generator::ContentGenerator;

fn not_found(kind: EntityKind, id: i64) -> ServiceError {
    ServiceError::NotFound(format!("{kind} {id}"))
}

fn missing_parent(kind: EntityKind, id: i64) -> ServiceError {
    IntegrityError::MissingParent { kind, id }.into()
}

#[derive(Clone)]
pub struct ContentHierarchy {
    store: Arc<dyn ContentStore>,
    generator: Arc<dyn ContentGenerator>,
}

impl ContentHierarchy {
    pub fn new(store: Arc<dyn ContentStore>, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { store, generator }
    }

    /// Commit a change set, reporting failed guards as integrity errors.
    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        self.store.apply(changes).await.map_err(|err| match err {
            StoreError::ParentMissing(key) => missing_parent(key.kind, key.id),
            StoreError::HasChildren {
                parent:
                    EntityKey {
                        kind: EntityKind::Section,
                        id,
                    },
                child: EntityKind::Unit,
                count,
            } => IntegrityError::SectionHasUnits {
                section_id: id,
                unit_count: count,
            }
            .into(),
            StoreError::HasChildren { parent, child, count } => IntegrityError::HasChildren {
                kind: parent.kind,
                id: parent.id,
                child,
                count,
            }
            .into(),
            other => other.into(),
        })
    }

    // Parent checks

    async fn require_section(&self, id: SectionId) -> Result<Section> {
        self.store
            .get_section(id)
            .await?
            .ok_or_else(|| missing_parent(EntityKind::Section, id))
    }

    async fn require_unit(&self, id: UnitId) -> Result<Unit> {
        self.store
            .get_unit(id)
            .await?
            .ok_or_else(|| missing_parent(EntityKind::Unit, id))
    }

    async fn require_story(&self, id: StoryId) -> Result<Story> {
        self.store
            .get_story(id)
            .await?
            .ok_or_else(|| missing_parent(EntityKind::Story, id))
    }

    // Sections

    /// All sections in display order.
    pub async fn list_sections(&self) -> Result<Vec<Section>> {
        let mut sections = self.store.list_sections().await?;
        sort_for_display(&mut sections);
        Ok(sections)
    }

    pub async fn get_section(&self, id: SectionId) -> Result<Section> {
        self.store
            .get_section(id)
            .await?
            .ok_or_else(|| not_found(EntityKind::Section, id))
    }

    pub async fn create_section(&self, new: NewSection) -> Result<Section> {
        let id = self.store.allocate_id(EntityKind::Section).await?;
        let section = new.into_section(id);
        self.commit(ChangeSet::new().insert(Record::Section(section.clone())))
            .await?;
        tracing::info!(section_id = id, title = %section.title, "section created");
        Ok(section)
    }

    pub async fn update_section(&self, id: SectionId, patch: SectionPatch) -> Result<Section> {
        let mut section = self.get_section(id).await?;
        patch.apply(&mut section);
        self.commit(ChangeSet::new().update(Record::Section(section.clone())))
            .await?;
        tracing::info!(section_id = id, "section updated");
        Ok(section)
    }

    /// Delete a section. Refused while any unit still belongs to it, including
    /// one added after the check was read.
    pub async fn delete_section(&self, id: SectionId) -> Result<()> {
        self.get_section(id).await?;
        let units = self.store.list_units_by_section(id).await?;
        if let Err(err) = ensure_section_deletable(id, &units) {
            tracing::warn!(section_id = id, units = units.len(), "section delete blocked");
            return Err(err.into());
        }
        self.commit(
            ChangeSet::new()
                .require_no_children(EntityKind::Section, id, EntityKind::Unit)
                .delete(EntityKind::Section, id),
        )
        .await
        .inspect_err(|err| tracing::warn!(section_id = id, error = %err, "section delete blocked"))?;
        tracing::info!(section_id = id, "section deleted");
        Ok(())
    }

    // Units

    /// Units of one section in display order.
    pub async fn list_units(&self, section_id: SectionId) -> Result<Vec<Unit>> {
        let mut units = self.store.list_units_by_section(section_id).await?;
        sort_for_display(&mut units);
        Ok(units)
    }

    pub async fn get_unit(&self, id: UnitId) -> Result<Unit> {
        self.store
            .get_unit(id)
            .await?
            .ok_or_else(|| not_found(EntityKind::Unit, id))
    }

    pub async fn create_unit(&self, new: NewUnit) -> Result<Unit> {
        self.require_section(new.section_id).await?;
        let id = self.store.allocate_id(EntityKind::Unit).await?;
        let unit = new.into_unit(id);
        self.commit(
            ChangeSet::new()
                .require(EntityKind::Section, unit.section_id)
                .insert(Record::Unit(unit.clone())),
        )
        .await?;
        tracing::info!(unit_id = id, section_id = unit.section_id, "unit created");
        Ok(unit)
    }

    /// Update a unit. A new `section_id` moves the unit and must name an
    /// existing section. A linked story must be one of the unit's own.
    pub async fn update_unit(&self, id: UnitId, patch: UnitPatch) -> Result<Unit> {
        let mut unit = self.get_unit(id).await?;
        let mut changes = ChangeSet::new();
        if let Some(section_id) = patch.section_id {
            if section_id != unit.section_id {
                self.require_section(section_id).await?;
                changes = changes.require(EntityKind::Section, section_id);
            }
        }
        if let Some(Some(story_id)) = patch.story_id {
            let story = self.require_story(story_id).await?;
            if story.unit_id != id {
                return Err(IntegrityError::StoryOwnedElsewhere {
                    story_id,
                    owner_id: story.unit_id,
                    unit_id: id,
                }
                .into());
            }
            changes = changes.require(EntityKind::Story, story_id);
        }
        let previous_section = unit.section_id;
        patch.apply(&mut unit);
        self.commit(changes.update(Record::Unit(unit.clone()))).await?;
        if previous_section != unit.section_id {
            tracing::info!(unit_id = id, from = previous_section, to = unit.section_id, "unit moved");
        } else {
            tracing::info!(unit_id = id, "unit updated");
        }
        Ok(unit)
    }

    /// Delete a unit together with its quizzes, vocabulary and stories. Any
    /// other unit still linked to one of those stories is unlinked in the same
    /// change set. The commit fails if a child appeared after the plan was read.
    pub async fn delete_unit(&self, id: UnitId) -> Result<UnitCascade> {
        self.get_unit(id).await?;
        let quizzes = self.store.list_quizzes_by_unit(id).await?;
        let vocabulary = self.store.list_vocabulary_by_unit(id).await?;
        let stories = self.store.list_stories().await?;
        let plan = UnitCascade::plan(id, &quizzes, &vocabulary, &stories);

        let mut changes = ChangeSet::new();
        let mut unlinked = 0;
        for mut other in self.store.list_units().await? {
            let linked = other.story_id.is_some_and(|s| plan.story_ids.contains(&s));
            if other.id != id && linked {
                other.story_id = None;
                changes = changes.update(Record::Unit(other));
                unlinked += 1;
            }
        }
        for quiz_id in &plan.quiz_ids {
            changes = changes.delete(EntityKind::Quiz, *quiz_id);
        }
        for vocabulary_id in &plan.vocabulary_ids {
            changes = changes.delete(EntityKind::Vocabulary, *vocabulary_id);
        }
        for story_id in &plan.story_ids {
            changes = changes.delete(EntityKind::Story, *story_id);
        }
        changes = changes.delete(EntityKind::Unit, id);
        for child in [EntityKind::Quiz, EntityKind::Vocabulary, EntityKind::Story] {
            changes = changes.require_no_children(EntityKind::Unit, id, child);
        }
        for story_id in &plan.story_ids {
            changes = changes.require_no_children(EntityKind::Story, *story_id, EntityKind::Unit);
        }

        self.commit(changes).await?;
        tracing::info!(
            unit_id = id,
            unlinked,
            quizzes = plan.quiz_ids.len(),
            vocabulary = plan.vocabulary_ids.len(),
            stories = plan.story_ids.len(),
            "unit deleted with cascade"
        );
        Ok(plan)
    }

    // Stories

    pub async fn list_stories(&self, unit_id: UnitId) -> Result<Vec<Story>> {
        let stories = self.store.list_stories().await?;
        Ok(stories.into_iter().filter(|s| s.unit_id == unit_id).collect())
    }

    pub async fn get_story(&self, id: StoryId) -> Result<Story> {
        self.store
            .get_story(id)
            .await?
            .ok_or_else(|| not_found(EntityKind::Story, id))
    }

    /// Store a story. A unit without a story gets linked to it in the same
    /// change set.
    pub async fn create_story(&self, new: NewStory) -> Result<Story> {
        let unit = self.require_unit(new.unit_id).await?;
        let id = self.store.allocate_id(EntityKind::Story).await?;
        let story = new.into_story(id);
        self.insert_story(unit, story).await
    }

    async fn insert_story(&self, mut unit: Unit, story: Story) -> Result<Story> {
        let mut changes = ChangeSet::new()
            .require(EntityKind::Unit, story.unit_id)
            .insert(Record::Story(story.clone()));
        if unit.story_id.is_none() {
            unit.story_id = Some(story.id);
            changes = changes.update(Record::Unit(unit));
        }
        self.commit(changes).await?;
        tracing::info!(story_id = story.id, unit_id = story.unit_id, "story created");
        Ok(story)
    }

    pub async fn update_story(&self, id: StoryId, patch: StoryPatch) -> Result<Story> {
        let mut story = self.get_story(id).await?;
        patch.apply(&mut story);
        self.commit(ChangeSet::new().update(Record::Story(story.clone())))
            .await?;
        tracing::info!(story_id = id, "story updated");
        Ok(story)
    }

    /// Delete a story and unlink every unit that points at it.
    pub async fn delete_story(&self, id: StoryId) -> Result<()> {
        self.get_story(id).await?;
        let mut changes = ChangeSet::new();
        for mut unit in self.store.list_units().await? {
            if unit.story_id == Some(id) {
                unit.story_id = None;
                changes = changes.update(Record::Unit(unit));
            }
        }
        let unlinked = changes.len();
        changes = changes
            .delete(EntityKind::Story, id)
            .require_no_children(EntityKind::Story, id, EntityKind::Unit);
        self.commit(changes).await?;
        tracing::info!(story_id = id, unlinked, "story deleted");
        Ok(())
    }

    // Vocabulary

    pub async fn list_vocabulary(&self, unit_id: UnitId) -> Result<Vec<VocabularyItem>> {
        Ok(self.store.list_vocabulary_by_unit(unit_id).await?)
    }

    pub async fn get_vocabulary(&self, id: VocabularyId) -> Result<VocabularyItem> {
        self.store
            .get_vocabulary(id)
            .await?
            .ok_or_else(|| not_found(EntityKind::Vocabulary, id))
    }

    pub async fn create_vocabulary(&self, new: NewVocabularyItem) -> Result<VocabularyItem> {
        self.require_unit(new.unit_id).await?;
        let id = self.store.allocate_id(EntityKind::Vocabulary).await?;
        let item = new.into_item(id);
        self.commit(
            ChangeSet::new()
                .require(EntityKind::Unit, item.unit_id)
                .insert(Record::Vocabulary(item.clone())),
        )
        .await?;
        tracing::info!(vocabulary_id = id, unit_id = item.unit_id, word = %item.word, "vocabulary added");
        Ok(item)
    }

    /// Replace a vocabulary item wholesale.
    pub async fn update_vocabulary(&self, id: VocabularyId, item: NewVocabularyItem) -> Result<VocabularyItem> {
        self.get_vocabulary(id).await?;
        self.require_unit(item.unit_id).await?;
        let item = item.into_item(id);
        self.commit(
            ChangeSet::new()
                .require(EntityKind::Unit, item.unit_id)
                .update(Record::Vocabulary(item.clone())),
        )
        .await?;
        tracing::info!(vocabulary_id = id, "vocabulary updated");
        Ok(item)
    }

    pub async fn delete_vocabulary(&self, id: VocabularyId) -> Result<()> {
        self.get_vocabulary(id).await?;
        self.commit(ChangeSet::new().delete(EntityKind::Vocabulary, id))
            .await?;
        tracing::info!(vocabulary_id = id, "vocabulary deleted");
        Ok(())
    }

    // Quizzes

    pub async fn list_quizzes(&self, unit_id: UnitId) -> Result<Vec<Quiz>> {
        Ok(self.store.list_quizzes_by_unit(unit_id).await?)
    }

    pub async fn get_quiz(&self, id: QuizId) -> Result<Quiz> {
        self.store
            .get_quiz(id)
            .await?
            .ok_or_else(|| not_found(EntityKind::Quiz, id))
    }

    /// Validate and store a quiz.
    pub async fn create_quiz(&self, new: NewQuiz) -> Result<Quiz> {
        new.validate()?;
        let unit_id = new.unit_id;
        self.require_unit(unit_id).await?;
        let id = self.store.allocate_id(EntityKind::Quiz).await?;
        let quiz = new.into_quiz(id);
        self.commit(
            ChangeSet::new()
                .require(EntityKind::Unit, unit_id)
                .insert(Record::Quiz(quiz.clone())),
        )
        .await?;
        tracing::info!(quiz_id = id, unit_id = ?quiz.unit_id, mode = %quiz.mode(), "quiz created");
        Ok(quiz)
    }

    /// Replace a quiz wholesale after validating the new body.
    pub async fn update_quiz(&self, id: QuizId, quiz: NewQuiz) -> Result<Quiz> {
        quiz.validate()?;
        self.get_quiz(id).await?;
        let unit_id = quiz.unit_id;
        self.require_unit(unit_id).await?;
        let quiz = quiz.into_quiz(id);
        self.commit(
            ChangeSet::new()
                .require(EntityKind::Unit, unit_id)
                .update(Record::Quiz(quiz.clone())),
        )
        .await?;
        tracing::info!(quiz_id = id, "quiz updated");
        Ok(quiz)
    }

    pub async fn delete_quiz(&self, id: QuizId) -> Result<()> {
        self.get_quiz(id).await?;
        self.commit(ChangeSet::new().delete(EntityKind::Quiz, id))
            .await?;
        tracing::info!(quiz_id = id, "quiz deleted");
        Ok(())
    }

    // Aggregates, recomputed on every call

    /// Unit count per section, in section display order.
    pub async fn unit_counts(&self) -> Result<Counts<SectionId>> {
        let sections = self.list_sections().await?;
        let units = self.store.list_units().await?;
        Ok(hierarchy::unit_counts(&sections, &units))
    }

    /// Vocabulary count per unit.
    pub async fn vocabulary_counts(&self) -> Result<Counts<UnitId>> {
        let mut units = self.store.list_units().await?;
        sort_for_display(&mut units);
        let vocabulary = self.store.list_vocabulary().await?;
        Ok(hierarchy::vocabulary_counts(&units, &vocabulary))
    }

    pub async fn vocabulary_count(&self, unit_id: UnitId) -> Result<usize> {
        Ok(self.store.list_vocabulary_by_unit(unit_id).await?.len())
    }

    // Generation

    /// Ask the generator for a quiz and store it under `unit_id`. Nothing is
    /// written when generation or validation fails.
    pub async fn generate_quiz(&self, unit_id: UnitId, quiz_type: QuizType) -> Result<Quiz> {
        let unit = self.require_unit(unit_id).await?;
        tracing::debug!(unit_id, %quiz_type, generator = self.generator.name(), "generating quiz");
        let draft = self
            .generator
            .generate_quiz(&unit, quiz_type)
            .await
            .map_err(ServiceError::generation)?;
        if draft.quiz_type != quiz_type {
            return Err(ServiceError::Generation(format!(
                "requested a {quiz_type} quiz but the generator returned {}",
                draft.quiz_type
            )));
        }
        self.create_quiz(NewQuiz::from_quiz(draft, unit_id)).await
    }

    /// Ask the generator for a story and store it under `unit_id`.
    pub async fn generate_story(&self, unit_id: UnitId, request: StoryRequest) -> Result<Story> {
        let unit = self.require_unit(unit_id).await?;
        tracing::debug!(unit_id, length = ?request.length, generator = self.generator.name(), "generating story");
        let draft = self
            .generator
            .generate_story(&unit, &request)
            .await
            .map_err(ServiceError::generation)?;
        let id = self.store.allocate_id(EntityKind::Story).await?;
        let story = NewStory {
            unit_id,
            title: draft.title,
            content: draft.content,
            audio_url: draft.audio_url,
            keywords: draft.keywords,
        }
        .into_story(id);
        self.insert_story(unit, story).await
    }
}

//! Content store interface.
//!
//! Reads go through typed list/get methods. Every write goes through
//! [`ContentStore::apply`] as a [`ChangeSet`], which the store must commit
//! atomically: all mutations land or none do. Guards inside a change set are
//! checked against the rows as staged so far, so a check and the write it
//! protects commit together.

pub mod error;
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use curriculum_core::types::{QuizId, SectionId, StoryId, UnitId, VocabularyId};
use curriculum_core::{EntityKind, Quiz, Section, Story, Unit, VocabularyItem};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// Kind and id of a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// A full row of any entity kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Section(Section),
    Unit(Unit),
    Story(Story),
    Vocabulary(VocabularyItem),
    Quiz(Quiz),
}

impl Record {
    pub fn key(&self) -> EntityKey {
        match self {
            Self::Section(s) => EntityKey::new(EntityKind::Section, s.id),
            Self::Unit(u) => EntityKey::new(EntityKind::Unit, u.id),
            Self::Story(s) => EntityKey::new(EntityKind::Story, s.id),
            Self::Vocabulary(v) => EntityKey::new(EntityKind::Vocabulary, v.id),
            Self::Quiz(q) => EntityKey::new(EntityKind::Quiz, q.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Insert(Record),
    Update(Record),
    Delete(EntityKey),
    /// Fails the change set unless the row exists at this point.
    RequireExists(EntityKey),
    /// Fails the change set if any `child` row still refers to `parent` at
    /// this point. A story's children are the units linked to it.
    RequireNoChildren { parent: EntityKey, child: EntityKind },
}

/// Ordered mutations committed as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    mutations: Vec<Mutation>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, record: Record) -> Self {
        self.mutations.push(Mutation::Insert(record));
        self
    }

    pub fn update(mut self, record: Record) -> Self {
        self.mutations.push(Mutation::Update(record));
        self
    }

    pub fn delete(mut self, kind: EntityKind, id: i64) -> Self {
        self.mutations.push(Mutation::Delete(EntityKey::new(kind, id)));
        self
    }

    /// Guard: `kind`/`id` must still exist when the set is committed.
    pub fn require(mut self, kind: EntityKind, id: i64) -> Self {
        self.mutations.push(Mutation::RequireExists(EntityKey::new(kind, id)));
        self
    }

    /// Guard: no `child` row may refer to `kind`/`id` at this point of the set.
    pub fn require_no_children(mut self, kind: EntityKind, id: i64, child: EntityKind) -> Self {
        self.mutations.push(Mutation::RequireNoChildren {
            parent: EntityKey::new(kind, id),
            child,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}

/// External content store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Next id for `kind`, drawn from a per-kind sequence.
    async fn allocate_id(&self, kind: EntityKind) -> StoreResult<i64>;

    /// Commit all mutations atomically.
    async fn apply(&self, changes: ChangeSet) -> StoreResult<()>;

    async fn list_sections(&self) -> StoreResult<Vec<Section>>;
    async fn get_section(&self, id: SectionId) -> StoreResult<Option<Section>>;

    async fn list_units(&self) -> StoreResult<Vec<Unit>>;
    async fn list_units_by_section(&self, section_id: SectionId) -> StoreResult<Vec<Unit>>;
    async fn get_unit(&self, id: UnitId) -> StoreResult<Option<Unit>>;

    async fn list_stories(&self) -> StoreResult<Vec<Story>>;
    async fn get_story(&self, id: StoryId) -> StoreResult<Option<Story>>;

    async fn list_vocabulary(&self) -> StoreResult<Vec<VocabularyItem>>;
    async fn list_vocabulary_by_unit(&self, unit_id: UnitId) -> StoreResult<Vec<VocabularyItem>>;
    async fn get_vocabulary(&self, id: VocabularyId) -> StoreResult<Option<VocabularyItem>>;

    async fn list_quizzes_by_unit(&self, unit_id: UnitId) -> StoreResult<Vec<Quiz>>;
    async fn get_quiz(&self, id: QuizId) -> StoreResult<Option<Quiz>>;
}

//! In-process content store.
//!
//! Change sets are applied to a copy of the tables and swapped in only when
//! every mutation succeeded.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use curriculum_core::types::{QuizId, SectionId, StoryId, UnitId, VocabularyId};
use curriculum_core::{EntityKind, Quiz, Section, Story, Unit, VocabularyItem};
use tokio::sync::RwLock;

use super::{ChangeSet, ContentStore, EntityKey, Mutation, Record, StoreError, StoreResult};

#[derive(Debug, Clone, Default)]
struct Tables {
    sections: BTreeMap<SectionId, Section>,
    units: BTreeMap<UnitId, Unit>,
    stories: BTreeMap<StoryId, Story>,
    vocabulary: BTreeMap<VocabularyId, VocabularyItem>,
    quizzes: BTreeMap<QuizId, Quiz>,
}

impl Tables {
    fn contains(&self, key: EntityKey) -> bool {
        match key.kind {
            EntityKind::Section => self.sections.contains_key(&key.id),
            EntityKind::Unit => self.units.contains_key(&key.id),
            EntityKind::Story => self.stories.contains_key(&key.id),
            EntityKind::Vocabulary => self.vocabulary.contains_key(&key.id),
            EntityKind::Quiz => self.quizzes.contains_key(&key.id),
        }
    }

    fn put(&mut self, record: Record) {
        match record {
            Record::Section(s) => {
                self.sections.insert(s.id, s);
            }
            Record::Unit(u) => {
                self.units.insert(u.id, u);
            }
            Record::Story(s) => {
                self.stories.insert(s.id, s);
            }
            Record::Vocabulary(v) => {
                self.vocabulary.insert(v.id, v);
            }
            Record::Quiz(q) => {
                self.quizzes.insert(q.id, q);
            }
        }
    }

    fn remove(&mut self, key: EntityKey) -> bool {
        match key.kind {
            EntityKind::Section => self.sections.remove(&key.id).is_some(),
            EntityKind::Unit => self.units.remove(&key.id).is_some(),
            EntityKind::Story => self.stories.remove(&key.id).is_some(),
            EntityKind::Vocabulary => self.vocabulary.remove(&key.id).is_some(),
            EntityKind::Quiz => self.quizzes.remove(&key.id).is_some(),
        }
    }

    /// Rows of kind `child` that refer to `parent`. Pairs with no such link
    /// count zero.
    fn child_count(&self, parent: EntityKey, child: EntityKind) -> usize {
        let id = parent.id;
        match (parent.kind, child) {
            (EntityKind::Section, EntityKind::Unit) => {
                self.units.values().filter(|u| u.section_id == id).count()
            }
            (EntityKind::Unit, EntityKind::Quiz) => {
                self.quizzes.values().filter(|q| q.unit_id == Some(id)).count()
            }
            (EntityKind::Unit, EntityKind::Vocabulary) => {
                self.vocabulary.values().filter(|v| v.unit_id == id).count()
            }
            (EntityKind::Unit, EntityKind::Story) => {
                self.stories.values().filter(|s| s.unit_id == id).count()
            }
            (EntityKind::Story, EntityKind::Unit) => {
                self.units.values().filter(|u| u.story_id == Some(id)).count()
            }
            _ => 0,
        }
    }

    fn apply(&mut self, mutation: Mutation) -> StoreResult<()> {
        match mutation {
            Mutation::Insert(record) => {
                let key = record.key();
                if self.contains(key) {
                    return Err(StoreError::Conflict(key));
                }
                self.put(record);
            }
            Mutation::Update(record) => {
                let key = record.key();
                if !self.contains(key) {
                    return Err(StoreError::Missing(key));
                }
                self.put(record);
            }
            Mutation::Delete(key) => {
                if !self.remove(key) {
                    return Err(StoreError::Missing(key));
                }
            }
            Mutation::RequireExists(key) => {
                if !self.contains(key) {
                    return Err(StoreError::ParentMissing(key));
                }
            }
            Mutation::RequireNoChildren { parent, child } => {
                let count = self.child_count(parent, child);
                if count > 0 {
                    return Err(StoreError::HasChildren { parent, child, count });
                }
            }
        }
        Ok(())
    }
}

/// Content store held in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    sequences: RwLock<HashMap<EntityKind, i64>>,
    commits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of change sets committed so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn allocate_id(&self, kind: EntityKind) -> StoreResult<i64> {
        let mut sequences = self.sequences.write().await;
        let next = sequences.entry(kind).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    async fn apply(&self, changes: ChangeSet) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        for mutation in changes.into_mutations() {
            staged.apply(mutation)?;
        }
        *tables = staged;
        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn list_sections(&self) -> StoreResult<Vec<Section>> {
        Ok(self.tables.read().await.sections.values().cloned().collect())
    }

    async fn get_section(&self, id: SectionId) -> StoreResult<Option<Section>> {
        Ok(self.tables.read().await.sections.get(&id).cloned())
    }

    async fn list_units(&self) -> StoreResult<Vec<Unit>> {
        Ok(self.tables.read().await.units.values().cloned().collect())
    }

    async fn list_units_by_section(&self, section_id: SectionId) -> StoreResult<Vec<Unit>> {
        Ok(self
            .tables
            .read()
            .await
            .units
            .values()
            .filter(|u| u.section_id == section_id)
            .cloned()
            .collect())
    }

    async fn get_unit(&self, id: UnitId) -> StoreResult<Option<Unit>> {
        Ok(self.tables.read().await.units.get(&id).cloned())
    }

    async fn list_stories(&self) -> StoreResult<Vec<Story>> {
        Ok(self.tables.read().await.stories.values().cloned().collect())
    }

    async fn get_story(&self, id: StoryId) -> StoreResult<Option<Story>> {
        Ok(self.tables.read().await.stories.get(&id).cloned())
    }

    async fn list_vocabulary(&self) -> StoreResult<Vec<VocabularyItem>> {
        Ok(self.tables.read().await.vocabulary.values().cloned().collect())
    }

    async fn list_vocabulary_by_unit(&self, unit_id: UnitId) -> StoreResult<Vec<VocabularyItem>> {
        Ok(self
            .tables
            .read()
            .await
            .vocabulary
            .values()
            .filter(|v| v.unit_id == unit_id)
            .cloned()
            .collect())
    }

    async fn get_vocabulary(&self, id: VocabularyId) -> StoreResult<Option<VocabularyItem>> {
        Ok(self.tables.read().await.vocabulary.get(&id).cloned())
    }

    async fn list_quizzes_by_unit(&self, unit_id: UnitId) -> StoreResult<Vec<Quiz>> {
        Ok(self
            .tables
            .read()
            .await
            .quizzes
            .values()
            .filter(|q| q.unit_id == Some(unit_id))
            .cloned()
            .collect())
    }

    async fn get_quiz(&self, id: QuizId) -> StoreResult<Option<Quiz>> {
        Ok(self.tables.read().await.quizzes.get(&id).cloned())
    }
}

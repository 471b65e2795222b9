//! Structural rules of the Section → Unit → content hierarchy.
//!
//! These functions only inspect data handed to them; the service layer
//! fetches the rows and submits the resulting change sets.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::IntegrityError;
use crate::quiz::Quiz;
use crate::types::{
    QuizId, Section, SectionId, Story, StoryId, Unit, UnitId, VocabularyId, VocabularyItem,
};

/// Child counts keyed by parent id, in parent order.
pub type Counts<K> = IndexMap<K, usize>;

/// Entities shown in author-controlled order.
pub trait DisplayOrder {
    fn display_order(&self) -> i32;
    fn entity_id(&self) -> i64;
}

impl DisplayOrder for Section {
    fn display_order(&self) -> i32 {
        self.order
    }

    fn entity_id(&self) -> i64 {
        self.id
    }
}

impl DisplayOrder for Unit {
    fn display_order(&self) -> i32 {
        self.order
    }

    fn entity_id(&self) -> i64 {
        self.id
    }
}

/// Sort ascending by `order`, ties broken by id.
pub fn sort_for_display<T: DisplayOrder>(items: &mut [T]) {
    items.sort_by_key(|item| (item.display_order(), item.entity_id()));
}

/// A section may only be deleted once no unit points at it.
pub fn ensure_section_deletable(section_id: SectionId, units: &[Unit]) -> Result<(), IntegrityError> {
    let unit_count = units.iter().filter(|u| u.section_id == section_id).count();
    if unit_count > 0 {
        return Err(IntegrityError::SectionHasUnits {
            section_id,
            unit_count,
        });
    }
    Ok(())
}

/// Everything that goes away together with a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitCascade {
    pub unit_id: UnitId,
    pub quiz_ids: Vec<QuizId>,
    pub vocabulary_ids: Vec<VocabularyId>,
    pub story_ids: Vec<StoryId>,
}

impl UnitCascade {
    /// Collect the children owned by `unit_id`. Rows belonging to other units
    /// are ignored, so callers may pass unfiltered lists.
    pub fn plan(
        unit_id: UnitId,
        quizzes: &[Quiz],
        vocabulary: &[VocabularyItem],
        stories: &[Story],
    ) -> Self {
        Self {
            unit_id,
            quiz_ids: quizzes
                .iter()
                .filter(|q| q.unit_id == Some(unit_id))
                .map(|q| q.id)
                .collect(),
            vocabulary_ids: vocabulary
                .iter()
                .filter(|v| v.unit_id == unit_id)
                .map(|v| v.id)
                .collect(),
            story_ids: stories
                .iter()
                .filter(|s| s.unit_id == unit_id)
                .map(|s| s.id)
                .collect(),
        }
    }

    /// Number of child rows removed alongside the unit.
    pub fn child_count(&self) -> usize {
        self.quiz_ids.len() + self.vocabulary_ids.len() + self.story_ids.len()
    }
}

/// Units per section, zero for sections without units.
pub fn unit_counts(sections: &[Section], units: &[Unit]) -> Counts<SectionId> {
    let mut counts: IndexMap<SectionId, usize> = sections.iter().map(|s| (s.id, 0)).collect();
    for unit in units {
        if let Some(count) = counts.get_mut(&unit.section_id) {
            *count += 1;
        }
    }
    counts
}

/// Vocabulary items per unit, zero for units without vocabulary.
pub fn vocabulary_counts(units: &[Unit], vocabulary: &[VocabularyItem]) -> Counts<UnitId> {
    let mut counts: IndexMap<UnitId, usize> = units.iter().map(|u| (u.id, 0)).collect();
    for item in vocabulary {
        if let Some(count) = counts.get_mut(&item.unit_id) {
            *count += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairs::MatchingMap;
    use crate::quiz::{NewQuiz, QuizBody};
    use crate::types::{CefrLevel, QuizType};
    use pretty_assertions::assert_eq;

    fn section(id: i64, order: i32) -> Section {
        Section {
            id,
            title: format!("Section {id}"),
            cefr: CefrLevel::A1,
            order,
        }
    }

    fn unit(id: i64, section_id: i64, order: i32) -> Unit {
        Unit {
            id,
            section_id,
            grammar_point: "articles".to_string(),
            name: format!("Unit {id}"),
            order,
            story_id: None,
        }
    }

    fn vocab(id: i64, unit_id: i64) -> VocabularyItem {
        VocabularyItem {
            id,
            unit_id,
            word: "word".to_string(),
            definition: "definition".to_string(),
            image_url: None,
        }
    }

    fn quiz(id: i64, unit_id: i64) -> Quiz {
        NewQuiz {
            unit_id,
            quiz_type: QuizType::Matching,
            cefr: None,
            body: QuizBody::MatchTextText {
                question: "Match".to_string(),
                pairs: MatchingMap::from_pairs([("a", "b")]).unwrap(),
            },
            explanation: None,
        }
        .into_quiz(id)
    }

    #[test]
    fn display_sort_breaks_ties_by_id() {
        let mut sections = vec![section(3, 1), section(1, 2), section(2, 1)];
        sort_for_display(&mut sections);
        let ids: Vec<i64> = sections.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn section_with_units_is_not_deletable() {
        let units = vec![unit(1, 10, 0), unit(2, 10, 1), unit(3, 11, 0)];
        assert_eq!(
            ensure_section_deletable(10, &units),
            Err(IntegrityError::SectionHasUnits {
                section_id: 10,
                unit_count: 2
            })
        );
        assert_eq!(ensure_section_deletable(12, &units), Ok(()));
    }

    #[test]
    fn cascade_only_collects_own_children() {
        let quizzes = vec![quiz(1, 5), quiz(2, 6), quiz(3, 5)];
        let vocabulary = vec![vocab(1, 6), vocab(2, 5)];
        let plan = UnitCascade::plan(5, &quizzes, &vocabulary, &[]);

        assert_eq!(plan.quiz_ids, vec![1, 3]);
        assert_eq!(plan.vocabulary_ids, vec![2]);
        assert!(plan.story_ids.is_empty());
        assert_eq!(plan.child_count(), 3);
    }

    #[test]
    fn aggregates_include_empty_parents() {
        let sections = vec![section(1, 0), section(2, 1)];
        let units = vec![unit(10, 1, 0), unit(11, 1, 1)];
        let counts = unit_counts(&sections, &units);
        assert_eq!(counts.get(&1), Some(&2));
        assert_eq!(counts.get(&2), Some(&0));

        let vocab_counts = vocabulary_counts(&units, &[vocab(1, 10), vocab(2, 10), vocab(3, 99)]);
        assert_eq!(vocab_counts.get(&10), Some(&2));
        assert_eq!(vocab_counts.get(&11), Some(&0));
    }
}

//! Test fixtures and factory functions for creating test data.

use curriculum_core::{
    MatchingMap, NewQuiz, NewStory, NewVocabularyItem, Quiz, QuizBody, QuizType,
};

/// Unstored MCQ whose correct choice is `answer`.
pub fn mcq(answer: &str) -> Quiz {
    NewQuiz {
        unit_id: 0,
        quiz_type: QuizType::Mcq,
        cefr: None,
        body: QuizBody::TextToText {
            question: format!("Which one is {answer}?"),
            choices: vec![answer.to_string(), "wrong".to_string(), "also wrong".to_string()],
            answer: answer.to_string(),
        },
        explanation: None,
    }
    .into_quiz(0)
}

/// Unstored matching quiz over `pairs`.
pub fn matching_quiz(pairs: &[(&str, &str)]) -> Quiz {
    NewQuiz {
        unit_id: 0,
        quiz_type: QuizType::Matching,
        cefr: None,
        body: QuizBody::MatchTextText {
            question: "Match the words".to_string(),
            pairs: MatchingMap::from_pairs(pairs.iter().copied()).unwrap(),
        },
        explanation: None,
    }
    .into_quiz(0)
}

/// Same shape as a generated placement list: no ids, no unit.
pub fn placement_list() -> Vec<Quiz> {
    ["a", "b", "c"]
        .into_iter()
        .map(|answer| {
            let mut quiz = mcq(answer);
            quiz.unit_id = None;
            quiz
        })
        .collect()
}

/// Valid MCQ ready to store under `unit_id`.
pub fn new_mcq(unit_id: i64, answer: &str) -> NewQuiz {
    NewQuiz::from_quiz(mcq(answer), unit_id)
}

pub fn new_vocabulary(unit_id: i64, word: &str) -> NewVocabularyItem {
    NewVocabularyItem {
        unit_id,
        word: word.to_string(),
        definition: format!("definition of {word}"),
        image_url: None,
    }
}

pub fn new_story(unit_id: i64, title: &str) -> NewStory {
    NewStory {
        unit_id,
        title: title.to_string(),
        content: "Once upon a time.".to_string(),
        audio_url: None,
        keywords: Default::default(),
    }
}

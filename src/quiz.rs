//! Vocabulary quizzes: multiple-choice questions built from one lesson's
//! vocabulary, and grading of submitted answers.

use std::collections::HashMap;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::domain::Vocabulary;
use crate::error::AppError;
use crate::util::normalize_answer;

pub const DEFAULT_QUESTION_COUNT: usize = 10;
pub const MAX_QUESTION_COUNT: usize = 50;
const CHOICES_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub vocabulary_id: i64,
  pub word: String,
  pub reading: String,
  /// Candidate meanings; exactly one is correct.
  pub choices: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
  pub lesson_id: i64,
  pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
  pub vocabulary_id: i64,
  pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
  pub answers: Vec<QuizAnswer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
  pub vocabulary_id: i64,
  pub correct: bool,
  pub expected: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
  pub total: usize,
  pub correct: usize,
  pub score: f64,
  pub results: Vec<AnswerResult>,
}

/// Pick up to `count` entries at random and give each the right meaning plus
/// up to three distinct wrong meanings from the same lesson, shuffled.
pub fn build_quiz<R: Rng + ?Sized>(lesson_id: i64, vocab: &[Vocabulary], count: usize, rng: &mut R) -> Quiz {
  let count = count.clamp(1, MAX_QUESTION_COUNT).min(vocab.len());
  let picked: Vec<&Vocabulary> = vocab.choose_multiple(rng, count).collect();

  let questions = picked
    .into_iter()
    .map(|item| {
      let mut distractors: Vec<&str> = vocab
        .iter()
        .filter(|v| v.id != item.id && normalize_answer(&v.meaning) != normalize_answer(&item.meaning))
        .map(|v| v.meaning.as_str())
        .collect();
      distractors.sort_by_cached_key(|m| normalize_answer(m));
      distractors.dedup_by_key(|m| normalize_answer(m));
      distractors.shuffle(rng);

      let mut choices: Vec<String> = distractors
        .into_iter()
        .take(CHOICES_PER_QUESTION - 1)
        .map(str::to_string)
        .collect();
      choices.push(item.meaning.clone());
      choices.shuffle(rng);

      QuizQuestion {
        vocabulary_id: item.id,
        word: item.word.clone(),
        reading: item.reading.clone(),
        choices,
      }
    })
    .collect();

  Quiz { lesson_id, questions }
}

/// Grade answers against the lesson's vocabulary. Comparison ignores case and
/// extra whitespace. Answers for entries outside the lesson are rejected.
pub fn grade(vocab: &[Vocabulary], submission: &QuizSubmission) -> Result<QuizResult, AppError> {
  if submission.answers.is_empty() {
    return Err(AppError::bad_request("At least one answer is required"));
  }
  let by_id: HashMap<i64, &Vocabulary> = vocab.iter().map(|v| (v.id, v)).collect();

  let mut results = Vec::with_capacity(submission.answers.len());
  for a in &submission.answers {
    let item = by_id
      .get(&a.vocabulary_id)
      .ok_or_else(|| AppError::bad_request(format!("Vocabulary {} is not part of this lesson", a.vocabulary_id)))?;
    results.push(AnswerResult {
      vocabulary_id: item.id,
      correct: normalize_answer(&a.answer) == normalize_answer(&item.meaning),
      expected: item.meaning.clone(),
    });
  }

  let total = results.len();
  let correct = results.iter().filter(|r| r.correct).count();
  Ok(QuizResult {
    total,
    correct,
    score: 100.0 * correct as f64 / total as f64,
    results,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Section;
  use rand::{rngs::StdRng, SeedableRng};

  fn vocab(id: i64, word: &str, meaning: &str) -> Vocabulary {
    Vocabulary {
      id,
      lesson_id: 1,
      word: word.into(),
      reading: String::new(),
      meaning: meaning.into(),
      example: String::new(),
      difficulty: "beginner".into(),
      section: Section::Main,
      order: id,
    }
  }

  fn sample() -> Vec<Vocabulary> {
    vec![
      vocab(1, "물", "water"),
      vocab(2, "밥", "rice"),
      vocab(3, "사과", "apple"),
      vocab(4, "우유", "milk"),
      vocab(5, "빵", "bread"),
      vocab(6, "식수", "Water"),
    ]
  }

  #[test]
  fn every_question_has_its_answer_among_distinct_choices() {
    let mut rng = StdRng::seed_from_u64(7);
    let items = sample();
    let quiz = build_quiz(1, &items, 4, &mut rng);
    assert_eq!(quiz.questions.len(), 4);
    for q in &quiz.questions {
      let item = items.iter().find(|v| v.id == q.vocabulary_id).unwrap();
      assert!(q.choices.contains(&item.meaning));
      assert_eq!(q.choices.len(), CHOICES_PER_QUESTION);
      let normalized: std::collections::HashSet<String> = q.choices.iter().map(|c| normalize_answer(c)).collect();
      assert_eq!(normalized.len(), q.choices.len(), "duplicate choice in {:?}", q.choices);
    }
  }

  #[test]
  fn question_count_is_capped_by_vocabulary() {
    let mut rng = StdRng::seed_from_u64(1);
    let items = sample();
    assert_eq!(build_quiz(1, &items, 100, &mut rng).questions.len(), items.len());
    assert!(build_quiz(1, &[], 5, &mut rng).questions.is_empty());

    let single = build_quiz(1, &items[..1], 5, &mut rng);
    assert_eq!(single.questions[0].choices, ["water"]);
  }

  #[test]
  fn grading_is_lenient_on_case_and_spacing() {
    let items = sample();
    let submission = QuizSubmission {
      answers: vec![
        QuizAnswer { vocabulary_id: 1, answer: " Water ".into() },
        QuizAnswer { vocabulary_id: 2, answer: "bread".into() },
      ],
    };
    let result = grade(&items, &submission).unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(result.correct, 1);
    assert_eq!(result.score, 50.0);
    assert_eq!(result.results[1].expected, "rice");
  }

  #[test]
  fn grading_rejects_foreign_or_empty_submissions() {
    let items = sample();
    let foreign = QuizSubmission { answers: vec![QuizAnswer { vocabulary_id: 99, answer: "x".into() }] };
    assert!(matches!(grade(&items, &foreign), Err(AppError::BadRequest(_))));
    assert!(grade(&items, &QuizSubmission { answers: vec![] }).is_err());
  }
}

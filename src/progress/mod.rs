//! Learner progress: streaks, quiz scores and achievements.
//!
//! The state lives with the client. [`UserProgress`] carries it and its
//! transition methods are pure; [`ProgressTracker`] pairs the state with a
//! [`ProgressStorage`] and saves after every transition.

pub mod achievements;
pub mod storage;

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use achievements::{Achievement, AchievementStatus};
pub use storage::{FileProgressStorage, MemoryProgressStorage, ProgressStorage, PROGRESS_STORAGE_KEY};

pub const MAX_SCORE: u32 = 100;
pub const HIGH_SCORE: u32 = 80;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("score {0} is outside 0..=100")]
    InvalidScore(u32),
    #[error("progress storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("progress blob is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VisitOutcome {
    /// Already visited today.
    Unchanged,
    /// Visited yesterday; streak grew by one.
    Extended,
    /// Gap of two or more days; streak restarted at one.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub streak: u32,
    pub total_words: u32,
    pub average_score: u32,
    pub last_visit: NaiveDate,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub quiz_scores: BTreeMap<String, u32>,
}

impl UserProgress {
    /// State for a first-ever visit.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            streak: 1,
            total_words: 0,
            average_score: 0,
            last_visit: today,
            achievements: Vec::new(),
            quiz_scores: BTreeMap::new(),
        }
    }

    pub fn record_visit(&mut self, today: NaiveDate) -> VisitOutcome {
        if self.last_visit == today {
            return VisitOutcome::Unchanged;
        }

        let outcome = if today.checked_sub_days(Days::new(1)) == Some(self.last_visit) {
            self.streak = self.streak.saturating_add(1);
            VisitOutcome::Extended
        } else {
            self.streak = 1;
            VisitOutcome::Reset
        };
        self.last_visit = today;
        outcome
    }

    /// Records (or overwrites) the score for a word and recomputes aggregates.
    pub fn record_quiz_score(&mut self, word_id: &str, score: u32) -> Result<(), ProgressError> {
        if score > MAX_SCORE {
            return Err(ProgressError::InvalidScore(score));
        }

        self.quiz_scores.insert(word_id.to_string(), score);
        self.average_score = rounded_mean(self.quiz_scores.values().copied());
        let scored = u32::try_from(self.quiz_scores.len()).unwrap_or(u32::MAX);
        self.total_words = self.total_words.max(scored);
        Ok(())
    }

    pub fn set_total_words(&mut self, count: u32) {
        self.total_words = count;
    }

    pub fn has_achievement(&self, tag: &str) -> bool {
        self.achievements.iter().any(|t| t == tag)
    }

    /// Adds every newly satisfied achievement and returns those added.
    pub fn check_achievements(&mut self) -> Vec<Achievement> {
        let mut unlocked = Vec::new();
        for achievement in Achievement::ALL {
            if achievement.is_satisfied(self) && !self.has_achievement(achievement.tag()) {
                self.achievements.push(achievement.tag().to_string());
                unlocked.push(achievement);
            }
        }
        unlocked
    }

    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            streak: self.streak,
            total_words: self.total_words,
            average_score: self.average_score,
            last_visit: self.last_visit,
            quizzes_taken: self.quiz_scores.len(),
            high_scores: self.quiz_scores.values().filter(|s| **s >= HIGH_SCORE).count(),
            achievements: Achievement::ALL
                .into_iter()
                .map(|a| AchievementStatus::for_progress(a, self))
                .collect(),
        }
    }
}

/// Quiz percentage, rounded half up. An empty quiz scores zero.
pub fn quiz_score(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total) as u64;
    let total = total as u64;
    ((correct * 200 + total) / (total * 2)) as u32
}

fn rounded_mean(values: impl Iterator<Item = u32>) -> u32 {
    let (sum, count) = values.fold((0u64, 0u64), |(sum, count), v| (sum + u64::from(v), count + 1));
    if count == 0 {
        return 0;
    }
    ((sum * 2 + count) / (count * 2)) as u32
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub streak: u32,
    pub total_words: u32,
    pub average_score: u32,
    pub last_visit: NaiveDate,
    pub quizzes_taken: usize,
    pub high_scores: usize,
    pub achievements: Vec<AchievementStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitReport {
    pub outcome: VisitOutcome,
    pub streak: u32,
    pub unlocked: Vec<Achievement>,
}

/// Owns the progress state and persists it after each transition.
pub struct ProgressTracker<S: ProgressStorage> {
    storage: S,
    progress: UserProgress,
}

impl<S: ProgressStorage> ProgressTracker<S> {
    /// Loads the stored blob, or creates and saves first-visit state.
    pub fn load(storage: S, today: NaiveDate) -> Result<Self, ProgressError> {
        let progress = match storage.load()? {
            Some(progress) => progress,
            None => {
                let fresh = UserProgress::new(today);
                storage.save(&fresh)?;
                fresh
            }
        };
        Ok(Self { storage, progress })
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn visit(&mut self, today: NaiveDate) -> Result<VisitReport, ProgressError> {
        let outcome = self.progress.record_visit(today);
        let unlocked = self.commit()?;
        Ok(VisitReport {
            outcome,
            streak: self.progress.streak,
            unlocked,
        })
    }

    pub fn complete_quiz(
        &mut self,
        word_id: &str,
        score: u32,
    ) -> Result<Vec<Achievement>, ProgressError> {
        self.progress.record_quiz_score(word_id, score)?;
        self.commit()
    }

    pub fn set_total_words(&mut self, count: u32) -> Result<Vec<Achievement>, ProgressError> {
        self.progress.set_total_words(count);
        self.commit()
    }

    fn commit(&mut self) -> Result<Vec<Achievement>, ProgressError> {
        let unlocked = self.progress.check_achievements();
        for achievement in &unlocked {
            tracing::info!(tag = achievement.tag(), "achievement unlocked");
        }
        self.storage.save(&self.progress)?;
        Ok(unlocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn first_visit_starts_streak_at_one() {
        let mut progress = UserProgress::new(day("2024-03-10"));
        assert_eq!(progress.streak, 1);
        assert_eq!(progress.record_visit(day("2024-03-10")), VisitOutcome::Unchanged);
        assert_eq!(progress.streak, 1);
    }

    #[test]
    fn consecutive_day_extends_streak() {
        let mut progress = UserProgress::new(day("2024-02-28"));
        progress.streak = 4;

        assert_eq!(progress.record_visit(day("2024-02-29")), VisitOutcome::Extended);
        assert_eq!(progress.streak, 5);
        assert_eq!(progress.last_visit, day("2024-02-29"));
    }

    #[test]
    fn gap_resets_streak() {
        let mut progress = UserProgress::new(day("2024-03-01"));
        progress.streak = 12;

        assert_eq!(progress.record_visit(day("2024-03-03")), VisitOutcome::Reset);
        assert_eq!(progress.streak, 1);
        assert_eq!(progress.last_visit, day("2024-03-03"));
    }

    #[test]
    fn average_of_eighty_and_hundred_is_ninety() {
        let mut progress = UserProgress::new(day("2024-03-01"));
        progress.record_quiz_score("a", 80).unwrap();
        progress.record_quiz_score("b", 100).unwrap();

        assert_eq!(progress.average_score, 90);
        assert_eq!(progress.total_words, 2);
    }

    #[test]
    fn rescoring_a_word_overwrites() {
        let mut progress = UserProgress::new(day("2024-03-01"));
        progress.record_quiz_score("a", 40).unwrap();
        progress.record_quiz_score("a", 100).unwrap();

        assert_eq!(progress.quiz_scores.len(), 1);
        assert_eq!(progress.average_score, 100);
        assert_eq!(progress.total_words, 1);
    }

    #[test]
    fn average_rounds_half_up() {
        let mut progress = UserProgress::new(day("2024-03-01"));
        progress.record_quiz_score("a", 60).unwrap();
        progress.record_quiz_score("b", 81).unwrap();
        assert_eq!(progress.average_score, 71);
    }

    #[test]
    fn total_words_never_shrinks_on_quiz() {
        let mut progress = UserProgress::new(day("2024-03-01"));
        progress.set_total_words(40);
        progress.record_quiz_score("a", 70).unwrap();
        assert_eq!(progress.total_words, 40);
    }

    #[test]
    fn rejects_scores_above_hundred() {
        let mut progress = UserProgress::new(day("2024-03-01"));
        assert!(matches!(
            progress.record_quiz_score("a", 101),
            Err(ProgressError::InvalidScore(101))
        ));
        assert!(progress.quiz_scores.is_empty());
    }

    #[test]
    fn achievements_are_added_once() {
        let mut progress = UserProgress::new(day("2024-03-01"));
        progress.streak = 30;
        progress.record_quiz_score("a", 95).unwrap();

        let unlocked = progress.check_achievements();
        assert_eq!(
            unlocked,
            vec![
                Achievement::SevenDayStreak,
                Achievement::ThirtyDayStreak,
                Achievement::QuizMaster
            ]
        );
        assert!(progress.check_achievements().is_empty());
        assert_eq!(progress.achievements.len(), 3);
    }

    #[test]
    fn earned_achievements_survive_streak_reset() {
        let mut progress = UserProgress::new(day("2024-03-01"));
        progress.streak = 7;
        progress.check_achievements();

        progress.record_visit(day("2024-03-20"));
        progress.check_achievements();

        assert_eq!(progress.streak, 1);
        assert!(progress.has_achievement("7-day-streak"));
    }

    #[test]
    fn quiz_score_rounds_percentage() {
        assert_eq!(quiz_score(4, 5), 80);
        assert_eq!(quiz_score(2, 3), 67);
        assert_eq!(quiz_score(1, 3), 33);
        assert_eq!(quiz_score(0, 0), 0);
        assert_eq!(quiz_score(7, 5), 100);
    }

    #[test]
    fn summary_counts_high_scores() {
        let mut progress = UserProgress::new(day("2024-03-01"));
        progress.record_quiz_score("a", 80).unwrap();
        progress.record_quiz_score("b", 79).unwrap();
        progress.record_quiz_score("c", 100).unwrap();

        let summary = progress.summary();
        assert_eq!(summary.quizzes_taken, 3);
        assert_eq!(summary.high_scores, 2);
        assert_eq!(summary.achievements.len(), Achievement::ALL.len());
    }

    #[test]
    fn tracker_saves_after_every_transition() {
        let storage = MemoryProgressStorage::new();
        let mut tracker = ProgressTracker::load(&storage, day("2024-03-01")).unwrap();
        assert!(storage.raw().is_some());

        let report = tracker.visit(day("2024-03-02")).unwrap();
        assert_eq!(report.outcome, VisitOutcome::Extended);
        assert_eq!(storage.load().unwrap().unwrap().streak, 2);

        tracker.complete_quiz("w", 90).unwrap();
        let stored = storage.load().unwrap().unwrap();
        assert_eq!(stored.quiz_scores.get("w"), Some(&90));
        assert!(stored.has_achievement("quiz-master"));
    }

    #[test]
    fn tracker_resumes_from_stored_blob() {
        let storage = MemoryProgressStorage::new();
        let mut seeded = UserProgress::new(day("2024-03-01"));
        seeded.streak = 6;
        storage.save(&seeded).unwrap();

        let mut tracker = ProgressTracker::load(&storage, day("2024-03-02")).unwrap();
        let report = tracker.visit(day("2024-03-02")).unwrap();

        assert_eq!(report.streak, 7);
        assert_eq!(report.unlocked, vec![Achievement::SevenDayStreak]);
    }
}

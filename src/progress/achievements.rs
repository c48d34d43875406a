use std::fmt;

use serde::Serialize;

use super::UserProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    Streak,
    TotalWords,
    AverageScore,
}

/// One-way unlockable badges. Tags are the persisted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum Achievement {
    SevenDayStreak,
    ThirtyDayStreak,
    HundredDayStreak,
    CenturyClub,
    WordMaster,
    QuizMaster,
}

impl Achievement {
    pub const ALL: [Achievement; 6] = [
        Achievement::SevenDayStreak,
        Achievement::ThirtyDayStreak,
        Achievement::HundredDayStreak,
        Achievement::CenturyClub,
        Achievement::WordMaster,
        Achievement::QuizMaster,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Achievement::SevenDayStreak => "7-day-streak",
            Achievement::ThirtyDayStreak => "30-day-streak",
            Achievement::HundredDayStreak => "100-day-streak",
            Achievement::CenturyClub => "century-club",
            Achievement::WordMaster => "word-master",
            Achievement::QuizMaster => "quiz-master",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tag() == tag)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Achievement::SevenDayStreak => "7-Day Streak",
            Achievement::ThirtyDayStreak => "30-Day Streak",
            Achievement::HundredDayStreak => "100-Day Streak",
            Achievement::CenturyClub => "Century Club",
            Achievement::WordMaster => "Word Master",
            Achievement::QuizMaster => "Quiz Master",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::SevenDayStreak => "Learn for 7 consecutive days",
            Achievement::ThirtyDayStreak => "Learn for 30 consecutive days",
            Achievement::HundredDayStreak => "Learn for 100 consecutive days",
            Achievement::CenturyClub => "Learn 100 words",
            Achievement::WordMaster => "Learn 500 words",
            Achievement::QuizMaster => "Achieve 90% average quiz score",
        }
    }

    pub fn threshold(&self) -> u32 {
        match self {
            Achievement::SevenDayStreak => 7,
            Achievement::ThirtyDayStreak => 30,
            Achievement::HundredDayStreak => 100,
            Achievement::CenturyClub => 100,
            Achievement::WordMaster => 500,
            Achievement::QuizMaster => 90,
        }
    }

    fn metric(&self) -> Metric {
        match self {
            Achievement::SevenDayStreak
            | Achievement::ThirtyDayStreak
            | Achievement::HundredDayStreak => Metric::Streak,
            Achievement::CenturyClub | Achievement::WordMaster => Metric::TotalWords,
            Achievement::QuizMaster => Metric::AverageScore,
        }
    }

    fn current_value(&self, progress: &UserProgress) -> u32 {
        match self.metric() {
            Metric::Streak => progress.streak,
            Metric::TotalWords => progress.total_words,
            Metric::AverageScore => progress.average_score,
        }
    }

    pub fn is_satisfied(&self, progress: &UserProgress) -> bool {
        self.current_value(progress) >= self.threshold()
    }

    /// Percentage towards the threshold, capped at 100.
    pub fn progress_percent(&self, progress: &UserProgress) -> u32 {
        let value = u64::from(self.current_value(progress));
        let threshold = u64::from(self.threshold());
        ((value * 100) / threshold).min(100) as u32
    }
}

impl From<Achievement> for &'static str {
    fn from(value: Achievement) -> Self {
        value.tag()
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
    pub tag: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub earned: bool,
    pub progress: u32,
}

impl AchievementStatus {
    pub fn for_progress(achievement: Achievement, progress: &UserProgress) -> Self {
        let earned = progress.has_achievement(achievement.tag());
        Self {
            tag: achievement.tag(),
            name: achievement.name(),
            description: achievement.description(),
            earned,
            progress: if earned {
                100
            } else {
                achievement.progress_percent(progress)
            },
        }
    }
}

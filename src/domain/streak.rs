/// Streak calculation functionality
///
/// StreakEngine is pure: it receives a completion history and a frequency and
/// derives the current streak, the longest streak and summary statistics. It
/// never touches storage. The only outside input is the Clock, read by the
/// daily gap-to-today rule.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Clock, DayPeriod, Frequency, Habit, HabitCompletion, IsoWeekPeriod, MonthPeriod, PeriodRule,
};

/// Summary statistics for one habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStats {
    /// Completion records of any state
    pub total_days: u32,
    /// Records currently marked completed
    pub completed_days: u32,
    /// `completed_days / total_days` as a percentage, rounded to 2 decimals
    pub completion_rate: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Computes streaks from completion histories
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakEngine {
    clock: Clock,
}

impl StreakEngine {
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Consecutive periods with a completed record, ending at the most recent one
    ///
    /// Daily habits lose their streak once more than one day has passed since
    /// the last completed day. Weekly and monthly habits only look at the
    /// completed periods themselves and are not compared against today.
    pub fn current_streak(&self, completions: &[HabitCompletion], frequency: Frequency) -> u32 {
        self.current_streak_for_dates(&completed_dates(completions), frequency)
    }

    /// `current_streak` over the completed days alone
    pub fn current_streak_for_dates(&self, dates: &[NaiveDate], frequency: Frequency) -> u32 {
        let Some(most_recent) = dates.iter().max().copied() else {
            return 0;
        };

        match frequency {
            Frequency::Daily => {
                let gap = (self.clock.today() - most_recent).num_days();
                if gap > 1 {
                    return 0;
                }
                run_from_latest::<DayPeriod>(dates)
            }
            Frequency::Weekly => run_from_latest::<IsoWeekPeriod>(dates),
            Frequency::Monthly => run_from_latest::<MonthPeriod>(dates),
        }
    }

    /// Best run of consecutive periods anywhere in the history
    pub fn longest_streak(&self, completions: &[HabitCompletion], frequency: Frequency) -> u32 {
        let dates = completed_dates(completions);
        match frequency {
            Frequency::Daily => longest_run::<DayPeriod>(&dates),
            Frequency::Weekly => longest_run::<IsoWeekPeriod>(&dates),
            Frequency::Monthly => longest_run::<MonthPeriod>(&dates),
        }
    }

    /// Totals, completion rate and streaks for a habit
    ///
    /// The current streak is the habit's cached value, which the store keeps
    /// in sync on every toggle.
    pub fn habit_stats(&self, habit: &Habit, completions: &[HabitCompletion]) -> HabitStats {
        let total_days = completions.len() as u32;
        let completed_days = completions.iter().filter(|c| c.completed).count() as u32;

        let completion_rate = if total_days == 0 {
            0.0
        } else {
            let percent = f64::from(completed_days) / f64::from(total_days) * 100.0;
            (percent * 100.0).round() / 100.0
        };

        HabitStats {
            total_days,
            completed_days,
            completion_rate,
            current_streak: habit.streak,
            longest_streak: self.longest_streak(completions, habit.frequency),
        }
    }
}

fn completed_dates(completions: &[HabitCompletion]) -> Vec<NaiveDate> {
    completions
        .iter()
        .filter(|completion| completion.completed)
        .map(|completion| completion.date)
        .collect()
}

/// Counts distinct periods, newest first, while the i-th one is exactly i
/// periods before the newest
fn run_from_latest<R: PeriodRule>(dates: &[NaiveDate]) -> u32 {
    let keys: BTreeSet<R::Key> = dates.iter().map(|date| R::key(*date)).collect();
    let Some(latest) = keys.iter().next_back().copied() else {
        return 0;
    };

    keys.iter()
        .rev()
        .enumerate()
        .take_while(|(index, key)| R::distance(latest, **key) == *index as i64)
        .count() as u32
}

/// Walks every completed date in ascending order. Neighbours exactly one
/// period apart extend the run; anything else, including two dates in the
/// same period, starts a new run of 1.
fn longest_run<R: PeriodRule>(dates: &[NaiveDate]) -> u32 {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();

    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<R::Key> = None;

    for key in sorted.into_iter().map(R::key) {
        current = match previous {
            Some(prev) if R::distance(key, prev) == 1 => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(key);
    }

    longest
}

/// Analytics over habit month views
///
/// These feed the dashboard: a per-day completion summary for the calendar
/// heat map and the list of habits currently on their best run.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{HabitStreakView, HabitWithCompletions, Month};

/// Completed habits out of all habits on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub completed: u32,
    pub total: u32,
}

impl DaySummary {
    /// Completed share as a percentage, 0 when there are no habits
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.completed) / f64::from(self.total) * 100.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// One summary for every day of `month`
    ///
    /// `total` counts all habits in the view, so a day with no records
    /// still shows how many habits could have been done.
    pub fn month_summary(
        &self,
        habits: &[HabitWithCompletions],
        month: Month,
    ) -> BTreeMap<NaiveDate, DaySummary> {
        let total = habits.len() as u32;

        month
            .days()
            .map(|day| {
                let completed = habits
                    .iter()
                    .filter(|habit| habit.is_completed_on(day))
                    .count() as u32;
                (day, DaySummary { completed, total })
            })
            .collect()
    }

    /// Habits whose current streak is also their longest
    ///
    /// A habit that was never completed counts too (0 of 0).
    pub fn active_streaks<'a>(&self, views: &'a [HabitStreakView]) -> Vec<&'a HabitStreakView> {
        views.iter().filter(|view| view.is_active_streak()).collect()
    }
}

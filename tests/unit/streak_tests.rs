/// Streak calculations through the public StreakEngine API
use chrono::{Duration, NaiveDate, Utc};
use lifenode::*;

fn date(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

fn history(dates: &[NaiveDate]) -> Vec<HabitCompletion> {
    dates
        .iter()
        .enumerate()
        .map(|(i, day)| HabitCompletion {
            id: CompletionId(i as i64 + 1),
            habit_id: HabitId(1),
            date: *day,
            month: Month::of(*day),
            completed: true,
        })
        .collect()
}

fn offsets(base: NaiveDate, days: &[i64]) -> Vec<NaiveDate> {
    days.iter().map(|d| base + Duration::days(*d)).collect()
}

#[test]
fn test_daily_run_stops_at_first_gap() {
    let today = date("2024-03-10");
    let engine = StreakEngine::new(Clock::Fixed(today));

    let three = offsets(today, &[0, -1, -2]);
    assert_eq!(engine.current_streak(&history(&three), Frequency::Daily), 3);

    let with_gap = offsets(today, &[0, -1, -2, -4]);
    assert_eq!(engine.current_streak(&history(&with_gap), Frequency::Daily), 3);
}

#[test]
fn test_daily_streak_survives_until_tomorrow_only() {
    let completed = history(&[date("2024-03-08"), date("2024-03-09")]);

    let next_day = StreakEngine::new(Clock::Fixed(date("2024-03-10")));
    assert_eq!(next_day.current_streak(&completed, Frequency::Daily), 2);

    let two_days_later = StreakEngine::new(Clock::Fixed(date("2024-03-11")));
    assert_eq!(two_days_later.current_streak(&completed, Frequency::Daily), 0);
}

#[test]
fn test_longest_streak_finds_later_run() {
    let base = date("2024-01-01");
    let engine = StreakEngine::default();
    let completed = history(&offsets(base, &[0, 1, 2, 5, 6, 7, 8]));

    assert_eq!(engine.longest_streak(&completed, Frequency::Daily), 4);
}

#[test]
fn test_longest_streak_edges() {
    let engine = StreakEngine::default();

    assert_eq!(engine.longest_streak(&[], Frequency::Daily), 0);
    assert_eq!(
        engine.longest_streak(&history(&[date("2024-01-01")]), Frequency::Monthly),
        1
    );
}

#[test]
fn test_weekly_streak_ignores_how_long_ago_it_was() {
    // Three consecutive ISO weeks, the last one months before "today"
    let completed = history(&[date("2024-01-02"), date("2024-01-10"), date("2024-01-17")]);
    let engine = StreakEngine::new(Clock::Fixed(date("2024-06-01")));

    assert_eq!(engine.current_streak(&completed, Frequency::Weekly), 3);
}

#[test]
fn test_weekly_streak_across_year_end() {
    // 2024-W52, 2025-W01 (starts 2024-12-30), 2025-W02
    let completed = history(&[date("2024-12-24"), date("2024-12-31"), date("2025-01-08")]);
    let engine = StreakEngine::new(Clock::Fixed(date("2025-01-08")));

    assert_eq!(engine.current_streak(&completed, Frequency::Weekly), 3);
    assert_eq!(engine.longest_streak(&completed, Frequency::Weekly), 3);
}

#[test]
fn test_second_entry_in_one_week_resets_longest_run() {
    // W09, W10, W10, W11
    let completed = history(&[
        date("2024-02-27"),
        date("2024-03-04"),
        date("2024-03-08"),
        date("2024-03-12"),
    ]);
    let engine = StreakEngine::default();

    assert_eq!(engine.current_streak(&completed, Frequency::Weekly), 3);
    assert_eq!(engine.longest_streak(&completed, Frequency::Weekly), 2);
}

#[test]
fn test_monthly_streak_across_year_end() {
    let completed = history(&[date("2023-11-15"), date("2023-12-01"), date("2024-01-31")]);
    let engine = StreakEngine::default();

    assert_eq!(engine.current_streak(&completed, Frequency::Monthly), 3);

    let broken = history(&[date("2023-10-15"), date("2023-12-01"), date("2024-01-31")]);
    assert_eq!(engine.current_streak(&broken, Frequency::Monthly), 2);
}

#[test]
fn test_uncompleted_records_are_ignored() {
    let today = date("2024-03-10");
    let engine = StreakEngine::new(Clock::Fixed(today));
    let mut records = history(&offsets(today, &[0, -1]));
    records[0].completed = false;

    assert_eq!(engine.current_streak(&records, Frequency::Daily), 1);
}

#[test]
fn test_completion_rate_rounding() {
    let engine = StreakEngine::default();
    let habit = Habit {
        id: HabitId(1),
        name: "Exercise".to_string(),
        frequency: Frequency::Daily,
        streak: 2,
        last_completed: None,
        created_at: Utc::now(),
        month: "2024-03".parse().unwrap(),
    };

    let days: Vec<_> = (1..=10).map(|d| date(&format!("2024-03-{:02}", d))).collect();
    let mut records = history(&days);
    for record in records.iter_mut().take(3) {
        record.completed = false;
    }

    let stats = engine.habit_stats(&habit, &records);
    assert_eq!(stats.total_days, 10);
    assert_eq!(stats.completed_days, 7);
    assert_eq!(stats.completion_rate, 70.0);
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.longest_streak, 7);

    let stats = engine.habit_stats(&habit, &records[2..5]);
    assert_eq!(stats.completion_rate, 66.67);

    let empty = engine.habit_stats(&habit, &[]);
    assert_eq!(empty.completion_rate, 0.0);
}

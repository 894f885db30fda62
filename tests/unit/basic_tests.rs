/// Basic unit tests to verify core types
use lifenode::*;

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_habit_creation() {
        let habit = NewHabit::new("Exercise", Frequency::Daily, "2024-03".parse().unwrap());

        assert!(habit.is_ok());
        let habit = habit.unwrap();
        assert_eq!(habit.name, "Exercise");
        assert_eq!(habit.month.to_string(), "2024-03");
    }

    #[test]
    fn test_habit_name_validation() {
        let march: Month = "2024-03".parse().unwrap();

        assert!(NewHabit::new("   ", Frequency::Daily, march).is_err());
        assert!(NewHabit::new(&"x".repeat(101), Frequency::Daily, march).is_err());
        assert!(NewHabit::new(&"x".repeat(100), Frequency::Daily, march).is_ok());
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("daily".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!(" Weekly ".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert_eq!("MONTHLY".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert!("hourly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_month_parsing() {
        let month: Month = "2024-02".parse().unwrap();
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 2);
        assert_eq!(month.days().count(), 29);

        assert!("2024-13".parse::<Month>().is_err());
        assert!("2024-3".parse::<Month>().is_err());
        assert!("March".parse::<Month>().is_err());
    }

    #[test]
    fn test_completion_month_follows_date() {
        let date = parse_date("2024-03-05").unwrap();
        let completion = NewCompletion::completed(HabitId(1), date);

        assert!(completion.completed);
        assert_eq!(completion.month.to_string(), "2024-03");
    }

    #[test]
    fn test_period_keys() {
        let date = parse_date("2024-12-30").unwrap();

        assert_eq!(Frequency::Daily.period_key(date), "2024-12-30");
        assert_eq!(Frequency::Weekly.period_key(date), "2025-W01");
        assert_eq!(Frequency::Monthly.period_key(date), "2024-12");
    }

    #[test]
    fn test_period_distance_across_years() {
        let later = parse_date("2025-01-06").unwrap();
        let earlier = parse_date("2024-12-23").unwrap();

        assert_eq!(Frequency::Weekly.period_distance(later, earlier), 2);
        assert_eq!(Frequency::Monthly.period_distance(later, earlier), 1);
        assert_eq!(Frequency::Daily.period_distance(later, earlier), 14);
    }

    #[test]
    fn test_habit_json_shape() {
        let json = serde_json::to_value(Frequency::Weekly).unwrap();
        assert_eq!(json, serde_json::json!("weekly"));

        let json = serde_json::to_value("2024-03".parse::<Month>().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!("2024-03"));
    }
}

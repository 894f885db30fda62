/// Basic integration tests
use lifenode::*;
use tempfile::{tempdir, NamedTempFile};

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_usable_database() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let app = LifeNode::open(temp_file.path().to_path_buf()).expect("Failed to open LifeNode");

        assert!(app.habits().get_all_habits().await.unwrap().is_empty());
        assert!(app.transcripts().list_problems().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifenode.db");
        let clock = Clock::Fixed(parse_date("2024-03-02").unwrap());

        let habit_id = {
            let app = LifeNode::open_with_clock(db_path.clone(), clock).unwrap();
            let habit = app
                .habits()
                .create_habit("Exercise", Frequency::Daily, "2024-03".parse().unwrap())
                .await
                .unwrap();
            app.habits()
                .toggle_habit_completion(habit.id, parse_date("2024-03-02").unwrap())
                .await
                .unwrap();
            app.tasks()
                .create_task("Two Sum", None, parse_date("2024-03-02").unwrap())
                .await
                .unwrap();
            habit.id
        };

        let app = LifeNode::open_with_clock(db_path, clock).unwrap();
        let habit = app.habits().get_habit_by_id(habit_id).await.unwrap().unwrap();
        assert_eq!(habit.streak, 1);
        assert_eq!(habit.last_completed, Some(parse_date("2024-03-02").unwrap()));
        assert_eq!(
            app.tasks()
                .get_tasks_for_month("2024-03".parse().unwrap())
                .await
                .len(),
            1
        );
    }

    #[test]
    fn test_storage_interface() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf())
            .expect("Failed to create storage");

        // One handle serves every storage trait
        let _: &dyn HabitStorage = &storage;
        let _: &dyn TaskStorage = &storage;
        let _: &dyn AlarmStorage = &storage;
        let _: &dyn ChatStorage = &storage;

        let habits = tokio_test::block_on(storage.list_habits());
        assert!(tokio_test::assert_ok!(habits).is_empty());
    }

    #[test]
    fn test_open_fails_for_unreachable_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("missing").join("nested").join("lifenode.db");

        let result = LifeNode::open(db_path);
        assert!(matches!(
            result,
            Err(LifeNodeError::Database(StorageError::Unavailable(_)))
        ));
    }
}

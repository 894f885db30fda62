/// Main entry point for the LifeNode command line tool
///
/// This file sets up logging, parses command line arguments, opens the
/// database and runs one habit or task command against it.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use lifenode::{Clock, Frequency, HabitId, LifeNode, LifeNodeError, Month, TaskId};

/// Get the default database path with robust fallback strategy
fn get_default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    // Try various locations in order of preference
    let potential_paths = [
        dirs::home_dir().map(|p| p.join(".lifenode")),
        dirs::data_dir().map(|p| p.join("lifenode")),
        dirs::config_dir().map(|p| p.join("lifenode")),
        std::env::current_dir().ok().map(|p| p.join(".lifenode")),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if std::fs::create_dir_all(potential_path).is_ok() {
            // Only use the directory if we can actually write to it
            let test_file = potential_path.join(".test_write");
            if std::fs::write(&test_file, "test").is_ok() {
                let _ = std::fs::remove_file(&test_file);
                return Ok(potential_path.join("lifenode.db"));
            }
        }
    }

    let temp_path = std::env::temp_dir().join("lifenode");
    std::fs::create_dir_all(&temp_path)?;

    let db_path = temp_path.join("lifenode.db");
    tracing::warn!("Using temporary directory for database: {}", db_path.display());
    Ok(db_path)
}

/// Command line arguments for LifeNode
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long, env = "LIFENODE_DB", global = true)]
    database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage habits and their completions
    #[command(subcommand)]
    Habit(HabitCommand),

    /// Manage calendar tasks
    #[command(subcommand)]
    Task(TaskCommand),
}

#[derive(Subcommand, Debug)]
enum HabitCommand {
    /// Create a habit
    Add {
        name: String,
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
        /// Creation month (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<Month>,
    },
    /// List habits, optionally only those created in a month
    List {
        #[arg(long)]
        month: Option<Month>,
    },
    /// Toggle a day's completion (defaults to today)
    Toggle {
        id: HabitId,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a habit and all of its completions
    Delete { id: HabitId },
    /// Show every habit's completions for a month
    Month { month: Option<Month> },
    /// Show statistics for one habit
    Stats { id: HabitId },
    /// Recompute every cached streak
    Repair,
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// File a task under a day (defaults to today)
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List a month's tasks
    List { month: Option<Month> },
    /// Mark a task as completed
    Done { id: TaskId },
    /// Delete a task
    Delete { id: TaskId },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), LifeNodeError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_habit(
    app: &LifeNode,
    command: HabitCommand,
    json: bool,
    clock: Clock,
) -> Result<(), LifeNodeError> {
    let habits = app.habits();

    match command {
        HabitCommand::Add {
            name,
            frequency,
            month,
        } => {
            let month = month.unwrap_or_else(|| Month::current(&clock));
            let habit = habits.create_habit(&name, frequency, month).await?;
            if json {
                print_json(&habit)?;
            } else {
                println!("Created habit '{}' ({}, id {})", habit.name, habit.frequency, habit.id);
            }
        }
        HabitCommand::List { month } => {
            let list = match month {
                Some(month) => habits.get_habits_created_in(month).await?,
                None => habits.get_all_habits().await?,
            };
            if json {
                print_json(&list)?;
            } else if list.is_empty() {
                println!("No habits yet");
            } else {
                for habit in &list {
                    println!(
                        "{:>4}  {:<30} {:<8} streak {} {}",
                        habit.id.0,
                        habit.name,
                        habit.frequency.as_str(),
                        habit.streak,
                        habit.frequency.period_label(habit.streak)
                    );
                }
            }
        }
        HabitCommand::Toggle { id, date } => {
            let date = date.unwrap_or_else(|| clock.today());
            let outcome = habits.toggle_habit_completion(id, date).await?;
            if json {
                print_json(&outcome)?;
            } else {
                let state = if outcome.completion.completed { "done" } else { "not done" };
                println!("Habit {} marked {} on {}, streak {}", id, state, date, outcome.streak);
            }
        }
        HabitCommand::Delete { id } => {
            let deleted = habits.delete_habit(id).await;
            if json {
                print_json(&serde_json::json!({ "deleted": deleted }))?;
            } else if deleted {
                println!("Deleted habit {}", id);
            } else {
                println!("Could not delete habit {}", id);
            }
        }
        HabitCommand::Month { month } => {
            let month = month.unwrap_or_else(|| Month::current(&clock));
            let views = habits.get_habits_for_month_with_streaks(month).await?;
            if json {
                print_json(&views)?;
                return Ok(());
            }

            println!("{}", month);
            for view in &views {
                let days: String = month
                    .days()
                    .map(|day| if view.habit.is_completed_on(day) { '#' } else { '.' })
                    .collect();
                let marker = if view.is_active_streak() && view.current_streak > 0 {
                    " *"
                } else {
                    ""
                };
                println!(
                    "{:<20} {} {}/{}{}",
                    view.habit.habit.name, days, view.current_streak, view.longest_streak, marker
                );
            }

            let month_views: Vec<_> = views.into_iter().map(|view| view.habit).collect();
            let summary = app.analytics().month_summary(&month_views, month);
            let perfect_days = summary
                .values()
                .filter(|day| day.total > 0 && day.completed == day.total)
                .count();
            println!("Days with every habit done: {}", perfect_days);
        }
        HabitCommand::Stats { id } => match habits.get_habit_stats(id).await? {
            Some(stats) if json => print_json(&stats)?,
            Some(stats) => {
                println!("Records:         {}", stats.total_days);
                println!("Completed:       {}", stats.completed_days);
                println!("Completion rate: {:.2}%", stats.completion_rate);
                println!("Current streak:  {}", stats.current_streak);
                println!("Longest streak:  {}", stats.longest_streak);
            }
            None => println!("No habit with id {}", id),
        },
        HabitCommand::Repair => {
            let changed = habits.recompute_streaks().await?;
            if json {
                print_json(&serde_json::json!({ "repaired": changed }))?;
            } else {
                println!("Repaired {} streak(s)", changed);
            }
        }
    }

    Ok(())
}

async fn run_task(
    app: &LifeNode,
    command: TaskCommand,
    json: bool,
    clock: Clock,
) -> Result<(), LifeNodeError> {
    let tasks = app.tasks();

    match command {
        TaskCommand::Add {
            title,
            description,
            date,
        } => {
            let day = date.unwrap_or_else(|| clock.today());
            let task = tasks.create_task(&title, description, day).await?;
            if json {
                print_json(&task)?;
            } else {
                println!("Added task '{}' on {} (id {})", task.title, task.created_on, task.id);
            }
        }
        TaskCommand::List { month } => {
            let month = month.unwrap_or_else(|| Month::current(&clock));
            let list = tasks.get_tasks_for_month(month).await;
            if json {
                print_json(&list)?;
            } else {
                for task in &list {
                    let check = if task.completed { "x" } else { " " };
                    println!("[{}] {:>4}  {}  {}", check, task.id.0, task.created_on, task.title);
                }
            }
        }
        TaskCommand::Done { id } => {
            let updated = match tasks.get_task_by_id(id).await? {
                Some(mut task) => {
                    task.completed = true;
                    let day = task.created_on;
                    tasks.update_task(task, day).await
                }
                None => false,
            };
            if json {
                print_json(&serde_json::json!({ "updated": updated }))?;
            } else if updated {
                println!("Completed task {}", id);
            } else {
                println!("Could not update task {}", id);
            }
        }
        TaskCommand::Delete { id } => {
            let deleted = tasks.delete_task(id).await;
            if json {
                print_json(&serde_json::json!({ "deleted": deleted }))?;
            } else if deleted {
                println!("Deleted task {}", id);
            } else {
                println!("Could not delete task {}", id);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("lifenode={}", log_level))
        .with_writer(std::io::stderr) // Keep stdout for command output
        .init();

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => get_default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let clock = Clock::System;
    let app = LifeNode::open_with_clock(db_path, clock)?;

    match args.command {
        Command::Habit(command) => run_habit(&app, command, args.json, clock).await?,
        Command::Task(command) => run_task(&app, command, args.json, clock).await?,
    }

    Ok(())
}

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use daily_word_backend::config::progress_dir;
use daily_word_backend::progress::{
    quiz_score, Achievement, FileProgressStorage, ProgressTracker,
};
use daily_word_backend::services::daily_word::today;

#[derive(Parser)]
#[command(
    name = "daily-word-progress",
    about = "Track streaks, quiz scores and achievements for the daily word",
    version
)]
struct Cli {
    /// Directory holding the progress blob (default: $PROGRESS_DIR or the user data dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Record today's visit and update the streak
    Visit {
        /// Visit date instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Record a finished quiz for a word
    Quiz {
        /// Word identifier
        word_id: String,
        /// Score as a percentage (0-100)
        #[arg(long, conflicts_with_all = ["correct", "total"])]
        score: Option<u32>,
        /// Number of correct answers
        #[arg(long, requires = "total")]
        correct: Option<usize>,
        /// Number of questions
        #[arg(long, requires = "correct")]
        total: Option<usize>,
    },

    /// Override the learned-words counter
    SetTotal {
        count: u32,
    },

    /// Show progress and achievements
    Show,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dir = cli.dir.unwrap_or_else(progress_dir);
    let storage = FileProgressStorage::new(&dir);
    let mut tracker = ProgressTracker::load(storage, today())
        .with_context(|| format!("failed to load progress from {}", dir.display()))?;

    match cli.command {
        Command::Visit { date } => {
            let report = tracker.visit(date.unwrap_or_else(today))?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Plain => {
                    println!("Streak: {} day(s) ({:?})", report.streak, report.outcome);
                    print_unlocked(&report.unlocked);
                }
            }
        }
        Command::Quiz {
            word_id,
            score,
            correct,
            total,
        } => {
            let score = match (score, correct, total) {
                (Some(score), _, _) => score,
                (None, Some(correct), Some(total)) => quiz_score(correct, total),
                _ => bail!("pass either --score or both --correct and --total"),
            };
            let unlocked = tracker.complete_quiz(&word_id, score)?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tracker.progress())?),
                OutputFormat::Plain => {
                    println!(
                        "Recorded {score}% for {word_id}. Average score: {}%",
                        tracker.progress().average_score
                    );
                    print_unlocked(&unlocked);
                }
            }
        }
        Command::SetTotal { count } => {
            let unlocked = tracker.set_total_words(count)?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tracker.progress())?),
                OutputFormat::Plain => {
                    println!("Words learned: {count}");
                    print_unlocked(&unlocked);
                }
            }
        }
        Command::Show => {
            let summary = tracker.progress().summary();
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Plain => {
                    println!("Streak:          {} day(s)", summary.streak);
                    println!("Words learned:   {}", summary.total_words);
                    println!("Average score:   {}%", summary.average_score);
                    println!("Quizzes taken:   {}", summary.quizzes_taken);
                    println!("High scores:     {}", summary.high_scores);
                    println!("Last visit:      {}", summary.last_visit);
                    println!();
                    for status in &summary.achievements {
                        let mark = if status.earned { "x" } else { " " };
                        println!(
                            "[{mark}] {:<15} {:>3}%  {}",
                            status.name, status.progress, status.description
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_unlocked(unlocked: &[Achievement]) {
    for achievement in unlocked {
        println!("Achievement unlocked: {} ({})", achievement.name(), achievement.description());
    }
}

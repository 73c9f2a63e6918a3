//! Solved-exercise log commands.

use clap::Subcommand;
use streakbook_core::categories::{ADDITIONAL_TAGS, DEFAULT_CATEGORY, PRIMARY_CATEGORIES};
use streakbook_core::streak::UnchangedReason;
use streakbook_core::validation::parse_date;
use streakbook_core::{Config, ExerciseForm, ExerciseWithProblem, StreakChange, StreakUpdate};

use super::{page_footer, print_json};
use crate::context::{signed_in, today};

#[derive(Subcommand)]
pub enum ExerciseAction {
    /// Record a solved problem
    Add {
        /// Problem number
        number: i64,
        /// Problem title
        #[arg(long)]
        title: String,
        /// Problem link
        #[arg(long)]
        link: String,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Completion date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
        /// Primary category
        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,
        /// Additional tags, comma separated
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List solved problems, newest first
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one exercise
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an exercise; omitted fields keep their value
    Edit {
        id: i64,
        #[arg(long)]
        number: Option<i64>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        link: Option<String>,
        /// New notes (empty string clears them)
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Replace the tags, comma separated
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    /// Delete an exercise (the streak is left as is)
    Delete { id: i64 },
    /// List the accepted categories and tags
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ExerciseAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ExerciseAction::Categories { json } => print_categories(json),
        other => run_signed_in(other),
    }
}

fn run_signed_in(action: ExerciseAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut tracker = signed_in(&config)?;
    let today = today();

    match action {
        ExerciseAction::Add {
            number,
            title,
            link,
            notes,
            date,
            category,
            tags,
            json,
        } => {
            let form = ExerciseForm {
                leetcode_number: number,
                title,
                link,
                notes,
                date_completed: date.as_deref().map(parse_date).transpose()?.unwrap_or(today),
                primary_category: category,
                additional_tags: tags,
            };
            let added = tracker.add_exercise(&form, today)?;

            if json {
                print_json(&added)?;
            } else {
                println!(
                    "Recorded #{} {} on {} (id {})",
                    added.problem.leetcode_number,
                    added.problem.title,
                    added.exercise.date_completed,
                    added.exercise.id
                );
                match &added.streak {
                    Some(update) => println!("{}", streak_message(update)),
                    None => eprintln!("warning: streak could not be updated"),
                }
            }
        }
        ExerciseAction::List { page, json } => {
            let page = tracker.list_exercises(page)?;
            if json {
                print_json(&page)?;
            } else if page.items.is_empty() {
                println!("No exercises on this page.");
                println!("{}", page_footer(page.page, page.total_pages, page.total_count));
            } else {
                println!(
                    "{:<6} {:<10} {:<7} {:<32} {:<22} TAGS",
                    "ID", "DATE", "NUMBER", "TITLE", "CATEGORY"
                );
                for item in &page.items {
                    println!(
                        "{:<6} {:<10} {:<7} {:<32} {:<22} {}",
                        item.id,
                        item.date_completed,
                        item.leetcode_number,
                        truncate(&item.title, 32),
                        item.primary_category,
                        item.additional_tags.join(", ")
                    );
                }
                println!("{}", page_footer(page.page, page.total_pages, page.total_count));
            }
        }
        ExerciseAction::Show { id, json } => {
            let item = tracker.exercise(id)?;
            if json {
                print_json(&item)?;
            } else {
                print_exercise(&item);
            }
        }
        ExerciseAction::Edit {
            id,
            number,
            title,
            link,
            notes,
            date,
            category,
            tags,
        } => {
            let current = tracker.exercise(id)?;
            let form = ExerciseForm {
                leetcode_number: number.unwrap_or(current.leetcode_number),
                title: title.unwrap_or(current.title),
                link: link.unwrap_or(current.link),
                notes: notes.or(current.notes),
                date_completed: match date {
                    Some(value) => parse_date(&value)?,
                    None => current.date_completed,
                },
                primary_category: category.unwrap_or(current.primary_category),
                additional_tags: tags.unwrap_or(current.additional_tags),
            };
            let updated = tracker.update_exercise(id, &form, today)?;
            println!("Updated exercise {}", updated.id);
        }
        ExerciseAction::Delete { id } => {
            tracker.delete_exercise(id)?;
            println!("Deleted exercise {id}");
        }
        ExerciseAction::Categories { json } => print_categories(json)?,
    }
    Ok(())
}

fn print_categories(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        return print_json(&serde_json::json!({
            "categories": PRIMARY_CATEGORIES,
            "tags": ADDITIONAL_TAGS,
        }));
    }
    println!("Categories:");
    for category in PRIMARY_CATEGORIES {
        println!("  {category}");
    }
    println!("Tags:");
    for tag in ADDITIONAL_TAGS {
        println!("  {tag}");
    }
    Ok(())
}

fn print_exercise(item: &ExerciseWithProblem) {
    println!("#{} {}", item.leetcode_number, item.title);
    println!("  id:        {}", item.id);
    println!("  link:      {}", item.link);
    println!("  completed: {}", item.date_completed);
    println!("  category:  {}", item.primary_category);
    if !item.additional_tags.is_empty() {
        println!("  tags:      {}", item.additional_tags.join(", "));
    }
    if let Some(notes) = &item.notes {
        println!("  notes:     {notes}");
    }
}

pub(crate) fn streak_message(update: &StreakUpdate) -> String {
    let count = update.state.streak_count;
    match update.change {
        StreakChange::Started => format!("Streak started: {count} day"),
        StreakChange::Extended => format!("Streak extended to {count} days"),
        StreakChange::Reset { gap_days } if gap_days < 0 => {
            format!("Backdated entry, streak restarted at {count}")
        }
        StreakChange::Reset { gap_days } => {
            format!("Streak restarted at {count} after a {gap_days}-day gap")
        }
        StreakChange::Unchanged {
            reason: UnchangedReason::RepeatSameDay,
        } => format!("Already counted today, streak stays at {count}"),
        StreakChange::Unchanged { .. } => format!("Streak stays at {count}"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

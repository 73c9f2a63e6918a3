//! Medication study log commands.

use clap::Subcommand;
use streakbook_core::{Config, Medication, MedicationFields};

use super::{page_footer, print_json};
use crate::context::signed_in;

#[derive(Subcommand)]
pub enum MedicationAction {
    /// Add a medication to the log
    Add {
        /// Medication name
        name: String,
        /// Notes about the medication
        #[arg(long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List medications, newest first
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one medication
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a medication; omitted fields keep their value
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// New description (empty string clears it)
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a medication
    Delete { id: i64 },
    /// Pick a random medication to review
    Random {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: MedicationAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut tracker = signed_in(&config)?;

    match action {
        MedicationAction::Add {
            name,
            description,
            json,
        } => {
            let medication = tracker.add_medication(&MedicationFields { name, description })?;
            if json {
                print_json(&medication)?;
            } else {
                println!("Added {} (id {})", medication.name, medication.id);
            }
        }
        MedicationAction::List { page, json } => {
            let page = tracker.list_medications(page)?;
            if json {
                print_json(&page)?;
            } else {
                if page.items.is_empty() {
                    println!("No medications on this page.");
                }
                for medication in &page.items {
                    match &medication.description {
                        Some(description) => {
                            println!("{:<6} {}: {description}", medication.id, medication.name)
                        }
                        None => println!("{:<6} {}", medication.id, medication.name),
                    }
                }
                println!("{}", page_footer(page.page, page.total_pages, page.total_count));
            }
        }
        MedicationAction::Show { id, json } => {
            let medication = tracker.medication(id)?;
            if json {
                print_json(&medication)?;
            } else {
                print_medication(&medication);
            }
        }
        MedicationAction::Edit {
            id,
            name,
            description,
        } => {
            let current = tracker.medication(id)?;
            let fields = MedicationFields {
                name: name.unwrap_or(current.name),
                description: description.or(current.description),
            };
            let updated = tracker.update_medication(id, &fields)?;
            println!("Updated {} (id {})", updated.name, updated.id);
        }
        MedicationAction::Delete { id } => {
            tracker.delete_medication(id)?;
            println!("Deleted medication {id}");
        }
        MedicationAction::Random { json } => match tracker.random_medication()? {
            Some(medication) if json => print_json(&medication)?,
            Some(medication) => print_medication(&medication),
            None if json => println!("null"),
            None => println!("Your medication log is empty."),
        },
    }
    Ok(())
}

fn print_medication(medication: &Medication) {
    println!("{}", medication.name);
    println!("  id:      {}", medication.id);
    if let Some(description) = &medication.description {
        println!("  notes:   {description}");
    }
    println!("  added:   {}", medication.created_at.format("%Y-%m-%d %H:%M"));
}

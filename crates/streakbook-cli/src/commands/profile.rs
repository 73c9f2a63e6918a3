use clap::Subcommand;
use streakbook_core::Config;

use super::print_json;
use crate::context::{signed_in, today};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the profile and current streak
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the display name
    Rename { name: String },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut tracker = signed_in(&config)?;

    match action {
        ProfileAction::Show { json } => {
            let profile = tracker.profile(today())?;
            if json {
                print_json(&profile)?;
            } else {
                println!("Name:   {}", profile.name.as_deref().unwrap_or("(not set)"));
                println!("Streak: {} day(s)", profile.streak_count);
                match profile.last_completed_date {
                    Some(date) => println!("Last:   {date}"),
                    None => println!("Last:   never"),
                }
            }
        }
        ProfileAction::Rename { name } => {
            let profile = tracker.rename(&name)?;
            println!("Name set to {}", profile.name.as_deref().unwrap_or_default());
        }
    }
    Ok(())
}

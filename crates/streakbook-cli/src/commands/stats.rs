use streakbook_core::Config;

use super::print_json;
use crate::context::{signed_in, today};

/// Dashboard numbers: exercises solved, current streak, medications logged.
pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut tracker = signed_in(&config)?;
    let stats = tracker.stats(today())?;

    if json {
        print_json(&stats)?;
    } else {
        println!("Problems solved:  {}", stats.total_exercises);
        println!("Current streak:   {} day(s)", stats.current_streak);
        println!("Medications:      {}", stats.total_medications);
    }
    Ok(())
}

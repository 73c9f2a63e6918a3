pub mod auth;
pub mod config;
pub mod exercise;
pub mod medication;
pub mod profile;
pub mod stats;

/// Pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Footer shown under paginated listings.
pub(crate) fn page_footer(page: u32, total_pages: u32, total_count: u64) -> String {
    format!("page {page}/{total_pages} ({total_count} total)")
}

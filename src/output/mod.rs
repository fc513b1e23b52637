/// Connection-URL derivation and `.env` file updates.
pub mod env_file;
/// Output-directory writing for run artifacts.
pub mod formatter;
/// Markdown split report generation.
pub mod report;

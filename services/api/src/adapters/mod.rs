pub mod completions;
pub mod db;

pub use completions::OpenAiCompletions;
pub use db::PgStore;

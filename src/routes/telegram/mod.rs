mod handler;

pub use handler::{notify_ceos, telegram_stats};

mod handler;
mod model;

pub use handler::{get_me, logout, telegram_auth};

mod handler;
mod model;

pub use handler::{add_favorite, get_profile, remove_favorite, update_profile};

mod handler;
mod model;

pub use handler::{create_content, delete_content, list_content, update_content};

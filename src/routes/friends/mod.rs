mod handler;
mod model;

pub use handler::{delete_friendship, list_friends, respond_to_request, send_request};

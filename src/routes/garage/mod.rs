mod handler;
mod model;

pub use handler::{create_vehicle, delete_vehicle, list_vehicles, update_vehicle};

mod handler;

pub use handler::upload_media;

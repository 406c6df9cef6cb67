pub mod admin;
pub mod auth;
pub mod content;
pub mod friends;
pub mod garage;
pub mod media;
pub mod orgs;
pub mod profile;
pub mod sellers;
pub mod telegram;
pub mod weather;

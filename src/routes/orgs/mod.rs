mod handler;
mod model;

pub use handler::{
    approve_request, list_organizations, list_requests, reject_request, submit_request,
};

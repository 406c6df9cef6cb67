mod handler;
mod model;

pub use handler::{
    admin_password_status, change_admin_password, delete_user, get_stats, legacy_stats,
    list_users, log_activity, set_user_status, setup_or_verify_admin_password, update_role,
    user_activity,
};

mod handler;
mod model;

pub use handler::{
    assign_seller, create_product, delete_product, list_sellers, revoke_seller, seller_info,
    update_product,
};

// HTTP handlers for the catalog service
pub mod health;
pub mod images;

pub use health::health_check;
pub use images::{add_image, list_images, remove_image, update_isoutstock};

pub mod config;
pub mod follow;
pub mod places;
pub mod posts;

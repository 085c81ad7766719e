pub mod feed;
pub mod setting;
pub mod story;
pub mod user;

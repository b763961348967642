pub mod health;
pub mod picture;
pub mod upload;

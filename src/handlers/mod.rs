pub mod admin;
pub mod owner;
pub mod public;

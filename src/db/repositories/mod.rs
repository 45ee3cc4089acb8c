pub mod encaste;
pub mod gallo;
pub mod profile;
pub mod user;

pub mod health;
pub mod resource;
pub mod resource_public;

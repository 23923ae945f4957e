//! Application services layer.

pub mod catalog;
pub mod error;
pub mod favorites;
pub mod listings;
pub mod materials;
pub mod messages;
pub mod pagination;
pub mod repos;

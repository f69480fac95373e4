//! 领域层

pub mod repositories;
pub mod services;
pub mod user;
pub mod value_objects;

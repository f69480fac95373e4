//! 应用层 DTO

pub mod auth;

pub use auth::*;

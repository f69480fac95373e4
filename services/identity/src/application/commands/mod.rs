//! 命令

pub mod auth;

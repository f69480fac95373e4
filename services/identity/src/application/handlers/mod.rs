//! 命令处理器

pub mod auth;

//! 领域服务

mod password_service;
mod username_allocator;

pub use password_service::*;
pub use username_allocator::*;

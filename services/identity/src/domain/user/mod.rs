//! 用户聚合

mod user;

pub use user::*;

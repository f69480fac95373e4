//! 值对象

mod email;
mod password;
mod username;

pub use email::*;
pub use password::*;
pub use username::*;

//! 认证处理器

pub mod change_password_handler;
pub mod close_account_handler;
pub mod login_handler;
pub mod logout_handler;
pub mod refresh_token_handler;
pub mod register_handler;
pub mod request_password_reset_handler;
pub mod reset_password_handler;

pub use change_password_handler::*;
pub use close_account_handler::*;
pub use login_handler::*;
pub use logout_handler::*;
pub use refresh_token_handler::*;
pub use register_handler::*;
pub use request_password_reset_handler::*;
pub use reset_password_handler::*;

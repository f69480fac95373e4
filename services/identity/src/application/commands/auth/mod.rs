//! 认证命令

pub mod change_password_command;
pub mod close_account_command;
pub mod login_command;
pub mod logout_command;
pub mod refresh_token_command;
pub mod register_command;
pub mod request_password_reset_command;
pub mod reset_password_command;

pub use change_password_command::*;
pub use close_account_command::*;
pub use login_command::*;
pub use logout_command::*;
pub use refresh_token_command::*;
pub use register_command::*;
pub use request_password_reset_command::*;
pub use reset_password_command::*;

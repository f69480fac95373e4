//! Identity Service Library
//!
//! 名片平台的身份核心：
//! - `domain`: User 聚合、值对象、领域服务、仓储接口
//! - `application`: 命令与处理器（注册、登录、刷新、密码重置）
//! - `infrastructure`: Postgres/内存仓储、过期凭据清理

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

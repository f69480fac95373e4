//! PostgreSQL 用户 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kard_common::{AuditInfo, UserId};
use kard_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::repositories::UserRepository;
use crate::domain::user::{User, UserRole};
use crate::domain::value_objects::{Email, HashedPassword, Username};

const USER_COLUMNS: &str = r#"
    id, email, username, password_hash, first_name, last_name, company, position,
    phone, role, is_active, email_verified, email_verification_token,
    password_reset_token, password_reset_expires, last_login_at,
    created_at, updated_at
"#;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 数据库行
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    username: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    company: Option<String>,
    position: Option<String>,
    phone: Option<String>,
    role: String,
    is_active: bool,
    email_verified: bool,
    email_verification_token: Option<String>,
    password_reset_token: Option<String>,
    password_reset_expires: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, String> {
        let role = UserRole::from_str(&self.role)
            .ok_or_else(|| format!("Unknown role in users row: {}", self.role))?;

        Ok(User {
            id: UserId(self.id),
            email: Email(self.email),
            username: Username(self.username),
            password_hash: HashedPassword::from_hash(self.password_hash),
            first_name: self.first_name,
            last_name: self.last_name,
            company: self.company,
            position: self.position,
            phone: self.phone,
            role,
            is_active: self.is_active,
            email_verified: self.email_verified,
            email_verification_token: self.email_verification_token,
            password_reset_token: self.password_reset_token,
            password_reset_expires: self.password_reset_expires,
            last_login_at: self.last_login_at,
            audit_info: AuditInfo {
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        })
    }
}

fn map_unique_violation(e: sqlx::Error, context: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(
            "An account with this email or username already exists",
        ),
        _ => AppError::database(format!("{}: {}", context, e)),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.into_user().map_err(AppError::database)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.into_user().map_err(AppError::database)?)),
            None => Ok(None),
        }
    }

    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1 OR username = $1",
            USER_COLUMNS
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.into_user().map_err(AppError::database)?)),
            None => Ok(None),
        }
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to check username: {}", e)))?;

        Ok(exists.0)
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, username, password_hash, first_name, last_name,
                               company, position, phone, role, is_active, email_verified,
                               email_verification_token, password_reset_token,
                               password_reset_expires, last_login_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.email.as_str())
        .bind(user.username.as_str())
        .bind(user.password_hash.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.company)
        .bind(&user.position)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.email_verified)
        .bind(&user.email_verification_token)
        .bind(&user.password_reset_token)
        .bind(user.password_reset_expires)
        .bind(user.last_login_at)
        .bind(user.audit_info.created_at)
        .bind(user.audit_info.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Failed to insert user"))?;

        row.into_user().map_err(AppError::database)
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = $2, username = $3, password_hash = $4, first_name = $5,
                last_name = $6, company = $7, position = $8, phone = $9, role = $10,
                is_active = $11, email_verified = $12, email_verification_token = $13,
                password_reset_token = $14, password_reset_expires = $15,
                last_login_at = $16, updated_at = $17
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(user.username.as_str())
        .bind(user.password_hash.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.company)
        .bind(&user.position)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.email_verified)
        .bind(&user.email_verification_token)
        .bind(&user.password_reset_token)
        .bind(user.password_reset_expires)
        .bind(user.last_login_at)
        .bind(user.audit_info.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }

        Ok(())
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE id = $1")
                .bind(id.0)
                .bind(at)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to record login: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }

        Ok(())
    }

    async fn update_password(&self, id: &UserId, hash: &HashedPassword) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id.0)
            .bind(hash.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update password: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }

        Ok(())
    }

    async fn store_reset_ticket(
        &self,
        id: &UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2, password_reset_expires = $3
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store reset ticket: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }

        Ok(())
    }

    async fn consume_reset_ticket(
        &self,
        token: &str,
        new_hash: &HashedPassword,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        // 单条原子更新：并发消费同一凭据时只有一个提交能匹配到行
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, password_reset_token = NULL,
                password_reset_expires = NULL, updated_at = $3
            WHERE password_reset_token = $2
              AND password_reset_expires IS NOT NULL
              AND password_reset_expires >= $3
            "#,
        )
        .bind(new_hash.as_str())
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to consume reset ticket: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_expired_reset_tickets(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = NULL, password_reset_expires = NULL
            WHERE password_reset_expires IS NOT NULL AND password_reset_expires < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to clear expired tickets: {}", e)))?;

        Ok(result.rows_affected())
    }
}

//! 内存用户仓储
//!
//! 测试与本地开发用。唯一性检查和重置凭据消费与 Postgres 实现保持同一
//! 语义：单锁下的 check-and-insert 等价于存储层唯一约束，消费是单一
//! 原子变更。

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kard_common::UserId;
use kard_errors::{AppError, AppResult};

use crate::domain::repositories::UserRepository;
use crate::domain::user::User;
use crate::domain::value_objects::HashedPassword;

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: HashMap<i64, User>,
}

/// 内存用户仓储
#[derive(Default)]
pub struct InMemoryUserRepository {
    inner: Mutex<Inner>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn seed_username(&self, username: &str) {
        use crate::domain::value_objects::{Email, Username};

        let now = Utc::now();
        let user = User::new(
            Email(format!("{}@seed.local", username)),
            Username(username.to_string()),
            HashedPassword::from_hash("$argon2id$seed".to_string()),
            now,
        );
        self.insert(&user).await.unwrap();
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id.0).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.email.as_str() == identifier || u.username.as_str() == identifier)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().any(|u| u.username.as_str() == username))
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        let mut inner = self.inner.lock().unwrap();

        // 同一把锁下检查加插入，对应存储层唯一约束
        let taken = inner.users.values().any(|u| {
            u.email.as_str() == user.email.as_str()
                || u.username.as_str() == user.username.as_str()
        });
        if taken {
            return Err(AppError::conflict(
                "An account with this email or username already exists",
            ));
        }

        inner.next_id += 1;
        let mut persisted = user.clone();
        persisted.id = UserId(inner.next_id);
        inner.users.insert(persisted.id.0, persisted.clone());

        Ok(persisted)
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.users.contains_key(&user.id.0) {
            return Err(AppError::not_found("User not found"));
        }

        let taken = inner.users.values().any(|u| {
            u.id != user.id
                && (u.email.as_str() == user.email.as_str()
                    || u.username.as_str() == user.username.as_str())
        });
        if taken {
            return Err(AppError::conflict(
                "An account with this email or username already exists",
            ));
        }

        inner.users.insert(user.id.0, user.clone());
        Ok(())
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();

        let user = inner
            .users
            .get_mut(&id.0)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.last_login_at = Some(at);
        user.audit_info.touch(at);
        Ok(())
    }

    async fn update_password(&self, id: &UserId, hash: &HashedPassword) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();

        let user = inner
            .users
            .get_mut(&id.0)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.password_hash = hash.clone();
        Ok(())
    }

    async fn store_reset_ticket(
        &self,
        id: &UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();

        let user = inner
            .users
            .get_mut(&id.0)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.password_reset_token = Some(token.to_string());
        user.password_reset_expires = Some(expires_at);
        Ok(())
    }

    async fn consume_reset_ticket(
        &self,
        token: &str,
        new_hash: &HashedPassword,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut inner = self.inner.lock().unwrap();

        let holder = inner
            .users
            .values_mut()
            .find(|u| u.reset_ticket_matches(token, now));

        match holder {
            Some(user) => {
                user.password_hash = new_hash.clone();
                user.clear_reset_ticket(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_expired_reset_tickets(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut inner = self.inner.lock().unwrap();

        let mut cleared = 0;
        for user in inner.users.values_mut() {
            if let Some(expires_at) = user.password_reset_expires {
                if expires_at < now {
                    user.clear_reset_ticket(now);
                    cleared += 1;
                }
            }
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Email, Username};
    use chrono::Duration;

    fn user(email: &str, username: &str) -> User {
        User::new(
            Email::new(email).unwrap(),
            Username::new(username).unwrap(),
            HashedPassword::from_hash("$argon2id$hash".to_string()),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.insert(&user("a@example.com", "a")).await.unwrap();
        let second = repo.insert(&user("b@example.com", "b")).await.unwrap();

        assert!(first.id.is_assigned());
        assert!(second.id.is_assigned());
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user("a@example.com", "a")).await.unwrap();

        let err = repo.insert(&user("a@example.com", "other")).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_username() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user("a@example.com", "a")).await.unwrap();

        let err = repo.insert(&user("b@example.com", "a")).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user("Jean@Example.com", "jean")).await.unwrap();

        assert!(repo.find_by_email("Jean@Example.com").await.unwrap().is_some());
        assert!(repo.find_by_email("jean@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_identifier_matches_email_or_username() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user("jean@example.com", "jean")).await.unwrap();

        assert!(repo.find_by_identifier("jean@example.com").await.unwrap().is_some());
        assert!(repo.find_by_identifier("jean").await.unwrap().is_some());
        assert!(repo.find_by_identifier("paul").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_consume_reset_ticket_is_single_use() {
        let repo = InMemoryUserRepository::new();
        let now = Utc::now();
        let saved = repo.insert(&user("jean@example.com", "jean")).await.unwrap();
        repo.store_reset_ticket(&saved.id, "token", now + Duration::hours(1))
            .await
            .unwrap();

        let new_hash = HashedPassword::from_hash("$argon2id$new".to_string());

        assert!(repo.consume_reset_ticket("token", &new_hash, now).await.unwrap());
        // 第二次消费同一凭据失败
        assert!(!repo.consume_reset_ticket("token", &new_hash, now).await.unwrap());

        let reloaded = repo.find_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, new_hash);
        assert!(reloaded.password_reset_token.is_none());
        assert!(reloaded.password_reset_expires.is_none());
    }

    #[tokio::test]
    async fn test_consume_expired_ticket_leaves_ticket_in_place() {
        let repo = InMemoryUserRepository::new();
        let now = Utc::now();
        let saved = repo.insert(&user("jean@example.com", "jean")).await.unwrap();
        repo.store_reset_ticket(&saved.id, "token", now - Duration::minutes(1))
            .await
            .unwrap();

        let new_hash = HashedPassword::from_hash("$argon2id$new".to_string());

        assert!(!repo.consume_reset_ticket("token", &new_hash, now).await.unwrap());

        // 失败的尝试不清除凭据
        let reloaded = repo.find_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_reset_token.as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn test_clear_expired_reset_tickets() {
        let repo = InMemoryUserRepository::new();
        let now = Utc::now();
        let expired = repo.insert(&user("a@example.com", "a")).await.unwrap();
        let pending = repo.insert(&user("b@example.com", "b")).await.unwrap();
        repo.store_reset_ticket(&expired.id, "old", now - Duration::minutes(5))
            .await
            .unwrap();
        repo.store_reset_ticket(&pending.id, "fresh", now + Duration::hours(1))
            .await
            .unwrap();

        let cleared = repo.clear_expired_reset_tickets(now).await.unwrap();

        assert_eq!(cleared, 1);
        let pending = repo.find_by_id(&pending.id).await.unwrap().unwrap();
        assert_eq!(pending.password_reset_token.as_deref(), Some("fresh"));
    }
}

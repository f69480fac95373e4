//! kard-auth-core - 认证核心库
//!
//! JWT Claims 与双密钥令牌签发

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kard_common::{Clock, UserId};
use kard_errors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 默认 access token TTL
pub const DEFAULT_ACCESS_TTL: &str = "15m";
/// 默认 refresh token TTL
pub const DEFAULT_REFRESH_TTL: &str = "7d";

/// 令牌错误
///
/// Expired 与 Invalid 仅在内部区分，对调用方统一映射为 Unauthorized。
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::unauthorized("Token expired"),
            TokenError::Invalid(_) => AppError::unauthorized("Invalid token"),
            TokenError::Signing(msg) => AppError::internal(msg),
        }
    }
}

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// 邮箱
    pub email: String,
    /// 用户名
    pub username: String,
    /// 角色
    pub role: String,
    /// Token type (access or refresh)
    #[serde(default)]
    pub token_type: String,
    /// JWT ID
    pub jti: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

impl Claims {
    pub fn new(
        user_id: &UserId,
        email: &str,
        username: &str,
        role: &str,
        token_type: &str,
        now: DateTime<Utc>,
        expires_in: Duration,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            token_type: token_type.to_string(),
            jti: Uuid::now_v7().to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    pub fn user_id(&self) -> Result<UserId, TokenError> {
        UserId::from_string(&self.sub)
            .map_err(|_| TokenError::Invalid("Invalid user ID in token".to_string()))
    }

    pub fn is_access_token(&self) -> bool {
        self.token_type == "access"
    }

    pub fn is_refresh_token(&self) -> bool {
        self.token_type == "refresh"
    }
}

/// 令牌对
///
/// 不落库：有效性完全由签名和 exp 决定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// access token 的绝对过期时间；TTL 字符串不可解析时缺省
    pub expires_at: Option<DateTime<Utc>>,
}

/// 解析 `<integer><unit>` 形式的 TTL 字符串（unit ∈ s/m/h/d）
pub fn parse_ttl(ttl: &str) -> Option<Duration> {
    let unit = ttl.chars().last()?;
    let value = &ttl[..ttl.len() - unit.len_utf8()];

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let n: i64 = value.parse().ok()?;
    let seconds = match unit {
        's' => n,
        'm' => n.checked_mul(60)?,
        'h' => n.checked_mul(3600)?,
        'd' => n.checked_mul(86400)?,
        _ => return None,
    };

    Some(Duration::seconds(seconds))
}

/// Token 服务
///
/// access 与 refresh 各用独立密钥签名，泄露其中一个不能伪造另一类令牌。
pub struct TokenService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    access_ttl: String,
    refresh_ttl: String,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: impl Into<String>,
        refresh_ttl: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            access_encoding_key: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl: access_ttl.into(),
            refresh_ttl: refresh_ttl.into(),
            clock,
        }
    }

    /// 签发一对令牌
    pub fn issue_pair(
        &self,
        user_id: &UserId,
        email: &str,
        username: &str,
        role: &str,
    ) -> Result<TokenPair, TokenError> {
        let now = self.clock.now();

        // TTL 不可解析时仅丢失 expires_at 元数据，claims 回退到默认 TTL，
        // 令牌本身仍然可用
        let access_ttl = parse_ttl(&self.access_ttl);
        let access_expires_in =
            access_ttl.unwrap_or_else(|| parse_ttl(DEFAULT_ACCESS_TTL).unwrap());
        let refresh_expires_in =
            parse_ttl(&self.refresh_ttl).unwrap_or_else(|| parse_ttl(DEFAULT_REFRESH_TTL).unwrap());

        let access_claims = Claims::new(
            user_id,
            email,
            username,
            role,
            "access",
            now,
            access_expires_in,
        );
        let refresh_claims = Claims::new(
            user_id,
            email,
            username,
            role,
            "refresh",
            now,
            refresh_expires_in,
        );

        let access_token = encode(&Header::default(), &access_claims, &self.access_encoding_key)
            .map_err(|e| TokenError::Signing(format!("Failed to sign access token: {}", e)))?;
        let refresh_token = encode(
            &Header::default(),
            &refresh_claims,
            &self.refresh_encoding_key,
        )
        .map_err(|e| TokenError::Signing(format!("Failed to sign refresh token: {}", e)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_at: access_ttl.map(|ttl| now + ttl),
        })
    }

    fn validate(&self, token: &str, decoding_key: &DecodingKey) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// 验证访问令牌（确保是 access token）
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.validate(token, &self.access_decoding_key)?;

        if !claims.is_access_token() {
            return Err(TokenError::Invalid("Not an access token".to_string()));
        }

        Ok(claims)
    }

    /// 验证刷新令牌（确保是 refresh token）
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.validate(token, &self.refresh_decoding_key)?;

        if !claims.is_refresh_token() {
            return Err(TokenError::Invalid("Not a refresh token".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kard_common::FixedClock;

    fn service_with_clock(clock: Arc<dyn Clock>) -> TokenService {
        TokenService::new("access-secret", "refresh-secret", "15m", "7d", clock)
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("90s"), Some(Duration::seconds(90)));
        assert_eq!(parse_ttl("15m"), Some(Duration::minutes(15)));
        assert_eq!(parse_ttl("2h"), Some(Duration::hours(2)));
        assert_eq!(parse_ttl("7d"), Some(Duration::days(7)));
    }

    #[test]
    fn test_parse_ttl_rejects_malformed() {
        assert_eq!(parse_ttl(""), None);
        assert_eq!(parse_ttl("15"), None);
        assert_eq!(parse_ttl("m"), None);
        assert_eq!(parse_ttl("15x"), None);
        assert_eq!(parse_ttl("m15"), None);
        assert_eq!(parse_ttl("1.5h"), None);
        assert_eq!(parse_ttl("15M"), None);
        assert_eq!(parse_ttl("-5m"), None);
    }

    #[test]
    fn test_issue_pair_expires_at_matches_ttl() {
        let now = Utc::now();
        let clock = Arc::new(FixedClock::new(now));
        let service = service_with_clock(clock);

        let pair = service
            .issue_pair(&UserId(7), "jean@example.com", "jean", "user")
            .unwrap();

        assert_eq!(pair.expires_at, Some(now + Duration::minutes(15)));
    }

    #[test]
    fn test_issue_pair_with_day_ttl() {
        let now = Utc::now();
        let clock = Arc::new(FixedClock::new(now));
        let service = TokenService::new("a", "r", "7d", "7d", clock);

        let pair = service
            .issue_pair(&UserId(7), "jean@example.com", "jean", "user")
            .unwrap();

        assert_eq!(pair.expires_at, Some(now + Duration::days(7)));
    }

    #[test]
    fn test_unparsable_ttl_degrades_gracefully() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = TokenService::new("a", "r", "soon", "7d", clock);

        let pair = service
            .issue_pair(&UserId(7), "jean@example.com", "jean", "user")
            .unwrap();

        // 元数据缺省，但令牌仍然可验证
        assert_eq!(pair.expires_at, None);
        assert!(service.validate_access_token(&pair.access_token).is_ok());
    }

    #[test]
    fn test_round_trip_claims() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = service_with_clock(clock);

        let pair = service
            .issue_pair(&UserId(42), "jean@example.com", "jean", "admin")
            .unwrap();

        let claims = service.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId(42));
        assert_eq!(claims.email, "jean@example.com");
        assert_eq!(claims.username, "jean");
        assert_eq!(claims.role, "admin");
        assert!(claims.is_access_token());

        let claims = service.validate_refresh_token(&pair.refresh_token).unwrap();
        assert!(claims.is_refresh_token());
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = service_with_clock(clock);

        let pair = service
            .issue_pair(&UserId(42), "jean@example.com", "jean", "user")
            .unwrap();

        // access token 用 refresh 密钥验证失败，反之亦然
        assert!(matches!(
            service.validate_refresh_token(&pair.access_token),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            service.validate_access_token(&pair.refresh_token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Utc::now()));
        let service = service_with_clock(clock.clone());
        let other = TokenService::new("access-secret", "other-secret", "15m", "7d", clock);

        let pair = service
            .issue_pair(&UserId(42), "jean@example.com", "jean", "user")
            .unwrap();

        assert!(matches!(
            other.validate_refresh_token(&pair.refresh_token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token_is_distinguished_internally() {
        let clock = Arc::new(FixedClock::new(Utc::now() - Duration::hours(2)));
        let service = service_with_clock(clock);

        let pair = service
            .issue_pair(&UserId(42), "jean@example.com", "jean", "user")
            .unwrap();

        assert!(matches!(
            service.validate_access_token(&pair.access_token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_token_error_maps_to_unauthorized() {
        let expired: AppError = TokenError::Expired.into();
        let invalid: AppError = TokenError::Invalid("bad".to_string()).into();

        assert_eq!(expired.status_code(), 401);
        assert_eq!(invalid.status_code(), 401);
    }
}

//! Email/password accounts, signed session tokens, and the request
//! extractor that resolves a bearer token to a household member.

use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{AuthResponse, LoginRequest, RegisterRequest};

use crate::config::AuthConfig;
use crate::db::DbConnection;
use crate::domain::MemberService;
use crate::error::{AppError, AppResult};
use crate::storage::{User, UserRepository};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    members: MemberService,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DbConnection, members: MemberService, config: AuthConfig) -> Self {
        Self {
            users: UserRepository::new(db),
            members,
            config,
        }
    }

    /// Create an account and its member profile. Passing a household id
    /// joins that household; otherwise a new one is created.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        if !request.email.contains('@') {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let household_id = match request.household_id {
            Some(id) => {
                if !self.members.household_exists(&id).await? {
                    return Err(AppError::NotFound(format!("Household not found: {}", id)));
                }
                id
            }
            None => format!("household-{}", Uuid::new_v4()),
        };

        let user = User {
            id: format!("user-{}", Uuid::new_v4()),
            email: request.email,
            password_hash: bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)?,
            created_at: Utc::now().to_rfc3339(),
        };
        self.users.store(&user).await?;

        let member = self
            .members
            .create_profile(&user.id, &household_id, &request.display_name)
            .await?;

        let token = self.create_jwt(&user.id)?;
        tracing::info!("Registered user {} in household {}", user.id, household_id);

        Ok(AuthResponse { token, member })
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !bcrypt::verify(&request.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let member = self
            .members
            .profile_for_user(&user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let token = self.create_jwt(&user.id)?;
        Ok(AuthResponse { token, member })
    }

    /// Create a signed JWT for a user id
    pub fn create_jwt(&self, user_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.config.token_expiry_hours);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Decode and validate a JWT, returning the claims
    pub fn decode_jwt(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// The authenticated member resolved from the request's bearer token.
/// Every data route pulls its household scope from here.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub member_id: String,
    pub household_id: String,
    pub display_name: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let claims = state.auth.decode_jwt(bearer.token())?;
        let member = state
            .members
            .profile_for_user(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthSession {
            user_id: member.user_id,
            member_id: member.id,
            household_id: member.household_id,
            display_name: member.display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_expiry_hours: 24,
        }
    }

    async fn create_test_service() -> AuthService {
        let db = DbConnection::init_test().await.expect("Failed to init test DB");
        let members = MemberService::new(db.clone());
        AuthService::new(db, members, test_config())
    }

    fn register_request(email: &str, household_id: Option<String>) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "correct horse".to_string(),
            display_name: "Alice".to_string(),
            household_id,
        }
    }

    #[tokio::test]
    async fn test_register_creates_household_and_token() {
        let service = create_test_service().await;

        let response = service
            .register(register_request("alice@example.com", None))
            .await
            .unwrap();

        assert!(response.member.household_id.starts_with("household-"));
        assert_eq!(response.member.display_name, "Alice");

        let claims = service.decode_jwt(&response.token).unwrap();
        assert_eq!(claims.sub, response.member.user_id);
    }

    #[tokio::test]
    async fn test_register_joins_existing_household() {
        let service = create_test_service().await;

        let first = service
            .register(register_request("alice@example.com", None))
            .await
            .unwrap();

        let mut second_request = register_request("bob@example.com", Some(first.member.household_id.clone()));
        second_request.display_name = "Bob".to_string();
        let second = service.register(second_request).await.unwrap();

        assert_eq!(second.member.household_id, first.member.household_id);
    }

    #[tokio::test]
    async fn test_register_validation_and_conflicts() {
        let service = create_test_service().await;

        let bad_email = service.register(register_request("not-an-email", None)).await;
        assert!(matches!(bad_email, Err(AppError::Validation(_))));

        let mut short_password = register_request("alice@example.com", None);
        short_password.password = "short".to_string();
        assert!(matches!(
            service.register(short_password).await,
            Err(AppError::Validation(_))
        ));

        service
            .register(register_request("alice@example.com", None))
            .await
            .unwrap();
        let duplicate = service.register(register_request("alice@example.com", None)).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let missing_household =
            service.register(register_request("bob@example.com", Some("household-nope".to_string())));
        assert!(matches!(missing_household.await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let service = create_test_service().await;
        service
            .register(register_request("alice@example.com", None))
            .await
            .unwrap();

        let response = service
            .login(LoginRequest {
                email: "alice@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.member.display_name, "Alice");

        let wrong_password = service
            .login(LoginRequest {
                email: "alice@example.com".to_string(),
                password: "wrong password".to_string(),
            })
            .await;
        assert!(matches!(wrong_password, Err(AppError::Unauthorized)));

        let unknown_user = service
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await;
        assert!(matches!(unknown_user, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_decode_rejects_tampered_token() {
        let service = create_test_service().await;
        let response = service
            .register(register_request("alice@example.com", None))
            .await
            .unwrap();

        let mut tampered = response.token.clone();
        tampered.push('x');
        assert!(service.decode_jwt(&tampered).is_err());
    }
}

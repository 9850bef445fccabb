use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use linewatch_db::Database;
use linewatch_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserInfoResponse,
};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if !req.email.contains('@') {
        return Err(ApiError::Invalid("email must contain '@'"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Invalid("password must be at least 8 characters"));
    }

    let user_id = Uuid::new_v4();

    // Argon2id is deliberately slow; keep the whole check-hash-insert off
    // the async runtime
    let st = state.clone();
    let email = req.email.clone();
    let password = req.password;
    tokio::task::spawn_blocking(move || {
        if st.db.get_user_by_email(&email)?.is_some() {
            return Err(ApiError::Conflict("email already registered"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
            .to_string();

        st.db.create_user(&user_id.to_string(), &email, &password_hash)?;
        Ok::<_, ApiError>(())
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    let token = issue_token(&state.jwt_secret, user_id, &req.email)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let email = req.email;
    let password = req.password;

    // Unknown email and wrong password take the same rejection path, so
    // the response never reveals which check failed
    let user = tokio::task::spawn_blocking(move || {
        let user = st
            .db
            .get_user_by_email(&email)?
            .ok_or(ApiError::Unauthorized)?;

        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Stored hash unreadable: {}", e)))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized)?;

        Ok::<_, ApiError>(user)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Corrupt user id '{}': {}", user.id, e)))?;

    let token = issue_token(&state.jwt_secret, user_id, &user.email)?;

    Ok(Json(LoginResponse {
        user_id,
        email: user.email,
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let user_id = claims.sub.to_string();

    let (user, reputation) = tokio::task::spawn_blocking(move || {
        // A valid token over a missing row means the database was reset;
        // treat the credential as stale
        let user = st.db.get_user_by_id(&user_id)?.ok_or(ApiError::Unauthorized)?;
        let reputation = st.db.user_reputation(&user_id)?;
        Ok::<_, ApiError>((user, reputation))
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(UserInfoResponse {
        user_id: claims.sub,
        email: user.email,
        reputation,
    }))
}

/// Mints a signed bearer token. Expiry is 30 days; there is no refresh
/// flow, clients sign in again.
pub fn issue_token(secret: &str, user_id: Uuid, email: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Token encoding failed: {}", e)))?;

    Ok(token)
}

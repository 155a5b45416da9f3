//! Driver authentication.
//!
//! Drivers sign in with email and password and receive a short-lived JWT. Password hashes are
//! argon2; the hash is produced here and stored opaquely by the engine. Handlers that require a
//! signed-in driver take a [`JwtClaims`] argument, which extracts and validates the bearer token.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2,
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
};
use chrono::{Duration, Utc};
use icebox_engine::db_types::Driver;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The driver's database id.
    pub sub: i64,
    pub email: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry: config.token_expiry,
        }
    }

    pub fn issue_token(&self, driver: &Driver) -> Result<String, ServerError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: driver.id,
            email: driver.email.clone(),
            name: driver.full_name(),
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Unspecified(format!("Could not sign access token. {e}")))
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        Ok(data.claims)
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::InitializeError("TokenIssuer is not configured".into()))?;
    let header = req.headers().get("Authorization").ok_or(AuthError::MissingToken)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;
    let claims = issuer.validate(token.trim())?;
    trace!("💻️ Access token validated for driver #{}", claims.sub);
    Ok(claims)
}

pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServerError::Unspecified(format!("Could not hash password. {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

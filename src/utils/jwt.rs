// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_FACULTY: &str = "faculty";

/// JWT Claims structure. Issued by the authentication service.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the student id or faculty id (as string).
    pub sub: String,
    /// 'student' or 'faculty'.
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Authenticated requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Student(i64),
    Faculty(i64),
}

impl Claims {
    pub fn principal(&self) -> Result<Principal, AppError> {
        let id = self
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid subject".to_string()))?;

        match self.role.as_str() {
            ROLE_STUDENT => Ok(Principal::Student(id)),
            ROLE_FACULTY => Ok(Principal::Faculty(id)),
            other => Err(AppError::NotAuthorized(format!("Unsupported role '{}'", other))),
        }
    }
}

/// Signs a token for a principal.
///
/// Arguments:
/// * `id`: Student or faculty id.
/// * `role`: `ROLE_STUDENT` or `ROLE_FACULTY`.
pub fn sign_jwt(
    id: i64,
    role: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        role: role.to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

fn principal_from_parts(parts: &Parts) -> Result<Principal, AppError> {
    parts
        .extensions
        .get::<Claims>()
        .ok_or_else(|| AppError::AuthError("Missing credentials".to_string()))?
        .principal()
}

/// Extractor: the requester must be a student. Must run behind `auth_middleware`.
#[derive(Debug, Clone, Copy)]
pub struct StudentPrincipal(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for StudentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match principal_from_parts(parts)? {
            Principal::Student(id) => Ok(StudentPrincipal(id)),
            Principal::Faculty(_) => Err(AppError::NotAuthorized(
                "Only students can do this".to_string(),
            )),
        }
    }
}

/// Extractor: the requester must be a faculty member. Must run behind `auth_middleware`.
#[derive(Debug, Clone, Copy)]
pub struct FacultyPrincipal(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for FacultyPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match principal_from_parts(parts)? {
            Principal::Faculty(id) => Ok(FacultyPrincipal(id)),
            Principal::Student(_) => Err(AppError::NotAuthorized(
                "Only faculty can do this".to_string(),
            )),
        }
    }
}

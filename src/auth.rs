use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ApiError, models::Role};

/// Claims
///
/// The payload structure signed into every JSON Web Token issued by the login
/// endpoint and validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The 24-hex id of the user the token was issued to.
    pub id: String,
    /// The role set at issue time. Carried in the token so that verification
    /// stays stateless: no store lookup happens on the request path.
    pub roles: Vec<Role>,
    /// Expiration time (seconds since epoch). Tokens live for one hour.
    pub exp: usize,
    /// Issued-at time (seconds since epoch).
    pub iat: usize,
}

/// Principal
///
/// The resolved identity of an authenticated request: the id and role set
/// decoded from a verified token. Derived fresh per request, never persisted.
/// Attached to the request extensions by [`verify_token`] and consumed by the
/// role gate and by handlers performing ownership checks.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub roles: Vec<Role>,
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    /// Pulls the Principal attached upstream by the token verifier. Handlers
    /// on protected routes can therefore take `Principal` as an argument; a
    /// missing attachment (a route wired without the verifier) rejects rather
    /// than panicking.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(ApiError::NoRoles)
    }
}

/// decode_principal
///
/// The core of the Token Verifier: maps a raw `Authorization` header value to
/// a Principal or an error.
///
/// Anything that is not `Bearer <token>` with a non-empty token (missing
/// header, empty value, `Bearer` alone, a trailing-space-only token, another
/// scheme) is `MissingToken`, and the JWT library is never invoked for it.
/// A present token failing verification for any cryptographic reason
/// (signature, expiry, malformed) is uniformly `InvalidToken`.
pub fn decode_principal(header: Option<&str>, secret: &str) -> Result<Principal, ApiError> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MissingToken)?;

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|_| ApiError::InvalidToken)?;

    Ok(Principal {
        id: token_data.claims.id,
        roles: token_data.claims.roles,
    })
}

/// verify_token
///
/// Middleware guarding every protected route. On success the decoded Principal
/// is attached to the request extensions for downstream consumption (role
/// gate, ownership checks); on failure the request is terminated here with
/// 401 (missing) or 403 (invalid) before any business logic runs.
pub async fn verify_token(
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match decode_principal(header, &config.jwt_secret) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// require_role
///
/// The Role Gate. Used as a factory: routes wrap it in a `from_fn` closure
/// binding the role the route requires.
///
/// The two failure conditions are deliberately distinct: an absent Principal
/// or an empty role set is "Access denied. No roles found.", while a role set
/// that simply lacks the required role is "Access denied.". Both are 403, but a
/// client (and the test suite) can tell them apart by message.
pub async fn require_role(required: Role, request: Request, next: Next) -> Response {
    let Some(principal) = request.extensions().get::<Principal>() else {
        return ApiError::NoRoles.into_response();
    };

    if principal.roles.is_empty() {
        return ApiError::NoRoles.into_response();
    }

    // Exact-match membership on the enumerated value. Duplicates and extra
    // roles are ignored; there is no hierarchy.
    if !principal.roles.contains(&required) {
        return ApiError::InsufficientRole.into_response();
    }

    next.run(request).await
}

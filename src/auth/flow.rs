//! Login, registration and logout against the auth endpoints

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::session::{Session, SessionContext};
use super::tokens::{SessionStore, StoredToken};
use crate::api::client::{ApiClient, ApiError};
use crate::models::{is_valid_mobile, Role, User, ValidationError};
use crate::router::{LawyerTab, Page};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Could not store session: {0}")]
    Storage(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Token response shared by login and client registration
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    user: User,
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name_len = self.name.trim().chars().count();
        if !(2..=100).contains(&name_len) {
            return Err(ValidationError::Length {
                field: "name",
                min: 2,
                max: 100,
            });
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::Missing("email"));
        }
        let pw_len = self.password.chars().count();
        if !(8..=100).contains(&pw_len) {
            return Err(ValidationError::Length {
                field: "password",
                min: 8,
                max: 100,
            });
        }
        if !is_valid_mobile(&self.phone) {
            return Err(ValidationError::InvalidMobile);
        }
        match self.role {
            Role::Admin => return Err(ValidationError::AdminRegistration),
            Role::Lawyer => {
                if self.specialization.as_deref().map_or(true, str::is_empty) {
                    return Err(ValidationError::Missing("specialization"));
                }
                if self.experience_years.is_none() {
                    return Err(ValidationError::Missing("experience years"));
                }
                if self.license_number.as_deref().map_or(true, str::is_empty) {
                    return Err(ValidationError::Missing("license number"));
                }
            }
            Role::Client => {}
        }
        Ok(())
    }
}

/// What happened after a successful registration.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// Lawyer account created in pending status; no session. Go to login.
    PendingVerification,
    /// Client account created and signed in.
    SignedIn(Page),
}

/// Dashboard a freshly signed-in user lands on.
pub fn landing_page(role: Role) -> Page {
    match role {
        Role::Admin => Page::AdminDashboard,
        Role::Lawyer => Page::LawyerDashboard(LawyerTab::Overview),
        Role::Client => Page::ClientDashboard,
    }
}

fn establish(
    session: &mut SessionContext,
    store: &mut impl SessionStore,
    resp: TokenResponse,
) -> Result<Page, AuthError> {
    let user_data = serde_json::to_string(&resp.user)?;
    let token = StoredToken::new(resp.access_token, resp.expires_in);
    let page = landing_page(resp.user.role);

    store.set_session(token.clone(), user_data);
    session.establish(Session {
        token,
        user: resp.user,
    });
    Ok(page)
}

/// Sign in. Session and store are only written on success.
pub async fn login_data(
    client: &ApiClient,
    session: &mut SessionContext,
    store: &mut impl SessionStore,
    email: &str,
    password: &str,
) -> Result<Page, AuthError> {
    let resp: TokenResponse = client
        .post("/api/auth/login", &LoginRequest { email, password })
        .await
        .map_err(|e| match e {
            ApiError::Unauthorized { .. } => AuthError::InvalidCredentials,
            other => AuthError::Api(other),
        })?;

    tracing::info!("Logged in as {} ({})", resp.user.email, resp.user.role);
    establish(session, store, resp)
}

/// Create an account. Clients are signed in; lawyers wait for verification.
pub async fn register_data(
    client: &ApiClient,
    session: &mut SessionContext,
    store: &mut impl SessionStore,
    request: &RegisterRequest,
) -> Result<RegisterOutcome, AuthError> {
    request.validate()?;

    match request.role {
        Role::Lawyer => {
            client
                .post::<_, serde_json::Value>("/api/auth/register", request)
                .await?;
            tracing::info!("Lawyer account {} awaiting verification", request.email);
            Ok(RegisterOutcome::PendingVerification)
        }
        _ => {
            let resp: TokenResponse = client.post("/api/auth/register", request).await?;
            tracing::info!("Registered and signed in as {}", resp.user.email);
            Ok(RegisterOutcome::SignedIn(establish(session, store, resp)?))
        }
    }
}

/// Sign out. The server is told best-effort; local state is always cleared.
pub async fn logout_data(
    client: &ApiClient,
    session: &mut SessionContext,
    store: &mut impl SessionStore,
) {
    if client.has_token() {
        if let Err(e) = client.post_empty("/api/auth/logout").await {
            tracing::warn!("Logout request failed (ignored): {}", e);
        }
    }
    session.clear();
    store.clear_session();
}

//! Authentication module for the consultation platform
//!
//! Email/password login against the REST backend. The returned bearer token
//! and user profile are kept in a `SessionContext` and persisted in the config
//! file so later invocations can restore them.

pub mod flow;
pub mod session;
pub mod tokens;

use anyhow::{Context, Result};

pub use flow::{RegisterOutcome, RegisterRequest};
pub use session::SessionContext;
pub use tokens::{SessionStore, StoredToken};

use crate::api::Connection;
use crate::router;

/// Log in and persist the session.
pub async fn login(conn: &mut Connection, email: &str, password: &str) -> Result<()> {
    let page = flow::login_data(
        &conn.client,
        &mut conn.session,
        &mut conn.config,
        email,
        password,
    )
    .await
    .context("Login failed")?;
    conn.config.save()?;
    conn.refresh_client();

    if let Some(user) = conn.session.user() {
        println!("Logged in as {} ({}).", user.name, user.role);
    }
    println!("Landing page: {}", page.title());
    Ok(())
}

/// Register a new account.
pub async fn register(conn: &mut Connection, request: &RegisterRequest) -> Result<()> {
    let outcome = flow::register_data(&conn.client, &mut conn.session, &mut conn.config, request)
        .await
        .context("Registration failed")?;

    match outcome {
        RegisterOutcome::PendingVerification => {
            println!("Registration received. Your lawyer account will be reviewed");
            println!("and activated within 24 hours. Log in once it is verified.");
        }
        RegisterOutcome::SignedIn(page) => {
            conn.config.save()?;
            conn.refresh_client();
            println!("Registered and logged in. Landing page: {}", page.title());
        }
    }
    Ok(())
}

/// Log out and clear the stored session.
pub async fn logout(conn: &mut Connection) -> Result<()> {
    flow::logout_data(&conn.client, &mut conn.session, &mut conn.config).await;
    conn.config.save()?;
    conn.refresh_client();
    println!("Logged out.");
    Ok(())
}

/// Show the stored session and where it would land.
pub fn status(conn: &Connection) -> Result<()> {
    let Some(user) = conn.session.user() else {
        println!("Not logged in.");
        return Ok(());
    };

    println!();
    println!("Name:    {}", user.name);
    println!("Email:   {}", user.email);
    println!("Role:    {}", user.role);
    println!("Status:  {}", user.status.as_str());
    println!("ID:      {}", user.id);
    println!("Backend: {}", conn.backend_url);

    let screen = router::resolve(Some(user), &flow::landing_page(user.role));
    println!("Screen:  {}", screen.title());
    Ok(())
}

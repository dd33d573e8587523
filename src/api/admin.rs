//! Admin endpoints: platform stats, user list, lawyer verification

use anyhow::{Context, Result};

use super::client::{ApiClient, ApiError};
use super::Connection;
use crate::models::{AdminOverview, AdminStats, User};

/// Number of users fetched for the admin overview
pub const USER_PAGE_SIZE: usize = 50;

/// Fetch stats and users concurrently.
pub async fn overview_data(client: &ApiClient) -> Result<AdminOverview, ApiError> {
    client.require_token()?;
    let users_path = format!("/api/admin/users?limit={}", USER_PAGE_SIZE);
    let (stats, users) = tokio::try_join!(
        client.get::<AdminStats>("/api/admin/stats"),
        client.get::<Vec<User>>(&users_path),
    )?;
    Ok(AdminOverview { stats, users })
}

/// Activate a pending lawyer. The caller refetches the overview on success.
pub async fn verify_lawyer_data(client: &ApiClient, lawyer_id: &str) -> Result<(), ApiError> {
    client.require_token()?;
    client
        .post_empty(&format!("/api/admin/lawyers/{}/verify", lawyer_id))
        .await?;
    tracing::info!("Lawyer {} verified", lawyer_id);
    Ok(())
}

/// Print stats and the verification queue.
pub async fn show_overview(conn: &Connection) -> Result<()> {
    let overview = overview_data(&conn.client).await?;

    println!("\nAdmin dashboard");
    println!("{:-<60}", "");
    println!("Total users:   {}", overview.stats.total_users);
    println!("Clients:       {}", overview.stats.total_clients);
    println!("Lawyers:       {}", overview.stats.total_lawyers);
    println!("Active users:  {}", overview.stats.active_users);

    let pending = overview.pending_lawyers();
    println!("\nLawyers awaiting verification:");
    if pending.is_empty() {
        println!("  (none)");
    }
    for lawyer in pending {
        println!("  {} <{}>  ID: {}", lawyer.name, lawyer.email, lawyer.id);
    }

    Ok(())
}

/// Print the user list.
pub async fn list_users(conn: &Connection) -> Result<()> {
    let overview = overview_data(&conn.client).await?;
    for user in &overview.users {
        println!(
            "{:<8} {:<10} {:<30} {}",
            user.role.as_str(),
            user.status.as_str(),
            user.email,
            user.id
        );
    }
    Ok(())
}

/// Verify a lawyer, then show the refreshed queue.
pub async fn verify_lawyer(conn: &Connection, lawyer_id: &str) -> Result<()> {
    verify_lawyer_data(&conn.client, lawyer_id)
        .await
        .context("Lawyer verification failed")?;
    println!("Lawyer {} verified.", lawyer_id);
    show_overview(conn).await
}

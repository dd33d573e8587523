//! Role dashboards. Summary figures are taken from the backend as-is.

use anyhow::Result;

use super::client::{ApiClient, ApiError};
use super::Connection;
use crate::models::{Appointment, ClientDashboard, LawyerDashboard, Role};
use crate::router::{self, Page, Screen};

pub async fn client_dashboard_data(client: &ApiClient) -> Result<ClientDashboard, ApiError> {
    client.require_token()?;
    client.get("/api/client/dashboard").await
}

pub async fn lawyer_dashboard_data(client: &ApiClient) -> Result<LawyerDashboard, ApiError> {
    client.require_token()?;
    client.get("/api/lawyer/dashboard").await
}

fn print_appointments(appointments: &[Appointment]) {
    println!("\nRecent appointments:");
    if appointments.is_empty() {
        println!("  (none)");
        return;
    }
    for a in appointments {
        println!(
            "  [{}] {} {} {} -- {} ({})",
            a.status,
            a.date,
            a.time,
            a.consultation_type.as_str(),
            a.lawyer_name.as_deref().unwrap_or(&a.lawyer_id),
            a.id
        );
    }
}

/// Show the dashboard the router resolves for the current session.
pub async fn show(conn: &Connection) -> Result<()> {
    let page = match conn.session.user().map(|u| u.role) {
        Some(Role::Admin) => Page::AdminDashboard,
        Some(Role::Lawyer) => Page::LawyerDashboard(Default::default()),
        Some(Role::Client) | None => Page::ClientDashboard,
    };

    match router::resolve(conn.session.user(), &page) {
        Screen::Login { .. } => {
            println!("{}", router::PLEASE_LOG_IN);
        }
        Screen::AwaitingVerification => {
            println!("Your lawyer account is under review.");
            println!("It will be activated within 24 hours.");
        }
        Screen::AccountDisabled => {
            println!("This account is disabled. Contact support.");
        }
        Screen::ClientDashboard => {
            let dash = client_dashboard_data(&conn.client).await?;
            println!("\nClient dashboard");
            println!("{:-<60}", "");
            println!("Total appointments:     {}", dash.stats.total_appointments);
            println!("Completed appointments: {}", dash.stats.completed_appointments);
            println!("Pending appointments:   {}", dash.stats.pending_appointments);
            println!("Total spent:            {:.2}", dash.stats.total_spent);
            print_appointments(&dash.recent_appointments);
        }
        Screen::LawyerDashboard { .. } => {
            let dash = lawyer_dashboard_data(&conn.client).await?;
            println!("\nLawyer dashboard");
            println!("{:-<60}", "");
            println!("Total appointments:     {}", dash.stats.total_appointments);
            println!("Completed appointments: {}", dash.stats.completed_appointments);
            println!("Pending appointments:   {}", dash.stats.pending_appointments);
            println!("Total earnings:         {:.2}", dash.stats.total_earnings);
            println!(
                "Rating:                 {:.1} ({} reviews)",
                dash.stats.average_rating, dash.stats.total_reviews
            );
            print_appointments(&dash.recent_appointments);
        }
        Screen::AdminDashboard => {
            super::admin::show_overview(conn).await?;
        }
        other => {
            tracing::debug!("Dashboard resolved to {:?}", other);
        }
    }

    Ok(())
}

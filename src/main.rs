//! Debra CLI - terminal client for the Debra legal consultation platform
//!
//! Browse lawyers, book and manage appointments, hold consultations and
//! handle payments from the command line or a full-screen TUI.

mod api;
mod auth;
mod config;
mod consultation;
mod models;
mod notify;
mod router;
mod tui;

use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::Connection;
use models::{
    AppointmentStatus, BookingRequest, ConsultationType, LawyerSearch, PaymentRequest, Role,
};

#[derive(Parser)]
#[command(name = "debra-cli")]
#[command(about = "Terminal client for the Debra legal consultation platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend base URL (overrides config and DEBRA_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        email: String,

        /// Password (prompted on stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create a client or lawyer account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Saudi mobile number, 9 digits starting with 5
        #[arg(long)]
        phone: String,

        /// client or lawyer
        #[arg(long, default_value = "client")]
        role: Role,

        /// Lawyers: area of practice
        #[arg(long)]
        specialization: Option<String>,

        /// Lawyers: years of experience
        #[arg(long)]
        experience_years: Option<u32>,

        /// Lawyers: bar license number
        #[arg(long)]
        license_number: Option<String>,

        /// Lawyers: short biography
        #[arg(long)]
        bio: Option<String>,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show the current session
    Status,

    /// List or search lawyers
    Lawyers {
        #[arg(long)]
        specialization: Option<String>,

        #[arg(long)]
        min_rating: Option<f64>,

        #[arg(long)]
        max_price: Option<u32>,

        #[arg(long)]
        language: Option<String>,
    },

    /// Show a lawyer's offered and booked times
    Availability {
        lawyer_id: String,

        /// Only show whether slots on this date (YYYY-MM-DD) are free
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Book an appointment
    Book {
        /// Lawyer ID (from `lawyers` output)
        #[arg(long)]
        lawyer: String,

        /// Date, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Time, HH:MM
        #[arg(long)]
        time: String,

        /// video, audio or chat
        #[arg(long = "type", default_value = "video")]
        consultation_type: ConsultationType,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Show the dashboard for your role
    Dashboard,

    /// Change an appointment's status (lawyers)
    Appointment {
        appointment_id: String,

        /// confirmed, completed or cancelled
        status: AppointmentStatus,
    },

    /// Start a consultation chat with a lawyer
    Consult {
        lawyer_id: String,

        #[arg(long = "type", default_value = "chat")]
        consultation_type: ConsultationType,

        /// Post messages to the backend instead of the simulated lawyer
        #[arg(long)]
        remote: bool,
    },

    /// Pay for an appointment
    Pay {
        #[arg(long)]
        appointment: String,

        #[arg(long)]
        amount: f64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Saudi mobile number, 9 digits starting with 5
        #[arg(long)]
        mobile: String,

        #[arg(long = "type", default_value = "video")]
        consultation_type: ConsultationType,

        #[arg(long, default_value = "")]
        lawyer_name: String,
    },

    /// Administration
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Launch the terminal user interface
    Tui,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Platform stats and lawyers awaiting verification
    Stats,

    /// List users
    Users,

    /// Activate a pending lawyer account
    Verify { lawyer_id: String },
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// The TUI owns the terminal, so logs go to a file in the data directory.
fn init_tui_logging(verbose: bool) -> Result<()> {
    let dir = config::Config::data_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data dir: {}", dir.display()))?;
    let path = dir.join("tui.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Tui) {
        init_tui_logging(cli.verbose)?;
    } else {
        init_logging(cli.verbose);
    }

    let backend = cli.backend_url.as_deref();
    let connect = || Connection::open(backend);

    match cli.command {
        Commands::Login { email, password } => {
            let mut conn = connect()?;
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            tracing::info!("Logging in as {}...", email);
            auth::login(&mut conn, &email, &password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
            phone,
            role,
            specialization,
            experience_years,
            license_number,
            bio,
        } => {
            let mut conn = connect()?;
            let request = auth::RegisterRequest {
                name,
                email,
                password,
                phone,
                role,
                specialization,
                experience_years,
                license_number,
                bio,
            };
            auth::register(&mut conn, &request).await?;
        }
        Commands::Logout => {
            let mut conn = connect()?;
            tracing::info!("Logging out...");
            auth::logout(&mut conn).await?;
        }
        Commands::Status => {
            let conn = connect()?;
            auth::status(&conn)?;
        }
        Commands::Lawyers {
            specialization,
            min_rating,
            max_price,
            language,
        } => {
            let conn = connect()?;
            let filters = LawyerSearch {
                specialization,
                min_rating,
                max_price,
                language,
            };
            api::lawyers::list_lawyers(&conn, &filters).await?;
        }
        Commands::Availability { lawyer_id, date } => {
            let conn = connect()?;
            api::lawyers::show_availability(&conn, &lawyer_id, date.as_deref()).await?;
        }
        Commands::Book {
            lawyer,
            date,
            time,
            consultation_type,
            notes,
        } => {
            let conn = connect()?;
            let request = BookingRequest {
                lawyer_id: lawyer,
                date,
                time,
                consultation_type,
                notes,
            };
            api::appointments::book(&conn, &request).await?;
        }
        Commands::Dashboard => {
            let conn = connect()?;
            api::dashboard::show(&conn).await?;
        }
        Commands::Appointment {
            appointment_id,
            status,
        } => {
            let conn = connect()?;
            api::appointments::set_status(&conn, &appointment_id, status).await?;
        }
        Commands::Consult {
            lawyer_id,
            consultation_type,
            remote,
        } => {
            let conn = connect()?;
            consultation::cli::chat(&conn, &lawyer_id, consultation_type, remote).await?;
        }
        Commands::Pay {
            appointment,
            amount,
            name,
            email,
            mobile,
            consultation_type,
            lawyer_name,
        } => {
            let conn = connect()?;
            let request = PaymentRequest {
                appointment_id: appointment,
                amount,
                customer_name: name,
                customer_email: email,
                customer_mobile: mobile,
                consultation_type,
                lawyer_name,
            };
            api::payments::pay(&conn, &request).await?;
        }
        Commands::Admin { command } => {
            let conn = connect()?;
            match command {
                AdminCommands::Stats => api::admin::show_overview(&conn).await?,
                AdminCommands::Users => api::admin::list_users(&conn).await?,
                AdminCommands::Verify { lawyer_id } => {
                    tracing::info!("Verifying lawyer {}...", lawyer_id);
                    api::admin::verify_lawyer(&conn, &lawyer_id).await?;
                }
            }
        }
        Commands::Tui => {
            tui::run(cli.backend_url.clone()).await?;
        }
    }

    Ok(())
}

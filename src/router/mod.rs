//! Role-based view routing
//!
//! `resolve` maps the current user and the requested page to the screen that
//! is actually shown. It is a pure function; every screen the TUI can draw is
//! a `Screen` variant.

use crate::models::{Role, User, UserStatus};

/// Notice shown when a protected page is requested without a session
pub const PLEASE_LOG_IN: &str = "Please log in to continue.";

/// Tabs of the lawyer dashboard
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LawyerTab {
    #[default]
    Overview,
    Appointments,
    Consultations,
    Profile,
    Settings,
}

impl LawyerTab {
    pub const ALL: [LawyerTab; 5] = [
        LawyerTab::Overview,
        LawyerTab::Appointments,
        LawyerTab::Consultations,
        LawyerTab::Profile,
        LawyerTab::Settings,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            LawyerTab::Overview => "Overview",
            LawyerTab::Appointments => "Appointments",
            LawyerTab::Consultations => "Consultations",
            LawyerTab::Profile => "Profile",
            LawyerTab::Settings => "Settings",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> LawyerTab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> LawyerTab {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// A page the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Register,
    Lawyers,
    Booking { lawyer_id: String },
    ClientDashboard,
    LawyerDashboard(LawyerTab),
    AdminDashboard,
    Consultation { lawyer_id: String },
}

impl Page {
    /// Pages that need a session.
    pub fn is_protected(&self) -> bool {
        !matches!(
            self,
            Page::Home | Page::Login | Page::Register | Page::Lawyers
        )
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Login => "Login",
            Page::Register => "Register",
            Page::Lawyers => "Lawyers",
            Page::Booking { .. } => "Booking",
            Page::ClientDashboard => "Client dashboard",
            Page::LawyerDashboard(_) => "Lawyer dashboard",
            Page::AdminDashboard => "Admin dashboard",
            Page::Consultation { .. } => "Consultation",
        }
    }
}

/// The screen that gets rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Home,
    /// `redirected` is set when a protected page bounced here.
    Login { redirected: bool },
    Register,
    Lawyers,
    Booking { lawyer_id: String },
    /// Holding screen for lawyers whose account is still pending.
    AwaitingVerification,
    /// Holding screen for suspended or inactive accounts.
    AccountDisabled,
    ClientDashboard,
    LawyerDashboard { tab: LawyerTab },
    /// Includes the pending-lawyer verification queue.
    AdminDashboard,
    Consultation { lawyer_id: String },
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Login { .. } => "Login",
            Screen::Register => "Register",
            Screen::Lawyers => "Lawyers",
            Screen::Booking { .. } => "Booking",
            Screen::AwaitingVerification => "Awaiting verification",
            Screen::AccountDisabled => "Account disabled",
            Screen::ClientDashboard => "Client dashboard",
            Screen::LawyerDashboard { .. } => "Lawyer dashboard",
            Screen::AdminDashboard => "Admin dashboard",
            Screen::Consultation { .. } => "Consultation",
        }
    }
}

/// Dashboard screen for an active user of `role`.
fn dashboard_for(role: Role, tab: LawyerTab) -> Screen {
    match role {
        Role::Client => Screen::ClientDashboard,
        Role::Lawyer => Screen::LawyerDashboard { tab },
        Role::Admin => Screen::AdminDashboard,
    }
}

/// Decide which screen to show.
pub fn resolve(user: Option<&User>, page: &Page) -> Screen {
    let Some(user) = user else {
        return match page {
            Page::Home => Screen::Home,
            Page::Login => Screen::Login { redirected: false },
            Page::Register => Screen::Register,
            Page::Lawyers => Screen::Lawyers,
            _ => Screen::Login { redirected: true },
        };
    };

    if user.is_pending_lawyer() {
        return Screen::AwaitingVerification;
    }

    if matches!(user.status, UserStatus::Suspended | UserStatus::Inactive) && page.is_protected() {
        return Screen::AccountDisabled;
    }

    match page {
        Page::Home => Screen::Home,
        Page::Lawyers => Screen::Lawyers,
        Page::Login | Page::Register => dashboard_for(user.role, LawyerTab::Overview),
        Page::Booking { lawyer_id } => Screen::Booking {
            lawyer_id: lawyer_id.clone(),
        },
        Page::Consultation { lawyer_id } => Screen::Consultation {
            lawyer_id: lawyer_id.clone(),
        },
        Page::LawyerDashboard(tab) => dashboard_for(user.role, *tab),
        Page::ClientDashboard | Page::AdminDashboard => {
            dashboard_for(user.role, LawyerTab::Overview)
        }
    }
}

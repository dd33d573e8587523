//! TUI application state and main event loop

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use ratatui::DefaultTerminal;
use tokio::time::Instant;

use super::backend::{Backend, BackendCommand, BackendResponse, Reply};
use super::compose::ComposeState;
use super::form::Form;
use super::scope::ScreenScope;
use super::ui;
use crate::api::appointments::StatusChange;
use crate::auth::flow::landing_page;
use crate::consultation::{ConsultationSession, SimulatedTransport};
use crate::models::{
    AdminOverview, Appointment, AppointmentStatus, Availability, ClientDashboard,
    ConsultationType, Lawyer, LawyerDashboard, LawyerSearch, Message, Sender, User,
};
use crate::notify::Notifier;
use crate::router::{self, LawyerTab, Page, Screen};

/// Notification expiry check interval
const TICK: Duration = Duration::from_millis(250);

/// A booked appointment waiting for the customer to pay.
pub struct PendingPayment {
    pub appointment: Appointment,
    pub amount: f64,
    pub lawyer_name: String,
    /// Gateway URL once the payment session exists.
    pub url: Option<String>,
}

/// Application state
pub struct App {
    pub should_exit: bool,
    pub user: Option<User>,
    pub page: Page,
    pub screen: Screen,
    scope: ScreenScope,
    pub notifier: Notifier,
    /// A request for the current screen is outstanding.
    pub loading: bool,
    /// Row selected in the current screen's list.
    pub selected: usize,
    pub lawyers: Vec<Lawyer>,
    pub availability: Option<Availability>,
    pub client_dashboard: Option<ClientDashboard>,
    pub lawyer_dashboard: Option<LawyerDashboard>,
    pub admin: Option<AdminOverview>,
    /// Recent appointments as last reported by the backend ledger.
    pub appointments: Vec<Appointment>,
    pub form: Option<Form>,
    pub payment: Option<PendingPayment>,
    pub compose: ComposeState,
    pub consultation: Option<ConsultationSession<SimulatedTransport>>,
}

impl Default for App {
    fn default() -> Self {
        Self {
            should_exit: false,
            user: None,
            page: Page::Home,
            screen: Screen::Home,
            scope: ScreenScope::new(0),
            notifier: Notifier::new(),
            loading: false,
            selected: 0,
            lawyers: Vec::new(),
            availability: None,
            client_dashboard: None,
            lawyer_dashboard: None,
            admin: None,
            appointments: Vec::new(),
            form: None,
            payment: None,
            compose: ComposeState::default(),
            consultation: None,
        }
    }
}

impl App {
    /// Generation of the current screen's scope.
    pub fn generation(&self) -> u64 {
        self.scope.generation()
    }

    /// Go to `page`. Cancels everything the previous screen had in flight.
    pub fn navigate(&mut self, page: Page, backend: &Backend) {
        self.scope.advance();
        self.page = page;
        self.screen = router::resolve(self.user.as_ref(), &self.page);
        tracing::debug!("Page {:?} resolved to {:?}", self.page, self.screen);

        self.selected = 0;
        self.loading = false;
        self.availability = None;
        self.payment = None;
        self.consultation = None;
        self.compose.clear();
        self.form = match self.screen {
            Screen::Login { .. } => Some(Form::login()),
            Screen::Register => Some(Form::register()),
            Screen::Booking { .. } => Some(Form::booking()),
            _ => None,
        };

        if let Screen::Login { redirected: true } = self.screen {
            self.notifier.info(router::PLEASE_LOG_IN, Instant::now());
        }
        self.load(backend);
    }

    /// Own dashboard, or the login screen without a session.
    fn dashboard_page(&self) -> Page {
        match &self.user {
            Some(user) => landing_page(user.role),
            None => Page::ClientDashboard,
        }
    }

    fn load(&mut self, backend: &Backend) {
        let command = match &self.screen {
            Screen::Lawyers => BackendCommand::LoadLawyers(LawyerSearch::default()),
            Screen::Booking { lawyer_id } => BackendCommand::LoadAvailability {
                lawyer_id: lawyer_id.clone(),
            },
            Screen::ClientDashboard => BackendCommand::LoadClientDashboard,
            Screen::LawyerDashboard { .. } => BackendCommand::LoadLawyerDashboard,
            Screen::AdminDashboard => BackendCommand::LoadAdminOverview,
            Screen::Consultation { lawyer_id } => BackendCommand::StartConsultation {
                lawyer_id: lawyer_id.clone(),
                consultation_type: ConsultationType::Chat,
            },
            _ => return,
        };
        self.loading = true;
        backend.send(&self.scope, command);
    }

    fn send(&mut self, backend: &Backend, command: BackendCommand) {
        self.loading = true;
        backend.send(&self.scope, command);
    }

    /// Switch lawyer dashboard tabs. Same screen, so nothing is cancelled.
    fn switch_tab(&mut self, tab: LawyerTab) {
        self.page = Page::LawyerDashboard(tab);
        self.screen = router::resolve(self.user.as_ref(), &self.page);
        self.selected = 0;
    }

    /// Number of rows in the list the current screen lets you select from.
    fn list_len(&self) -> usize {
        match &self.screen {
            Screen::Lawyers => self.lawyers.len(),
            Screen::LawyerDashboard {
                tab: LawyerTab::Appointments,
            } => self.appointments.len(),
            Screen::AdminDashboard => self
                .admin
                .as_ref()
                .map_or(0, |a| a.pending_lawyers().len()),
            _ => 0,
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.list_len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn selected_lawyer(&self) -> Option<&Lawyer> {
        self.lawyers.get(self.selected)
    }

    pub fn selected_appointment(&self) -> Option<&Appointment> {
        self.appointments.get(self.selected)
    }

    // -----------------------------------------------------------------------
    // Backend responses
    // -----------------------------------------------------------------------

    pub fn handle_reply(&mut self, reply: Reply, backend: &Backend) {
        if let Some(generation) = reply.generation {
            if generation != self.generation() {
                tracing::debug!(
                    "Dropping response for screen {} (now {})",
                    generation,
                    self.generation()
                );
                return;
            }
        }

        self.loading = false;
        let now = Instant::now();

        match reply.response {
            BackendResponse::Restored(user) => {
                self.user = user;
                if let Some(user) = &self.user {
                    tracing::info!("Restored session for {}", user.email);
                    let page = landing_page(user.role);
                    self.navigate(page, backend);
                }
            }
            BackendResponse::SignedIn { user, page } => {
                self.notifier
                    .success(format!("Welcome, {}", user.name), now);
                self.user = Some(user);
                self.navigate(page, backend);
            }
            BackendResponse::AwaitingVerification => {
                self.navigate(Page::Login, backend);
                self.notifier.info(
                    "Registration received. Your account will be reviewed within 24 hours.",
                    now,
                );
            }
            BackendResponse::SignedOut => {
                self.user = None;
                self.appointments.clear();
                self.client_dashboard = None;
                self.lawyer_dashboard = None;
                self.admin = None;
                self.navigate(Page::Home, backend);
                self.notifier.info("Logged out", now);
            }
            BackendResponse::Lawyers(lawyers) => {
                self.lawyers = lawyers;
                self.clamp_selection();
            }
            BackendResponse::Availability(availability) => {
                self.availability = Some(availability);
            }
            BackendResponse::Booked(appointment) => {
                self.notifier.success(
                    format!(
                        "Booked {} {} ({}). Enter payment details.",
                        appointment.date, appointment.time, appointment.status
                    ),
                    now,
                );
                let lawyer = self.lawyers.iter().find(|l| l.id == appointment.lawyer_id);
                let amount = lawyer.map_or(0.0, |l| l.price);
                let lawyer_name = lawyer
                    .map(|l| l.name.clone())
                    .or_else(|| appointment.lawyer_name.clone())
                    .unwrap_or_else(|| appointment.lawyer_id.clone());
                self.form = Some(Form::payment(self.user.as_ref()));
                self.payment = Some(PendingPayment {
                    appointment,
                    amount,
                    lawyer_name,
                    url: None,
                });
            }
            BackendResponse::PaymentCreated {
                appointment_id,
                url,
            } => {
                if let Some(payment) = self
                    .payment
                    .as_mut()
                    .filter(|p| p.appointment.id == appointment_id)
                {
                    payment.url = Some(url);
                    self.notifier
                        .success("Payment session created. Open the link to pay.", now);
                }
            }
            BackendResponse::Appointments(appointments) => {
                self.appointments = appointments;
                self.clamp_selection();
            }
            BackendResponse::ClientDashboard(dash) => {
                self.client_dashboard = Some(dash);
            }
            BackendResponse::LawyerDashboard(dash) => {
                self.lawyer_dashboard = Some(dash);
            }
            BackendResponse::AdminOverview(overview) => {
                self.admin = Some(overview);
                self.clamp_selection();
            }
            BackendResponse::LawyerVerified(id) => {
                self.notifier.success(format!("Lawyer {} verified", id), now);
            }
            BackendResponse::StatusChanged {
                appointment_id,
                change,
            } => match change {
                StatusChange::Unchanged(s) => {
                    self.notifier
                        .info(format!("Appointment {} is already {}", appointment_id, s), now);
                }
                StatusChange::Changed(s) => {
                    self.notifier
                        .success(format!("Appointment {} is now {}", appointment_id, s), now);
                }
            },
            BackendResponse::ConsultationStarted(consultation) => {
                let local = self
                    .user
                    .as_ref()
                    .map_or(Sender::Client, |u| Sender::for_role(u.role));
                self.notifier.info("Consultation started", now);
                self.consultation = Some(ConsultationSession::simulated(consultation, local));
            }
            BackendResponse::ConsultationEnded(id) => {
                if let Some(session) = self.consultation.as_mut() {
                    if session.consultation().id == id {
                        session.end();
                    }
                }
                self.notifier.success("Consultation ended", now);
            }
            BackendResponse::Failed(message) => {
                self.notifier.error(message, now);
            }
            BackendResponse::ClientError(message) => {
                tracing::error!("Backend failed to start: {}", message);
                self.notifier.error(message, now);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Keyboard
    // -----------------------------------------------------------------------

    pub async fn handle_key(&mut self, key: KeyEvent, backend: &Backend) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_exit = true;
            return;
        }

        match self.screen {
            Screen::Login { .. } | Screen::Register | Screen::Booking { .. } => {
                self.handle_form_key(key, backend)
            }
            Screen::Consultation { .. } => self.handle_chat_key(key, backend).await,
            _ => self.handle_nav_key(key, backend),
        }
    }

    fn handle_nav_key(&mut self, key: KeyEvent, backend: &Backend) {
        match key.code {
            KeyCode::Char('q') => self.should_exit = true,
            KeyCode::Esc if self.notifier.current(Instant::now()).is_some() => {
                self.notifier.dismiss()
            }
            KeyCode::Esc | KeyCode::Char('h') => self.navigate(Page::Home, backend),
            KeyCode::Char('l') => self.navigate(Page::Lawyers, backend),
            KeyCode::Char('d') => self.navigate(self.dashboard_page(), backend),
            KeyCode::Char('i') => self.navigate(Page::Login, backend),
            KeyCode::Char('r') => self.navigate(Page::Register, backend),
            KeyCode::Char('o') if self.user.is_some() => self.send(backend, BackendCommand::Logout),
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.list_len() {
                    self.selected += 1;
                }
            }
            _ => self.handle_screen_key(key, backend),
        }
    }

    fn handle_screen_key(&mut self, key: KeyEvent, backend: &Backend) {
        match self.screen {
            Screen::Lawyers => {
                let Some(lawyer_id) = self.selected_lawyer().map(|l| l.id.clone()) else {
                    return;
                };
                match key.code {
                    KeyCode::Char('b') | KeyCode::Enter => {
                        self.navigate(Page::Booking { lawyer_id }, backend)
                    }
                    KeyCode::Char('c') => self.navigate(Page::Consultation { lawyer_id }, backend),
                    _ => {}
                }
            }
            Screen::LawyerDashboard { tab } => match key.code {
                KeyCode::Left => self.switch_tab(tab.prev()),
                KeyCode::Right | KeyCode::Tab => self.switch_tab(tab.next()),
                KeyCode::Char(c) if tab == LawyerTab::Appointments => {
                    let status = match c {
                        'c' => AppointmentStatus::Confirmed,
                        'x' => AppointmentStatus::Cancelled,
                        'm' => AppointmentStatus::Completed,
                        _ => return,
                    };
                    if let Some(appointment) = self.selected_appointment() {
                        let command = BackendCommand::SetAppointmentStatus {
                            appointment_id: appointment.id.clone(),
                            status,
                        };
                        self.send(backend, command);
                    }
                }
                _ => {}
            },
            Screen::AdminDashboard => {
                if key.code != KeyCode::Char('v') {
                    return;
                }
                let pending = self
                    .admin
                    .as_ref()
                    .and_then(|a| a.pending_lawyers().get(self.selected).map(|u| u.id.clone()));
                if let Some(user_id) = pending {
                    self.send(backend, BackendCommand::VerifyLawyer { user_id });
                }
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent, backend: &Backend) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                let back = match self.screen {
                    Screen::Booking { .. } => Page::Lawyers,
                    _ => Page::Home,
                };
                self.navigate(back, backend);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Enter if !form.on_last_field() => form.next_field(),
            KeyCode::Enter => self.submit_form(backend),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(input) = form.focused_mut() {
                    input.clear();
                }
            }
            _ => {
                if let Some(input) = form.focused_mut() {
                    edit(input, key);
                }
            }
        }
    }

    fn submit_form(&mut self, backend: &Backend) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let now = Instant::now();

        let command = match &self.screen {
            Screen::Login { .. } => {
                let (email, password) = form.credentials();
                if email.is_empty() || password.is_empty() {
                    self.notifier.error("Email and password are required", now);
                    return;
                }
                BackendCommand::Login { email, password }
            }
            Screen::Register => {
                let request = form
                    .register_request()
                    .and_then(|r| r.validate().map(|_| r).map_err(|e| e.to_string()));
                match request {
                    Ok(r) => BackendCommand::Register(Box::new(r)),
                    Err(message) => {
                        self.notifier.error(message, now);
                        return;
                    }
                }
            }
            Screen::Booking { lawyer_id } => match &self.payment {
                Some(PendingPayment { url: Some(_), .. }) => {
                    self.notifier.info("Payment link already created", now);
                    return;
                }
                Some(p) => BackendCommand::CreatePayment(Box::new(form.payment_request(
                    &p.appointment,
                    p.amount,
                    &p.lawyer_name,
                ))),
                None => match form.booking_request(lawyer_id) {
                    Ok(request) => {
                        if let Some(availability) = &self.availability {
                            if !availability.is_free(&request.date, &request.time) {
                                self.notifier
                                    .error("That time is not available for this lawyer", now);
                                return;
                            }
                        }
                        BackendCommand::Book(request)
                    }
                    Err(message) => {
                        self.notifier.error(message, now);
                        return;
                    }
                },
            },
            _ => return,
        };
        self.send(backend, command);
    }

    async fn handle_chat_key(&mut self, key: KeyEvent, backend: &Backend) {
        let now = Instant::now();
        match key.code {
            KeyCode::Esc => self.navigate(Page::Lawyers, backend),
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(session) = self.consultation.as_ref().filter(|s| s.is_active()) {
                    let command = BackendCommand::EndConsultation {
                        consultation_id: session.consultation().id.clone(),
                    };
                    self.send(backend, command);
                }
            }
            KeyCode::Enter => {
                let Some(session) = self.consultation.as_mut() else {
                    self.notifier.info("Consultation is still starting", now);
                    return;
                };
                match session.send_message(&self.compose.input).await {
                    Ok(_) => self.compose.clear(),
                    Err(e) => {
                        self.notifier.error(e.to_string(), now);
                    }
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.compose.clear()
            }
            _ => edit(&mut self.compose, key),
        }
    }
}

/// Apply a plain editing key to an input box.
fn edit(input: &mut ComposeState, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => input.insert_char(c),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => {}
    }
}

/// Next incoming consultation message, or never when no session is open.
async fn next_incoming(session: &mut Option<ConsultationSession<SimulatedTransport>>) -> Message {
    match session {
        Some(s) => s.next_incoming().await,
        None => std::future::pending().await,
    }
}

/// Run the TUI application with panic-safe terminal restore
pub async fn run(backend_override: Option<String>) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = AssertUnwindSafe(run_app(&mut terminal, backend_override))
        .catch_unwind()
        .await;
    ratatui::restore();

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

async fn run_app(terminal: &mut DefaultTerminal, backend_override: Option<String>) -> Result<()> {
    let mut app = App::default();
    let mut backend = Backend::start(backend_override);
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    while !app.should_exit {
        terminal.draw(|frame| ui::render(frame, &app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, &backend).await;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(reply) = backend.recv() => {
                app.handle_reply(reply, &backend);
            }
            message = next_incoming(&mut app.consultation) => {
                tracing::debug!("Consultation message from {}", message.sender.as_str());
            }
            _ = tick.tick() => {
                app.notifier.expire(Instant::now());
            }
        }
    }

    Ok(())
}

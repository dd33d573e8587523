//! Async backend: bridges the TUI event loop with API calls.
//!
//! Uses an mpsc channel pair. The TUI sends commands tagged with the issuing
//! screen's generation and cancel token; a background tokio task executes them
//! and sends responses back. State that outlives a screen (connection, session
//! and the appointment ledger) lives on that task. Commands that touch it run
//! in order there; plain fetches are spawned.
//!
//! Reads race the cancel token, so work for a screen the user already left is
//! dropped. Commands that change server or session state always run to
//! completion; only their replies go stale.

use tokio::sync::mpsc;

use tokio_util::sync::CancellationToken;

use super::scope::ScreenScope;
use crate::api::client::ApiClient;
use crate::api::{admin, appointments, consultations, dashboard, lawyers, payments, Connection};
use crate::auth::{flow, RegisterOutcome, RegisterRequest};
use crate::models::{
    AdminOverview, Appointment, AppointmentLedger, AppointmentStatus, Availability,
    BookingRequest, ClientDashboard, Consultation, ConsultationStatus, ConsultationType, Lawyer,
    LawyerDashboard, LawyerSearch, PaymentRequest, User,
};
use crate::router::Page;

/// How many ledger entries the TUI shows
const RECENT_LIMIT: usize = 10;

/// Commands sent from the TUI event loop to the async backend.
#[derive(Debug)]
pub enum BackendCommand {
    Login {
        email: String,
        password: String,
    },
    Register(Box<RegisterRequest>),
    Logout,
    LoadLawyers(LawyerSearch),
    LoadAvailability {
        lawyer_id: String,
    },
    Book(BookingRequest),
    LoadClientDashboard,
    LoadLawyerDashboard,
    LoadAdminOverview,
    VerifyLawyer {
        user_id: String,
    },
    SetAppointmentStatus {
        appointment_id: String,
        status: AppointmentStatus,
    },
    StartConsultation {
        lawyer_id: String,
        consultation_type: ConsultationType,
    },
    EndConsultation {
        consultation_id: String,
    },
    CreatePayment(Box<PaymentRequest>),
}

impl BackendCommand {
    /// Read-only requests that need nothing but the client.
    fn is_fetch(&self) -> bool {
        matches!(
            self,
            BackendCommand::LoadLawyers(_)
                | BackendCommand::LoadAvailability { .. }
                | BackendCommand::LoadAdminOverview
        )
    }

    /// Requests that change server or session state.
    fn is_mutation(&self) -> bool {
        !self.is_fetch()
            && !matches!(
                self,
                BackendCommand::LoadClientDashboard | BackendCommand::LoadLawyerDashboard
            )
    }
}

/// Responses from the async backend to the TUI.
#[derive(Debug)]
pub enum BackendResponse {
    /// Session restored from the config file at startup.
    Restored(Option<User>),
    SignedIn {
        user: User,
        page: Page,
    },
    /// Lawyer registration accepted; the account waits for an admin.
    AwaitingVerification,
    SignedOut,
    Lawyers(Vec<Lawyer>),
    Availability(Availability),
    Booked(Appointment),
    /// Snapshot of the ledger, newest first.
    Appointments(Vec<Appointment>),
    ClientDashboard(ClientDashboard),
    LawyerDashboard(LawyerDashboard),
    AdminOverview(AdminOverview),
    LawyerVerified(String),
    StatusChanged {
        appointment_id: String,
        change: appointments::StatusChange,
    },
    ConsultationStarted(Consultation),
    ConsultationEnded(String),
    PaymentCreated {
        appointment_id: String,
        url: String,
    },
    /// A request failed; shown as an error notification.
    Failed(String),
    /// Config could not be loaded; the backend is not running.
    ClientError(String),
}

impl BackendResponse {
    /// Session changes concern every screen, not just the one that asked.
    fn is_unscoped(&self) -> bool {
        matches!(
            self,
            BackendResponse::SignedIn { .. } | BackendResponse::SignedOut
        )
    }
}

/// A response and the screen generation it belongs to. `None` is unscoped.
pub struct Reply {
    pub generation: Option<u64>,
    pub response: BackendResponse,
}

struct Request {
    generation: u64,
    cancel: CancellationToken,
    command: BackendCommand,
}

/// Handle for interacting with the backend from the TUI side.
pub struct Backend {
    cmd_tx: mpsc::UnboundedSender<Request>,
    resp_rx: mpsc::UnboundedReceiver<Reply>,
}

impl Backend {
    /// Start the backend. Spawns a tokio task that processes commands.
    pub fn start(backend_override: Option<String>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();

        tokio::spawn(backend_loop(backend_override, cmd_rx, resp_tx));

        Self { cmd_tx, resp_rx }
    }

    /// Send a command on behalf of the screen owning `scope` (non-blocking).
    pub fn send(&self, scope: &ScreenScope, command: BackendCommand) {
        let request = Request {
            generation: scope.generation(),
            cancel: scope.token(),
            command,
        };
        if self.cmd_tx.send(request).is_err() {
            tracing::error!("Backend channel closed -- command dropped");
        }
    }

    /// Receive a response from the backend.
    ///
    /// Returns `None` only when the backend task is gone. Cancel safe, for use
    /// inside `tokio::select!`.
    pub async fn recv(&mut self) -> Option<Reply> {
        self.resp_rx.recv().await
    }
}

#[cfg(test)]
impl Backend {
    /// Handle with no task behind it. Commands are dropped.
    pub fn detached() -> Self {
        let (cmd_tx, _) = mpsc::unbounded_channel();
        let (_, resp_rx) = mpsc::unbounded_channel();
        Self { cmd_tx, resp_rx }
    }
}

fn failed(e: impl std::fmt::Display) -> BackendResponse {
    BackendResponse::Failed(e.to_string())
}

async fn fetch(client: &ApiClient, command: BackendCommand) -> BackendResponse {
    match command {
        BackendCommand::LoadLawyers(filters) => {
            match lawyers::search_lawyers_data(client, &filters).await {
                Ok(list) => BackendResponse::Lawyers(list),
                Err(e) => failed(e),
            }
        }
        BackendCommand::LoadAvailability { lawyer_id } => {
            match lawyers::availability_data(client, &lawyer_id).await {
                Ok(a) => BackendResponse::Availability(a),
                Err(e) => failed(e),
            }
        }
        BackendCommand::LoadAdminOverview => match admin::overview_data(client).await {
            Ok(o) => BackendResponse::AdminOverview(o),
            Err(e) => failed(e),
        },
        _ => failed("Unsupported request"),
    }
}

struct BackendState {
    conn: Connection,
    ledger: AppointmentLedger,
    /// Write session changes back to the config file.
    persist: bool,
}

impl BackendState {
    fn snapshot(&self) -> BackendResponse {
        BackendResponse::Appointments(
            self.ledger
                .recent(RECENT_LIMIT)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    /// Persist the session fields and rebuild the client around them.
    fn session_changed(&mut self) {
        if self.persist {
            if let Err(e) = self.conn.config.save() {
                tracing::warn!("Could not save session: {:#}", e);
            }
        }
        self.conn.refresh_client();
        self.ledger = AppointmentLedger::new();
    }

    fn signed_in(&mut self, page: Page) -> Vec<BackendResponse> {
        self.session_changed();
        match self.conn.session.user() {
            Some(user) => vec![BackendResponse::SignedIn {
                user: user.clone(),
                page,
            }],
            None => vec![failed("Session was not established")],
        }
    }

    async fn execute(&mut self, command: BackendCommand) -> Vec<BackendResponse> {
        let conn = &mut self.conn;
        match command {
            BackendCommand::Login { email, password } => {
                let result = flow::login_data(
                    &conn.client,
                    &mut conn.session,
                    &mut conn.config,
                    &email,
                    &password,
                )
                .await;
                match result {
                    Ok(page) => self.signed_in(page),
                    Err(e) => vec![failed(e)],
                }
            }
            BackendCommand::Register(request) => {
                let result = flow::register_data(
                    &conn.client,
                    &mut conn.session,
                    &mut conn.config,
                    &request,
                )
                .await;
                match result {
                    Ok(RegisterOutcome::PendingVerification) => {
                        vec![BackendResponse::AwaitingVerification]
                    }
                    Ok(RegisterOutcome::SignedIn(page)) => self.signed_in(page),
                    Err(e) => vec![failed(e)],
                }
            }
            BackendCommand::Logout => {
                flow::logout_data(&conn.client, &mut conn.session, &mut conn.config).await;
                self.session_changed();
                vec![BackendResponse::SignedOut]
            }
            BackendCommand::Book(request) => {
                match appointments::book_data(&conn.client, &mut self.ledger, &request).await {
                    Ok(a) => vec![BackendResponse::Booked(a), self.snapshot()],
                    Err(e) => vec![failed(e)],
                }
            }
            BackendCommand::LoadClientDashboard => {
                match dashboard::client_dashboard_data(&conn.client).await {
                    Ok(dash) => {
                        self.ledger.replace_all(dash.recent_appointments.clone());
                        vec![BackendResponse::ClientDashboard(dash), self.snapshot()]
                    }
                    Err(e) => vec![failed(e)],
                }
            }
            BackendCommand::LoadLawyerDashboard => {
                match dashboard::lawyer_dashboard_data(&conn.client).await {
                    Ok(dash) => {
                        self.ledger.replace_all(dash.recent_appointments.clone());
                        vec![BackendResponse::LawyerDashboard(dash), self.snapshot()]
                    }
                    Err(e) => vec![failed(e)],
                }
            }
            BackendCommand::VerifyLawyer { user_id } => {
                if let Err(e) = admin::verify_lawyer_data(&conn.client, &user_id).await {
                    return vec![failed(e)];
                }
                let mut out = vec![BackendResponse::LawyerVerified(user_id)];
                match admin::overview_data(&conn.client).await {
                    Ok(o) => out.push(BackendResponse::AdminOverview(o)),
                    Err(e) => out.push(failed(e)),
                }
                out
            }
            BackendCommand::SetAppointmentStatus {
                appointment_id,
                status,
            } => {
                let Some(user) = conn.session.user().cloned() else {
                    return vec![failed("Not logged in")];
                };
                let result = appointments::update_status_data(
                    &conn.client,
                    &user,
                    &mut self.ledger,
                    &appointment_id,
                    status,
                )
                .await;
                match result {
                    Ok(change) => vec![
                        BackendResponse::StatusChanged {
                            appointment_id,
                            change,
                        },
                        self.snapshot(),
                    ],
                    Err(e) => vec![failed(e)],
                }
            }
            BackendCommand::StartConsultation {
                lawyer_id,
                consultation_type,
            } => {
                let client_id = conn.session.user().map(|u| u.id.clone());
                let result = consultations::start_data(
                    &conn.client,
                    &lawyer_id,
                    consultation_type,
                    client_id.as_deref(),
                )
                .await;
                match result {
                    Ok(c) => vec![BackendResponse::ConsultationStarted(c)],
                    Err(e) => vec![failed(e)],
                }
            }
            BackendCommand::EndConsultation { consultation_id } => {
                let result = consultations::set_status_data(
                    &conn.client,
                    &consultation_id,
                    ConsultationStatus::Completed,
                )
                .await;
                match result {
                    Ok(()) => vec![BackendResponse::ConsultationEnded(consultation_id)],
                    Err(e) => vec![failed(e)],
                }
            }
            BackendCommand::CreatePayment(request) => {
                let settings = payments::settings_data(&conn.client).await;
                match payments::create_payment_data(&conn.client, &settings, &request).await {
                    Ok(url) => vec![BackendResponse::PaymentCreated {
                        appointment_id: request.appointment_id.clone(),
                        url,
                    }],
                    Err(e) => vec![failed(e)],
                }
            }
            fetch_command => vec![fetch(&conn.client, fetch_command).await],
        }
    }
}

fn reply(
    resp_tx: &mpsc::UnboundedSender<Reply>,
    generation: u64,
    responses: Vec<BackendResponse>,
) {
    for response in responses {
        let generation = (!response.is_unscoped()).then_some(generation);
        let _ = resp_tx.send(Reply {
            generation,
            response,
        });
    }
}

/// Background loop that processes commands.
///
/// Opens the connection once (config plus restored session). If that fails,
/// sends a ClientError response and exits.
async fn backend_loop(
    backend_override: Option<String>,
    mut cmd_rx: mpsc::UnboundedReceiver<Request>,
    resp_tx: mpsc::UnboundedSender<Reply>,
) {
    let conn = match Connection::open(backend_override.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            let _ = resp_tx.send(Reply {
                generation: None,
                response: BackendResponse::ClientError(format!("{:#}", e)),
            });
            return;
        }
    };
    let _ = resp_tx.send(Reply {
        generation: None,
        response: BackendResponse::Restored(conn.session.user().cloned()),
    });

    let mut state = BackendState {
        conn,
        ledger: AppointmentLedger::new(),
        persist: true,
    };

    while let Some(request) = cmd_rx.recv().await {
        dispatch(&mut state, request, &resp_tx).await;
    }
}

/// Run one request. Reads are skipped or abandoned once their screen's token is
/// cancelled; mutations are not.
async fn dispatch(
    state: &mut BackendState,
    request: Request,
    resp_tx: &mpsc::UnboundedSender<Reply>,
) {
    let Request {
        generation,
        cancel,
        command,
    } = request;

    if command.is_mutation() {
        let responses = state.execute(command).await;
        if cancel.is_cancelled() {
            tracing::debug!("Screen {} closed while its request ran", generation);
        }
        reply(resp_tx, generation, responses);
        return;
    }

    if cancel.is_cancelled() {
        tracing::debug!("Skipping request for closed screen {}", generation);
        return;
    }

    if command.is_fetch() {
        let client = state.conn.client.clone();
        let resp_tx = resp_tx.clone();

        // Spawn fetches so a slow one does not hold up the queue.
        tokio::spawn(async move {
            tokio::select! {
                response = fetch(&client, command) => {
                    reply(&resp_tx, generation, vec![response]);
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("Fetch for screen {} cancelled", generation);
                }
            }
        });
    } else {
        tokio::select! {
            responses = state.execute(command) => {
                reply(resp_tx, generation, responses);
            }
            _ = cancel.cancelled() => {
                tracing::debug!("Request for screen {} cancelled", generation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_server;
    use crate::auth::session::{tests::user, Session};
    use crate::auth::{SessionContext, SessionStore, StoredToken};
    use crate::config::Config;
    use crate::models::{Role, UserStatus};
    use std::time::Duration;

    fn state(base: String) -> BackendState {
        let session = SessionContext::anonymous();
        let client = ApiClient::new(base.clone(), Some("tok".to_string()));
        BackendState {
            conn: Connection {
                config: Config::default(),
                session,
                client,
                backend_url: base,
            },
            ledger: AppointmentLedger::new(),
            persist: false,
        }
    }

    #[tokio::test]
    async fn test_fetch_lawyers() {
        let body = r#"[{"id":"l-1","name":"Ahmed","specialization":"Family law","rating":4.5,"price":300}]"#;
        let (base, _server) = test_server::serve(vec![(200, body.to_string())]).await;
        let client = ApiClient::new(base, None);
        match fetch(&client, BackendCommand::LoadLawyers(LawyerSearch::default())).await {
            BackendResponse::Lawyers(list) => assert_eq!(list[0].name, "Ahmed"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_dashboard_becomes_failed_response() {
        let (base, _server) =
            test_server::serve(vec![(500, r#"{"detail":"boom"}"#.to_string())]).await;
        let mut st = state(base);
        let out = st.execute(BackendCommand::LoadClientDashboard).await;
        assert_eq!(out.len(), 1);
        match &out[0] {
            BackendResponse::Failed(msg) => assert!(msg.contains("boom"), "{}", msg),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dashboard_seeds_ledger_snapshot() {
        let body = r#"{"stats":{"total_appointments":1},"recent_appointments":[
            {"id":"a-1","lawyer_id":"l-1","client_id":"c-1","date":"2025-03-01","time":"10:00",
             "consultation_type":"video","status":"pending"}]}"#;
        let (base, _server) = test_server::serve(vec![(200, body.to_string())]).await;
        let mut st = state(base);
        let out = st.execute(BackendCommand::LoadLawyerDashboard).await;
        assert!(matches!(out[0], BackendResponse::LawyerDashboard(_)));
        match &out[1] {
            BackendResponse::Appointments(list) => assert_eq!(list[0].id, "a-1"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(st.ledger.get("a-1").is_some());
    }

    /// Accepts connections and never answers.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_navigation_cancels_in_flight_request() {
        let mut st = state(silent_server().await);
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let mut scope = ScreenScope::new(1);
        let request = Request {
            generation: 1,
            cancel: scope.token(),
            command: BackendCommand::LoadClientDashboard,
        };

        let navigate = async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            scope.advance();
        };
        tokio::join!(dispatch(&mut st, request, &resp_tx), navigate);

        drop(resp_tx);
        assert!(resp_rx.recv().await.is_none());
        assert_eq!(scope.generation(), 2);
    }

    #[tokio::test]
    async fn test_closed_screen_request_is_skipped() {
        let (base, server) = test_server::serve(vec![(200, "[]".to_string())]).await;
        let mut st = state(base);
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let scope = ScreenScope::new(4);
        let request = Request {
            generation: 4,
            cancel: scope.token(),
            command: BackendCommand::LoadLawyerDashboard,
        };
        drop(scope);

        dispatch(&mut st, request, &resp_tx).await;
        drop(resp_tx);
        assert!(resp_rx.recv().await.is_none());
        server.abort();
    }

    #[tokio::test]
    async fn test_replies_carry_generation() {
        let (base, _server) = test_server::serve(vec![(200, r#"{"id":"c-1","lawyer_id":"l-1",
            "consultation_type":"chat","status":"active"}"#.to_string())]).await;
        let mut st = state(base);
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let scope = ScreenScope::new(9);
        let request = Request {
            generation: 9,
            cancel: scope.token(),
            command: BackendCommand::StartConsultation {
                lawyer_id: "l-1".to_string(),
                consultation_type: ConsultationType::Chat,
            },
        };

        dispatch(&mut st, request, &resp_tx).await;
        let reply = resp_rx.recv().await.unwrap();
        assert_eq!(reply.generation, Some(9));
        assert!(matches!(reply.response, BackendResponse::ConsultationStarted(_)));
    }

    /// Issue `command` for screen 3 and leave that screen 20ms later.
    async fn dispatch_then_navigate(
        st: &mut BackendState,
        command: BackendCommand,
    ) -> Vec<Reply> {
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let mut scope = ScreenScope::new(3);
        let request = Request {
            generation: 3,
            cancel: scope.token(),
            command,
        };
        let navigate = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            scope.advance();
        };
        tokio::join!(dispatch(st, request, &resp_tx), navigate);
        assert_eq!(scope.generation(), 4);

        drop(resp_tx);
        let mut replies = Vec::new();
        while let Some(reply) = resp_rx.recv().await {
            replies.push(reply);
        }
        replies
    }

    #[tokio::test]
    async fn test_logout_completes_after_navigation() {
        let (base, _server) = test_server::serve_delayed(
            Duration::from_millis(200),
            vec![(200, r#"{"message":"ok"}"#.to_string())],
        )
        .await;
        let mut st = state(base);
        let token = StoredToken::new("tok".to_string(), None);
        st.conn.session.establish(Session {
            token: token.clone(),
            user: user(Role::Client, UserStatus::Active),
        });
        st.conn.config.set_session(token, "{}".to_string());

        let replies = dispatch_then_navigate(&mut st, BackendCommand::Logout).await;

        assert!(!st.conn.session.is_authenticated());
        assert!(st.conn.config.get_auth_token().is_none());
        assert!(st.conn.config.get_user_data().is_none());
        assert!(!st.conn.client.has_token());
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].generation, None);
        assert!(matches!(replies[0].response, BackendResponse::SignedOut));
    }

    #[tokio::test]
    async fn test_booking_completes_after_navigation() {
        let body = r#"{"id":"a-9","lawyer_id":"l-1","client_id":"c-1","date":"2025-03-01",
            "time":"10:00","consultation_type":"video","status":"pending"}"#;
        let (base, _server) =
            test_server::serve_delayed(Duration::from_millis(200), vec![(200, body.to_string())])
                .await;
        let mut st = state(base);
        let request = BookingRequest {
            lawyer_id: "l-1".to_string(),
            date: "2025-03-01".to_string(),
            time: "10:00".to_string(),
            consultation_type: ConsultationType::Video,
            notes: String::new(),
        };

        let replies = dispatch_then_navigate(&mut st, BackendCommand::Book(request)).await;

        let recorded = st.ledger.get("a-9").unwrap();
        assert_eq!(recorded.status, AppointmentStatus::Pending);
        // Screen-specific replies keep the old generation for the app to drop.
        assert!(replies.iter().all(|r| r.generation == Some(3)));
        assert!(matches!(replies[0].response, BackendResponse::Booked(_)));
    }

    #[tokio::test]
    async fn test_queued_logout_runs_for_closed_screen() {
        let (base, server) =
            test_server::serve(vec![(200, r#"{"message":"ok"}"#.to_string())]).await;
        let mut st = state(base);
        let token = StoredToken::new("tok".to_string(), None);
        st.conn.session.establish(Session {
            token,
            user: user(Role::Lawyer, UserStatus::Active),
        });
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let scope = ScreenScope::new(5);
        let request = Request {
            generation: 5,
            cancel: scope.token(),
            command: BackendCommand::Logout,
        };
        drop(scope);

        dispatch(&mut st, request, &resp_tx).await;
        assert!(!st.conn.session.is_authenticated());
        let reply = resp_rx.recv().await.unwrap();
        assert!(matches!(reply.response, BackendResponse::SignedOut));
        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/auth/logout "));
    }

    #[tokio::test]
    async fn test_create_payment_returns_url() {
        let (base, server) = test_server::serve(vec![
            (200, r#"{"min_amount":50,"max_amount":50000,"currency":"SAR"}"#.to_string()),
            (
                200,
                r#"{"success":true,"payment_url":"https://pay.example/inv/7"}"#.to_string(),
            ),
        ])
        .await;
        let mut st = state(base);
        let request = PaymentRequest {
            appointment_id: "a-9".to_string(),
            amount: 300.0,
            customer_name: "Omar".to_string(),
            customer_email: "omar@example.com".to_string(),
            customer_mobile: "512345678".to_string(),
            consultation_type: ConsultationType::Video,
            lawyer_name: "Ahmed".to_string(),
        };

        let out = st
            .execute(BackendCommand::CreatePayment(Box::new(request)))
            .await;
        match &out[0] {
            BackendResponse::PaymentCreated {
                appointment_id,
                url,
            } => {
                assert_eq!(appointment_id, "a-9");
                assert_eq!(url, "https://pay.example/inv/7");
            }
            other => panic!("unexpected {:?}", other),
        }
        let requests = server.await.unwrap();
        assert!(requests[1].starts_with("POST /api/payments/create "));
    }
}

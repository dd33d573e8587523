//! UI rendering for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Widget, Wrap},
    Frame,
};
use tokio::time::Instant;

use super::app::App;
use super::compose;
use super::form;
use crate::models::{Appointment, AppointmentStatus, Sender};
use crate::notify::Severity;
use crate::router::{LawyerTab, Screen};

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: header (1 line) + main content + status bar (1 line)
    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);

    match &app.screen {
        Screen::Home => render_home(main_area, frame.buffer_mut(), app),
        Screen::Login { .. } | Screen::Register => {
            if let Some(f) = &app.form {
                form::render(main_area, frame, f, app.screen.title(), true);
            }
        }
        Screen::Lawyers => render_lawyers(main_area, frame, app),
        Screen::Booking { lawyer_id } => render_booking(main_area, frame, app, lawyer_id),
        Screen::AwaitingVerification => render_notice(
            main_area,
            frame.buffer_mut(),
            "Your lawyer account is under review",
            "It will be activated within 24 hours. Press o to log out.",
        ),
        Screen::AccountDisabled => render_notice(
            main_area,
            frame.buffer_mut(),
            "This account is disabled",
            "Contact support to reactivate it. Press o to log out.",
        ),
        Screen::ClientDashboard => render_client_dashboard(main_area, frame.buffer_mut(), app),
        Screen::LawyerDashboard { tab } => render_lawyer_dashboard(main_area, frame, app, *tab),
        Screen::AdminDashboard => render_admin_dashboard(main_area, frame, app),
        Screen::Consultation { .. } => render_consultation(main_area, frame, app),
    }

    render_status(status_area, frame.buffer_mut(), app);
}

/// Render the header bar
fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let title = format!(" Debra | {}", app.screen.title());
    let who = match &app.user {
        Some(u) => format!("{} ({}) ", u.name, u.role),
        None => "not signed in ".to_string(),
    };
    let loading = if app.loading { "loading... " } else { "" };

    let left_width = unicode_width::UnicodeWidthStr::width(title.as_str());
    let right_width = unicode_width::UnicodeWidthStr::width(who.as_str()) + loading.len();
    let padding = (area.width as usize).saturating_sub(left_width + right_width);

    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(padding)),
        Span::styled(loading, Style::default().fg(Color::Yellow)),
        Span::styled(who, Style::default().fg(Color::Cyan)),
    ]);

    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// Render the status bar: the live notification, or key hints.
fn render_status(area: Rect, buf: &mut Buffer, app: &App) {
    if let Some(n) = app.notifier.current(Instant::now()) {
        let color = match n.severity {
            Severity::Info => Color::Cyan,
            Severity::Success => Color::Green,
            Severity::Error => Color::Red,
        };
        Paragraph::new(Line::from(Span::styled(
            format!(" {} ", n.message),
            Style::default().fg(color),
        )))
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
        return;
    }

    let hints = match app.screen {
        Screen::Login { .. } | Screen::Register => "Tab: next field | Enter: submit | Esc: back",
        Screen::Booking { .. } if app.payment.is_some() => {
            "Tab: next field | Enter: pay | Esc: lawyers"
        }
        Screen::Booking { .. } => "Tab: next field | Enter: book | Esc: lawyers",
        Screen::Consultation { .. } => "Enter: send | C-e: end consultation | Esc: leave",
        Screen::Lawyers => "j/k: select | b: book | c: consult | h: home | d: dashboard | q: quit",
        Screen::LawyerDashboard { .. } => "<-/->: tabs | l: lawyers | o: logout | q: quit",
        Screen::AdminDashboard => "j/k: select | v: verify lawyer | o: logout | q: quit",
        _ => "l: lawyers | d: dashboard | i: login | r: register | o: logout | q: quit",
    };
    Paragraph::new(Line::from(Span::styled(
        format!(" {}", hints),
        Style::default().fg(Color::Gray),
    )))
    .style(Style::default().bg(Color::DarkGray))
    .render(area, buf);
}

fn bordered(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(Color::DarkGray))
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn render_home(area: Rect, buf: &mut Buffer, app: &App) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Legal consultations, booked from your terminal",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw("Browse lawyers, book a video, audio or chat consultation,"),
        Line::raw("and follow your appointments from the dashboard."),
        Line::raw(""),
    ];
    lines.push(match &app.user {
        Some(u) => Line::raw(format!("Signed in as {}. Press d for your dashboard.", u.email)),
        None => Line::raw("Press i to log in or r to create an account."),
    });

    Paragraph::new(lines)
        .block(bordered("Home"))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_notice(area: Rect, buf: &mut Buffer, headline: &str, detail: &str) {
    let lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            headline.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(detail.to_string()),
    ];
    Paragraph::new(lines)
        .block(bordered("Account"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_lawyers(area: Rect, frame: &mut Frame, app: &App) {
    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Fill(1)]).areas(area);

    let items: Vec<ListItem> = app
        .lawyers
        .iter()
        .map(|l| {
            let availability = if l.available { "" } else { "  (unavailable)" };
            ListItem::new(format!(
                "{:<24} {:<20} {:>3.1}*  {:>7.0}{}",
                l.name, l.specialization, l.rating, l.price, availability
            ))
        })
        .collect();

    let list = List::new(items)
        .block(bordered("Lawyers"))
        .highlight_style(highlight())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, list_area, &mut state);

    let detail = match app.selected_lawyer() {
        Some(l) => vec![
            Line::from(Span::styled(
                l.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::raw(l.specialization.clone()),
            Line::raw(format!("{} years of experience", l.experience_years)),
            Line::raw(format!("Languages: {}", l.languages.join(", "))),
            Line::raw(""),
            Line::raw(l.description.clone()),
        ],
        None => vec![Line::raw("No lawyers loaded")],
    };
    Paragraph::new(detail)
        .block(bordered("Profile"))
        .wrap(Wrap { trim: true })
        .render(detail_area, frame.buffer_mut());
}

fn appointment_line(a: &Appointment) -> String {
    format!(
        "{} {}  {:<6} {:<10} {}",
        a.date,
        a.time,
        a.consultation_type.as_str(),
        a.status.as_str(),
        a.lawyer_name.as_deref().unwrap_or(&a.lawyer_id)
    )
}

fn render_appointment_list(area: Rect, buf: &mut Buffer, appointments: &[Appointment]) {
    let lines: Vec<Line> = if appointments.is_empty() {
        vec![Line::raw("No appointments yet")]
    } else {
        appointments
            .iter()
            .map(|a| Line::raw(appointment_line(a)))
            .collect()
    };
    Paragraph::new(lines)
        .block(bordered("Recent appointments"))
        .render(area, buf);
}

fn render_booking(area: Rect, frame: &mut Frame, app: &App, lawyer_id: &str) {
    let [form_area, side_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Fill(1)]).areas(area);

    let name = app
        .lawyers
        .iter()
        .find(|l| l.id == lawyer_id)
        .map_or(lawyer_id, |l| l.name.as_str());
    let title = match &app.payment {
        Some(p) => format!("Pay for appointment {}", p.appointment.id),
        None => format!("Book {}", name),
    };
    if let Some(f) = &app.form {
        form::render(form_area, frame, f, &title, true);
    }

    let [slots_area, recent_area] =
        Layout::vertical([Constraint::Percentage(40), Constraint::Fill(1)]).areas(side_area);

    if let Some(p) = &app.payment {
        let mut lines = stat_lines(&[
            ("Lawyer", p.lawyer_name.clone()),
            ("Date", format!("{} {}", p.appointment.date, p.appointment.time)),
            ("Type", p.appointment.consultation_type.as_str().to_string()),
            ("Amount", format!("{:.2}", p.amount)),
        ]);
        match &p.url {
            Some(url) => {
                lines.push(Line::raw(""));
                lines.push(Line::from(Span::styled(
                    " Open to pay:",
                    Style::default().fg(Color::Green),
                )));
                lines.push(Line::raw(format!(" {}", url)));
            }
            None => lines.push(Line::from(Span::styled(
                " Enter creates the payment link",
                Style::default().fg(Color::Gray),
            ))),
        }
        Paragraph::new(lines)
            .block(bordered("Payment"))
            .wrap(Wrap { trim: false })
            .render(slots_area, frame.buffer_mut());
        render_appointment_list(recent_area, frame.buffer_mut(), &app.appointments);
        return;
    }

    let slots = match &app.availability {
        Some(a) if !a.available_times.is_empty() => a.available_times.join("  "),
        Some(_) => "No published times".to_string(),
        None => "Loading...".to_string(),
    };
    Paragraph::new(slots)
        .block(bordered("Available times"))
        .wrap(Wrap { trim: true })
        .render(slots_area, frame.buffer_mut());

    render_appointment_list(recent_area, frame.buffer_mut(), &app.appointments);
}

fn stat_lines(rows: &[(&str, String)]) -> Vec<Line<'static>> {
    rows.iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!(" {:<24}", label), Style::default().fg(Color::Gray)),
                Span::styled(value.clone(), Style::default().fg(Color::White)),
            ])
        })
        .collect()
}

fn render_client_dashboard(area: Rect, buf: &mut Buffer, app: &App) {
    let [stats_area, list_area] =
        Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).areas(area);

    let lines = match &app.client_dashboard {
        Some(d) => stat_lines(&[
            ("Total appointments", d.stats.total_appointments.to_string()),
            ("Completed", d.stats.completed_appointments.to_string()),
            ("Pending", d.stats.pending_appointments.to_string()),
            ("Total spent", format!("{:.2}", d.stats.total_spent)),
        ]),
        None => vec![Line::raw(" Loading...")],
    };
    Paragraph::new(lines)
        .block(bordered("Summary"))
        .render(stats_area, buf);

    render_appointment_list(list_area, buf, &app.appointments);
}

/// Key hint for the transitions the selected appointment allows.
fn transition_hint(status: AppointmentStatus) -> String {
    let keys: Vec<&str> = status
        .next_statuses()
        .iter()
        .map(|s| match s {
            AppointmentStatus::Confirmed => "c: confirm",
            AppointmentStatus::Cancelled => "x: cancel",
            AppointmentStatus::Completed => "m: complete",
            AppointmentStatus::Pending => "",
        })
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        format!("{} is final", status)
    } else {
        keys.join("  ")
    }
}

fn render_lawyer_dashboard(area: Rect, frame: &mut Frame, app: &App, tab: LawyerTab) {
    let [tabs_area, body_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area);

    let titles: Vec<&str> = LawyerTab::ALL.iter().map(|t| t.title()).collect();
    let selected = LawyerTab::ALL.iter().position(|t| *t == tab).unwrap_or(0);
    Tabs::new(titles)
        .block(bordered("Lawyer dashboard"))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .render(tabs_area, frame.buffer_mut());

    match tab {
        LawyerTab::Overview => {
            let lines = match &app.lawyer_dashboard {
                Some(d) => stat_lines(&[
                    ("Total appointments", d.stats.total_appointments.to_string()),
                    ("Completed", d.stats.completed_appointments.to_string()),
                    ("Pending", d.stats.pending_appointments.to_string()),
                    ("Total earnings", format!("{:.2}", d.stats.total_earnings)),
                    (
                        "Rating",
                        format!(
                            "{:.1} ({} reviews)",
                            d.stats.average_rating, d.stats.total_reviews
                        ),
                    ),
                ]),
                None => vec![Line::raw(" Loading...")],
            };
            Paragraph::new(lines)
                .block(bordered("Overview"))
                .render(body_area, frame.buffer_mut());
        }
        LawyerTab::Appointments => {
            let [list_area, hint_area] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(body_area);
            let items: Vec<ListItem> = app
                .appointments
                .iter()
                .map(|a| ListItem::new(appointment_line(a)))
                .collect();
            let list = List::new(items)
                .block(bordered("Appointments"))
                .highlight_style(highlight())
                .highlight_symbol("> ");
            let mut state = ListState::default().with_selected(Some(app.selected));
            frame.render_stateful_widget(list, list_area, &mut state);

            if let Some(a) = app.selected_appointment() {
                Paragraph::new(format!(" {}", transition_hint(a.status)))
                    .style(Style::default().fg(Color::Gray))
                    .render(hint_area, frame.buffer_mut());
            }
        }
        LawyerTab::Consultations => {
            let chats: Vec<Appointment> = app
                .appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Confirmed)
                .cloned()
                .collect();
            render_appointment_list(body_area, frame.buffer_mut(), &chats);
        }
        LawyerTab::Profile => {
            let lines = match &app.user {
                Some(u) => stat_lines(&[
                    ("Name", u.name.clone()),
                    ("Email", u.email.clone()),
                    ("Mobile", u.phone.clone().unwrap_or_default()),
                    ("Status", u.status.as_str().to_string()),
                ]),
                None => Vec::new(),
            };
            Paragraph::new(lines)
                .block(bordered("Profile"))
                .render(body_area, frame.buffer_mut());
        }
        LawyerTab::Settings => {
            Paragraph::new(" Profile and availability are managed by the platform team.")
                .block(bordered("Settings"))
                .wrap(Wrap { trim: true })
                .render(body_area, frame.buffer_mut());
        }
    }
}

fn render_admin_dashboard(area: Rect, frame: &mut Frame, app: &App) {
    let [stats_area, queue_area] =
        Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).areas(area);

    let Some(overview) = &app.admin else {
        Paragraph::new(" Loading...")
            .block(bordered("Admin dashboard"))
            .render(area, frame.buffer_mut());
        return;
    };

    Paragraph::new(stat_lines(&[
        ("Total users", overview.stats.total_users.to_string()),
        ("Clients", overview.stats.total_clients.to_string()),
        ("Lawyers", overview.stats.total_lawyers.to_string()),
        ("Active users", overview.stats.active_users.to_string()),
    ]))
    .block(bordered("Platform"))
    .render(stats_area, frame.buffer_mut());

    let items: Vec<ListItem> = overview
        .pending_lawyers()
        .into_iter()
        .map(|u| ListItem::new(format!("{:<24} {:<28} {}", u.name, u.email, u.id)))
        .collect();
    let list = List::new(items)
        .block(bordered("Lawyers awaiting verification"))
        .highlight_style(highlight())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, queue_area, &mut state);
}

fn render_consultation(area: Rect, frame: &mut Frame, app: &App) {
    let [log_area, compose_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(compose::COMPOSE_HEIGHT),
    ])
    .areas(area);

    let Some(session) = &app.consultation else {
        Paragraph::new(" Starting consultation...")
            .block(bordered("Consultation"))
            .render(area, frame.buffer_mut());
        return;
    };

    let local = session.local_sender();
    let lines: Vec<Line> = session
        .messages()
        .iter()
        .map(|m| {
            let (label, color) = if m.sender == local {
                ("You", Color::Cyan)
            } else {
                match m.sender {
                    Sender::Lawyer => ("Lawyer", Color::Green),
                    Sender::Client => ("Client", Color::Magenta),
                }
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", m.timestamp.format("%H:%M")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{}: ", label),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(m.text.clone()),
            ])
        })
        .collect();

    // Keep the newest messages in view
    let visible = log_area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(visible) as u16;

    let title = format!(
        "Consultation with {} ({})",
        session
            .consultation()
            .lawyer_name
            .as_deref()
            .unwrap_or(&session.consultation().lawyer_id),
        session.status().as_str()
    );
    Paragraph::new(lines)
        .block(bordered(&title))
        .scroll((scroll, 0))
        .render(log_area, frame.buffer_mut());

    let placeholder = if session.is_active() {
        "Type a message..."
    } else {
        "This consultation has ended"
    };
    compose::render(
        compose_area,
        frame,
        &app.compose,
        placeholder,
        "Enter: send  C-e: end",
        session.is_active(),
    );
}

//! Labelled input forms for login, registration, booking and payment.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

use super::compose::{self, ComposeState};
use crate::auth::RegisterRequest;
use crate::models::{Appointment, BookingRequest, ConsultationType, PaymentRequest, Role, User};

const LABEL_WIDTH: u16 = 20;

pub struct Field {
    pub label: &'static str,
    pub hint: &'static str,
    pub input: ComposeState,
    pub secret: bool,
}

pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    fn new(layout: &[(&'static str, &'static str, bool)]) -> Self {
        Self {
            fields: layout
                .iter()
                .map(|&(label, hint, secret)| Field {
                    label,
                    hint,
                    input: ComposeState::default(),
                    secret,
                })
                .collect(),
            focus: 0,
        }
    }

    pub fn login() -> Self {
        Self::new(&[
            ("Email", "you@example.com", false),
            ("Password", "", true),
        ])
    }

    pub fn register() -> Self {
        Self::new(&[
            ("Name", "", false),
            ("Email", "", false),
            ("Password", "at least 8 characters", true),
            ("Mobile", "5XXXXXXXX", false),
            ("Role", "client or lawyer", false),
            ("Specialization", "lawyers only", false),
            ("Experience years", "lawyers only", false),
            ("License number", "lawyers only", false),
        ])
    }

    pub fn booking() -> Self {
        Self::new(&[
            ("Date", "YYYY-MM-DD", false),
            ("Time", "HH:MM", false),
            ("Type", "video, audio or chat", false),
            ("Notes", "", false),
        ])
    }

    /// Customer details for paying a booked appointment, filled in from the
    /// signed-in user where known.
    pub fn payment(user: Option<&User>) -> Self {
        let mut form = Self::new(&[
            ("Name", "", false),
            ("Email", "", false),
            ("Mobile", "5XXXXXXXX", false),
        ]);
        if let Some(user) = user {
            form.prefill("Name", &user.name);
            form.prefill("Email", &user.email);
            form.prefill("Mobile", user.phone.as_deref().unwrap_or_default());
        }
        form
    }

    fn prefill(&mut self, label: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.label == label) {
            field.input.clear();
            value.chars().for_each(|c| field.input.insert_char(c));
        }
    }

    /// Trimmed value of the field labelled `label`, empty when absent.
    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.input.input.trim())
            .unwrap_or("")
    }

    /// Untrimmed value, for passwords.
    fn raw(&self, label: &str) -> String {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.input.input.clone())
            .unwrap_or_default()
    }

    fn optional(&self, label: &str) -> Option<String> {
        Some(self.value(label))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn focused_mut(&mut self) -> Option<&mut ComposeState> {
        self.fields.get_mut(self.focus).map(|f| &mut f.input)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn on_last_field(&self) -> bool {
        self.focus + 1 >= self.fields.len()
    }

    pub fn credentials(&self) -> (String, String) {
        (self.value("Email").to_string(), self.raw("Password"))
    }

    pub fn register_request(&self) -> Result<RegisterRequest, String> {
        let role: Role = self
            .value("Role")
            .parse()
            .map_err(|_| "Role must be client or lawyer".to_string())?;
        let experience_years = match self.value("Experience years") {
            "" => None,
            v => Some(
                v.parse::<u32>()
                    .map_err(|_| "Experience years must be a number".to_string())?,
            ),
        };
        let (specialization, license_number) = if role == Role::Lawyer {
            (self.optional("Specialization"), self.optional("License number"))
        } else {
            (None, None)
        };

        Ok(RegisterRequest {
            name: self.value("Name").to_string(),
            email: self.value("Email").to_string(),
            password: self.raw("Password"),
            phone: self.value("Mobile").to_string(),
            role,
            specialization,
            experience_years: experience_years.filter(|_| role == Role::Lawyer),
            license_number,
            bio: None,
        })
    }

    pub fn payment_request(
        &self,
        appointment: &Appointment,
        amount: f64,
        lawyer_name: &str,
    ) -> PaymentRequest {
        PaymentRequest {
            appointment_id: appointment.id.clone(),
            amount,
            customer_name: self.value("Name").to_string(),
            customer_email: self.value("Email").to_string(),
            customer_mobile: self.value("Mobile").to_string(),
            consultation_type: appointment.consultation_type,
            lawyer_name: lawyer_name.to_string(),
        }
    }

    pub fn booking_request(&self, lawyer_id: &str) -> Result<BookingRequest, String> {
        let date = self.value("Date");
        let time = self.value("Time");
        if date.is_empty() || time.is_empty() {
            return Err("Date and time are required".to_string());
        }
        let consultation_type = match self.value("Type") {
            "" => ConsultationType::default(),
            v => v.parse()?,
        };
        Ok(BookingRequest {
            lawyer_id: lawyer_id.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            consultation_type,
            notes: self.value("Notes").to_string(),
        })
    }
}

/// Render the form, one field per row, with the cursor on the focused field.
pub fn render(area: Rect, frame: &mut Frame, form: &Form, title: &str, focused: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    for (i, field) in form.fields.iter().enumerate() {
        let row = i as u16 * 2;
        if row >= inner.height {
            break;
        }
        let is_focused = focused && i == form.focus;
        let label_style = if is_focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let label_area = Rect::new(inner.x, inner.y + row, LABEL_WIDTH.min(inner.width), 1);
        Paragraph::new(Line::from(Span::styled(
            format!(" {}:", field.label),
            label_style,
        )))
        .render(label_area, frame.buffer_mut());

        let input_width = inner.width.saturating_sub(LABEL_WIDTH);
        if input_width == 0 {
            continue;
        }
        let input_area = Rect::new(inner.x + LABEL_WIDTH, inner.y + row, input_width, 1);
        let cursor = compose::render_input(
            input_area,
            frame.buffer_mut(),
            &field.input,
            field.hint,
            field.secret,
        );
        if is_focused {
            frame.set_cursor_position(cursor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(form: &mut Form, label: &str, text: &str) {
        let field = form.fields.iter_mut().find(|f| f.label == label).unwrap();
        for c in text.chars() {
            field.input.insert_char(c);
        }
    }

    #[test]
    fn test_focus_wraps() {
        let mut form = Form::login();
        assert_eq!(form.focus, 0);
        form.next_field();
        assert!(form.on_last_field());
        form.next_field();
        assert_eq!(form.focus, 0);
        form.prev_field();
        assert_eq!(form.focus, 1);
    }

    #[test]
    fn test_client_register_request_drops_lawyer_fields() {
        let mut form = Form::register();
        fill(&mut form, "Name", "Omar");
        fill(&mut form, "Email", "omar@example.com");
        fill(&mut form, "Password", "secret123");
        fill(&mut form, "Mobile", "512345678");
        fill(&mut form, "Role", "client");
        fill(&mut form, "Specialization", "ignored");

        let req = form.register_request().unwrap();
        assert_eq!(req.role, Role::Client);
        assert_eq!(req.specialization, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_lawyer_register_request() {
        let mut form = Form::register();
        fill(&mut form, "Role", "lawyer");
        fill(&mut form, "Experience years", "x");
        assert!(form.register_request().is_err());

        let mut form = Form::register();
        fill(&mut form, "Role", "lawyer");
        fill(&mut form, "Specialization", "Labor law");
        fill(&mut form, "Experience years", "12");
        fill(&mut form, "License number", "LIC-1");
        let req = form.register_request().unwrap();
        assert_eq!(req.experience_years, Some(12));
        assert_eq!(req.license_number.as_deref(), Some("LIC-1"));
    }

    #[test]
    fn test_booking_request() {
        let mut form = Form::booking();
        assert!(form.booking_request("l-1").is_err());

        fill(&mut form, "Date", "2025-03-01");
        fill(&mut form, "Time", "10:00");
        fill(&mut form, "Type", "chat");
        let req = form.booking_request("l-1").unwrap();
        assert_eq!(req.lawyer_id, "l-1");
        assert_eq!(req.consultation_type, ConsultationType::Chat);
    }

    #[test]
    fn test_payment_form_prefills_from_user() {
        use crate::auth::session::tests::user;
        use crate::models::UserStatus;

        let client = user(Role::Client, UserStatus::Active);
        let form = Form::payment(Some(&client));
        assert_eq!(form.value("Name"), "Test");
        assert_eq!(form.value("Email"), "client@example.com");
        assert_eq!(form.value("Mobile"), "512345678");
        assert_eq!(form.fields[0].input.cursor_pos, 4);

        let appointment: Appointment = serde_json::from_str(
            r#"{"id":"a-9","lawyer_id":"l-1","date":"2025-03-01","time":"10:00",
                "consultation_type":"audio","status":"pending"}"#,
        )
        .unwrap();
        let req = form.payment_request(&appointment, 300.0, "Ahmed");
        assert_eq!(req.appointment_id, "a-9");
        assert_eq!(req.consultation_type, ConsultationType::Audio);
        assert_eq!(req.customer_mobile, "512345678");
        assert_eq!(req.lawyer_name, "Ahmed");

        assert!(Form::payment(None).value("Name").is_empty());
    }
}

//! Line-based consultation chat on stdin/stdout

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{ConsultationError, ConsultationSession, MessageTransport, RemoteTransport};
use crate::api::consultations::{set_status_data, start_data};
use crate::api::Connection;
use crate::models::{ConsultationStatus, ConsultationType, Message, Sender};

fn print_message(message: &Message, local: Sender) {
    let who = if message.sender == local {
        "you"
    } else {
        message.sender.as_str()
    };
    println!("[{}] {}: {}", message.timestamp.format("%H:%M"), who, message.text);
}

/// Start a consultation and chat until `/end`, `/quit` or end of input.
///
/// With `remote` set, messages are posted to the backend record and no
/// simulated replies are produced.
pub async fn chat(
    conn: &Connection,
    lawyer_id: &str,
    consultation_type: ConsultationType,
    remote: bool,
) -> Result<()> {
    let user = conn
        .session
        .user()
        .context("Not logged in. Run 'debra-cli login' first.")?;

    let consultation = start_data(&conn.client, lawyer_id, consultation_type, Some(&user.id))
        .await
        .context("Could not start consultation")?;
    let local = Sender::for_role(user.role);

    println!(
        "Consultation {} with {} ({}).",
        consultation.id,
        consultation
            .lawyer_name
            .as_deref()
            .unwrap_or(&consultation.lawyer_id),
        consultation.consultation_type.as_str()
    );
    println!("Type a message and press Enter. /end finishes the consultation, /quit leaves.");

    if remote {
        let transport = RemoteTransport::new(conn.client.clone(), consultation.id.clone());
        run(conn, ConsultationSession::new(consultation, local, transport)).await
    } else {
        run(conn, ConsultationSession::simulated(consultation, local)).await
    }
}

async fn run<T: MessageTransport>(
    conn: &Connection,
    mut session: ConsultationSession<T>,
) -> Result<()> {
    let local = session.local_sender();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match line.trim() {
                    "/quit" => break,
                    "/end" => {
                        let id = session.consultation().id.clone();
                        set_status_data(&conn.client, &id, ConsultationStatus::Completed)
                            .await
                            .context("Could not end consultation")?;
                        session.end();
                        println!("Consultation ended.");
                        break;
                    }
                    text => match session.send_message(text).await {
                        Ok(message) => print_message(&message, local),
                        Err(ConsultationError::EmptyMessage) => {}
                        Err(e) => eprintln!("{}", e),
                    },
                }
            }
            message = session.next_incoming() => {
                print_message(&message, local);
            }
        }
    }

    tracing::debug!("Left consultation after {} messages", session.messages().len());
    Ok(())
}

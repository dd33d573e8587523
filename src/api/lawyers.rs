//! Lawyer directory endpoints

use anyhow::Result;
use serde::Deserialize;

use super::client::{ApiClient, ApiError};
use super::Connection;
use crate::models::{Availability, Lawyer, LawyerSearch};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    lawyers: Vec<Lawyer>,
}

/// Fetch the full directory.
pub async fn list_lawyers_data(client: &ApiClient) -> Result<Vec<Lawyer>, ApiError> {
    client.get("/api/lawyers").await
}

/// Fetch the directory filtered by the search endpoint.
pub async fn search_lawyers_data(
    client: &ApiClient,
    filters: &LawyerSearch,
) -> Result<Vec<Lawyer>, ApiError> {
    if filters.is_empty() {
        return list_lawyers_data(client).await;
    }
    // The serializer is not Send; finish it before the await.
    let path = {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(ref s) = filters.specialization {
            query.append_pair("specialization", s);
        }
        if let Some(r) = filters.min_rating {
            query.append_pair("min_rating", &r.to_string());
        }
        if let Some(p) = filters.max_price {
            query.append_pair("max_price", &p.to_string());
        }
        if let Some(ref l) = filters.language {
            query.append_pair("language", l);
        }
        format!("/api/search/lawyers?{}", query.finish())
    };
    let resp: SearchResponse = client.get(&path).await?;
    Ok(resp.lawyers)
}

pub async fn availability_data(
    client: &ApiClient,
    lawyer_id: &str,
) -> Result<Availability, ApiError> {
    client
        .get(&format!("/api/lawyers/{}/availability", lawyer_id))
        .await
}

/// List lawyers (prints to stdout).
pub async fn list_lawyers(conn: &Connection, filters: &LawyerSearch) -> Result<()> {
    let lawyers = search_lawyers_data(&conn.client, filters).await?;

    println!("\nLawyers:");
    println!("{:-<60}", "");

    if lawyers.is_empty() {
        println!("  (no lawyers found)");
        return Ok(());
    }

    for lawyer in &lawyers {
        let marker = if lawyer.available { "*" } else { "o" };
        println!("{} {} -- {}", marker, lawyer.name, lawyer.specialization);
        println!("  ID: {}", lawyer.id);
        println!(
            "  Rating: {:.1}  Price: {}  Experience: {} years",
            lawyer.rating, lawyer.price, lawyer.experience_years
        );
        if !lawyer.languages.is_empty() {
            println!("  Languages: {}", lawyer.languages.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Show open slots for a lawyer (prints to stdout).
pub async fn show_availability(
    conn: &Connection,
    lawyer_id: &str,
    date: Option<&str>,
) -> Result<()> {
    let avail = availability_data(&conn.client, lawyer_id).await?;

    println!("\nAvailability for {}:", avail.lawyer_id);
    for time in &avail.available_times {
        let taken = match date {
            Some(d) => !avail.is_free(d, time),
            None => false,
        };
        println!("  {} {}", time, if taken { "(booked)" } else { "" });
    }
    if date.is_none() && !avail.booked_appointments.is_empty() {
        println!("\nBooked:");
        for slot in &avail.booked_appointments {
            println!("  {} {}", slot.date, slot.time);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_server;

    #[tokio::test]
    async fn test_search_builds_query_and_unwraps_list() {
        let body = r#"{"count":1,"lawyers":[{"id":"l-1","name":"Ahmed","specialization":"Commercial law","price":300}],"search_criteria":{}}"#;
        let (base, server) = test_server::serve(vec![(200, body.to_string())]).await;
        let client = ApiClient::new(base, None);

        let filters = LawyerSearch {
            specialization: Some("commercial law".to_string()),
            max_price: Some(400),
            ..Default::default()
        };
        // Runs on a spawned task, as the TUI backend does.
        let lawyers = tokio::spawn(async move { search_lawyers_data(&client, &filters).await })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lawyers.len(), 1);
        assert_eq!(lawyers[0].price, 300.0);

        let requests = server.await.unwrap();
        assert!(requests[0]
            .starts_with("GET /api/search/lawyers?specialization=commercial+law&max_price=400 "));
    }
}

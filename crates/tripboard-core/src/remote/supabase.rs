//! Trip documents stored in a Supabase `trips` table, over the PostgREST API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};

use super::{RemoteDocumentClient, RemoteTrip};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::models::{Accommodation, TripDetails, TripId, TripSnapshot};
use crate::util::compact_text;

const TRIPS_PATH: &str = "/rest/v1/trips";

/// Remote document client for the hosted `trips` table
#[derive(Clone)]
pub struct SupabaseTripClient {
    endpoint: String,
    anon_key: String,
    client: Client,
}

impl SupabaseTripClient {
    /// Build a client from connection credentials.
    ///
    /// Fails with `NotConfigured` when credentials are missing.
    pub fn new(connection: &ConnectionConfig) -> Result<Self> {
        let (url, anon_key) = connection.credentials()?;
        let client = Client::builder()
            .build()
            .map_err(|error| Error::RemoteUnavailable(error.to_string()))?;
        Ok(Self {
            endpoint: format!("{}{TRIPS_PATH}", url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Accept", "application/json")
    }

    fn by_id(&self, request: RequestBuilder, trip_id: &TripId) -> RequestBuilder {
        request.query(&[("id", format!("eq.{trip_id}"))])
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|error| Error::RemoteUnavailable(error.to_string()))
    }

    async fn single_row(response: Response, trip_id: Option<&TripId>) -> Result<RemoteTrip> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, trip_id));
        }

        let body = response
            .text()
            .await
            .map_err(|error| Error::RemoteUnavailable(error.to_string()))?;
        let rows = decode_rows(&body)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            trip_id.map_or_else(
                || Error::RemoteUnavailable("store returned no trip row".to_string()),
                |trip_id| Error::NotFound(trip_id.to_string()),
            )
        })?;
        row.try_into()
    }
}

#[async_trait]
impl RemoteDocumentClient for SupabaseTripClient {
    async fn create(&self, snapshot: &TripSnapshot) -> Result<RemoteTrip> {
        let request = self
            .authorized(self.client.post(&self.endpoint))
            .header("Prefer", "return=representation")
            .json(&TripWrite::new(snapshot, None));
        let remote = Self::single_row(Self::send(request).await?, None).await?;
        tracing::info!(trip_id = %remote.id, "Created trip document");
        Ok(remote)
    }

    async fn fetch(&self, trip_id: &TripId) -> Result<RemoteTrip> {
        let request = self
            .by_id(self.authorized(self.client.get(&self.endpoint)), trip_id)
            .query(&[("select", "*")]);
        Self::single_row(Self::send(request).await?, Some(trip_id)).await
    }

    async fn replace(&self, trip_id: &TripId, snapshot: &TripSnapshot) -> Result<RemoteTrip> {
        let request = self
            .by_id(self.authorized(self.client.patch(&self.endpoint)), trip_id)
            .header("Prefer", "return=representation")
            .json(&TripWrite::new(snapshot, Some(Utc::now())));
        Self::single_row(Self::send(request).await?, Some(trip_id)).await
    }
}

/// Request body for insert and update
#[derive(Debug, Serialize)]
struct TripWrite<'a> {
    places: &'a [Accommodation],
    trip_details: Option<&'a TripDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl<'a> TripWrite<'a> {
    fn new(snapshot: &'a TripSnapshot, updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            places: &snapshot.items,
            trip_details: snapshot.details.as_ref(),
            updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TripRow {
    #[serde(deserialize_with = "id_from_string_or_number")]
    id: String,
    #[serde(default)]
    places: Option<Vec<Accommodation>>,
    #[serde(default)]
    trip_details: Option<TripDetails>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<TripRow> for RemoteTrip {
    type Error = Error;

    fn try_from(row: TripRow) -> Result<Self> {
        Ok(Self {
            id: TripId::new(row.id)?,
            snapshot: TripSnapshot {
                items: row.places.unwrap_or_default(),
                details: row.trip_details,
            },
            updated_at: row.updated_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Rows that answer but do not decode are a data problem, not an outage.
fn decode_rows(body: &str) -> Result<Vec<TripRow>> {
    serde_json::from_str(body).map_err(|error| Error::MalformedDocument(error.to_string()))
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    error: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return match payload.hint {
                Some(hint) => format!("{} ({}; {})", message.trim(), status.as_u16(), hint),
                None => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

/// Map a failed response to a domain error.
///
/// A malformed id makes PostgREST answer 400, which is a lookup miss for us.
fn status_error(status: StatusCode, body: &str, trip_id: Option<&TripId>) -> Error {
    let message = parse_api_error(status, body);
    match (trip_id, status) {
        (
            Some(trip_id),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE,
        ) => {
            tracing::debug!(%trip_id, %message, "Trip lookup rejected");
            Error::NotFound(trip_id.to_string())
        }
        (_, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            Error::RemoteUnavailable(format!("access denied: {message}"))
        }
        _ => Error::RemoteUnavailable(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccommodationDraft, Origin};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_client_requires_credentials() {
        assert!(matches!(
            SupabaseTripClient::new(&ConnectionConfig::default()),
            Err(Error::NotConfigured)
        ));

        let client =
            SupabaseTripClient::new(&ConnectionConfig::new("https://p.supabase.co/", "anon"))
                .unwrap();
        assert_eq!(client.endpoint(), "https://p.supabase.co/rest/v1/trips");
    }

    #[test]
    fn test_row_parses_numeric_id_and_missing_fields() {
        let rows: Vec<TripRow> = serde_json::from_str(
            r#"[{"id": 42, "places": null, "trip_details": null,
                 "updated_at": "2025-01-05T10:00:00.123456+00:00"}]"#,
        )
        .unwrap();
        let remote = RemoteTrip::try_from(rows.into_iter().next().unwrap()).unwrap();
        assert_eq!(remote.id.as_str(), "42");
        assert!(remote.snapshot.items.is_empty());
        assert_eq!(remote.snapshot.details, None);
    }

    #[test]
    fn test_row_parses_stored_places() {
        let row: TripRow = serde_json::from_str(
            r#"{"id": "abc123",
                "places": [{"id": "0b7a3c52-3d2f-4b8e-9d1a-2f4d6a8c9e10",
                            "name": "Seaside Hut", "price": 1500,
                            "locationLink": "https://maps.example/hut",
                            "images": [], "votes": 2, "addedBy": "ai"}],
                "trip_details": {"budget": "2000", "people": "6", "style": "beachfront"}}"#,
        )
        .unwrap();
        let remote = RemoteTrip::try_from(row).unwrap();
        let item = &remote.snapshot.items[0];
        assert_eq!(item.price, "1500");
        assert_eq!(item.location_link, "https://maps.example/hut");
        assert_eq!(item.added_by, Origin::Ai);
        assert_eq!(remote.snapshot.details.unwrap().people, "6");
    }

    #[test]
    fn test_row_keeps_item_ids_written_by_other_clients() {
        let rows = decode_rows(
            r#"[{"id": "abc123",
                 "places": [{"id": "p-1700000000000", "name": "Baan Suan", "votes": 1}],
                 "trip_details": null}]"#,
        )
        .unwrap();
        let remote = RemoteTrip::try_from(rows.into_iter().next().unwrap()).unwrap();
        let item = &remote.snapshot.items[0];
        assert_eq!(item.id.as_str(), "p-1700000000000");
        assert_eq!(item.name, "Baan Suan");

        let body = serde_json::to_value(TripWrite::new(&remote.snapshot, None)).unwrap();
        assert_eq!(body["places"][0]["id"], "p-1700000000000");
    }

    #[test]
    fn test_undecodable_rows_are_malformed_not_unavailable() {
        let err = decode_rows(r#"[{"id": "abc123", "places": [{"name": "No id"}]}]"#)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
        assert!(!err.is_transient());

        assert!(matches!(
            decode_rows("<html>gateway</html>"),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_write_body_uses_document_column_names() {
        let item = AccommodationDraft::named("Seaside Hut")
            .with_price("1500")
            .into_accommodation(Origin::User)
            .unwrap();
        let snapshot = TripSnapshot {
            items: vec![item],
            details: None,
        };
        let body = serde_json::to_value(TripWrite::new(&snapshot, None)).unwrap();
        assert_eq!(body["places"][0]["name"], "Seaside Hut");
        assert_eq!(body["places"][0]["addedBy"], "user");
        assert!(body["trip_details"].is_null());
        assert!(body.get("updated_at").is_none());
    }

    #[test]
    fn test_lookup_errors_map_to_not_found() {
        let trip_id = TripId::new("abc123").unwrap();
        assert!(matches!(
            status_error(StatusCode::NOT_ACCEPTABLE, "", Some(&trip_id)),
            Error::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "", None),
            Error::RemoteUnavailable(_)
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, "", Some(&trip_id)),
            Error::RemoteUnavailable(_)
        ));
    }

    #[test]
    fn test_parse_api_error_prefers_message() {
        let message = parse_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"message":"invalid input syntax","hint":null}"#,
        );
        assert_eq!(message, "invalid input syntax (400)");
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "  "),
            "HTTP 502"
        );
    }
}

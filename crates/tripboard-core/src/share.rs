//! Sharable links: `{base}?tripId={id}`, optionally carrying connection
//! credentials so the receiver can reach the same store.

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::models::TripId;

const TRIP_ID_PARAM: &str = "tripId";
const SUPABASE_URL_PARAM: &str = "supabaseUrl";
const SUPABASE_KEY_PARAM: &str = "supabaseKey";

/// Default address links point at when no base is given.
pub const DEFAULT_SHARE_BASE: &str = "https://tripboard.app/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub trip_id: TripId,
    /// Bundled credentials, present only when both values were included
    pub connection: Option<ConnectionConfig>,
}

impl ShareLink {
    pub const fn new(trip_id: TripId) -> Self {
        Self {
            trip_id,
            connection: None,
        }
    }

    /// Bundle credentials; incomplete ones are left out.
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = Some(connection.normalized()).filter(ConnectionConfig::is_configured);
        self
    }

    /// Render the link against a base address. Any query on the base is replaced.
    pub fn to_url(&self, base: &str) -> String {
        let base = base.split(['?', '#']).next().unwrap_or(base);
        let mut url = format!(
            "{base}?{TRIP_ID_PARAM}={}",
            urlencoding::encode(self.trip_id.as_str())
        );
        if let Some(connection) = &self.connection {
            if let Ok((supabase_url, supabase_key)) = connection.credentials() {
                url.push_str(&format!(
                    "&{SUPABASE_URL_PARAM}={}&{SUPABASE_KEY_PARAM}={}",
                    urlencoding::encode(supabase_url),
                    urlencoding::encode(supabase_key)
                ));
            }
        }
        url
    }

    /// Parse a full link or a bare trip id. Unknown parameters are ignored.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let without_fragment = input.split('#').next().unwrap_or(input);
        let Some((_, query)) = without_fragment.split_once('?') else {
            if without_fragment.contains("://") {
                return Err(Error::InvalidInput(format!(
                    "Link has no {TRIP_ID_PARAM} parameter: {input}"
                )));
            }
            return Ok(Self::new(TripId::new(without_fragment)?));
        };

        let mut trip_id = None;
        let mut supabase_url = None;
        let mut supabase_key = None;
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_component(value)?;
            match name {
                TRIP_ID_PARAM => trip_id = Some(value),
                SUPABASE_URL_PARAM => supabase_url = Some(value),
                SUPABASE_KEY_PARAM => supabase_key = Some(value),
                _ => {}
            }
        }

        let trip_id = trip_id.ok_or_else(|| {
            Error::InvalidInput(format!("Link has no {TRIP_ID_PARAM} parameter: {input}"))
        })?;
        let link = Self::new(TripId::new(trip_id)?);
        Ok(link.with_connection(ConnectionConfig {
            supabase_url,
            supabase_anon_key: supabase_key,
        }))
    }
}

fn decode_component(value: &str) -> Result<String> {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|error| Error::InvalidInput(format!("Invalid link encoding: {error}")))
}

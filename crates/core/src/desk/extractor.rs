//! Ticket listing retrieval.

use reqwest::header::COOKIE;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::filter::FilterSpec;

use super::http::{desk_url, DeskHttp, LISTING_PATH};
use super::listing::extract_tickets;
use super::{transport_error, DeskError, SessionToken, TicketRecord};

/// Fetches the authenticated listing page and turns it into tickets.
#[derive(Clone)]
pub struct TicketExtractor {
    http: DeskHttp,
}

impl TicketExtractor {
    pub fn new(http: DeskHttp) -> Self {
        Self { http }
    }

    /// Fetch the listing page and return the tickets matching `filter`.
    ///
    /// A redirect or 401/403 means the session was refused and yields
    /// [`DeskError::SessionRejected`]. A page without tickets is an empty list.
    pub async fn list_tickets(
        &self,
        base_url: &str,
        session: &SessionToken,
        filter: &FilterSpec,
    ) -> Result<Vec<TicketRecord>, DeskError> {
        let url = desk_url(base_url, LISTING_PATH);

        debug!(url = %url, "Fetching ticket listing");
        let response = self
            .http
            .direct()
            .get(&url)
            .header(COOKIE, session.as_str())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_redirection()
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
        {
            warn!(status = %status, "Help desk refused the session");
            return Err(DeskError::SessionRejected);
        }
        if !status.is_success() {
            return Err(DeskError::Http(format!("HTTP {}", status)));
        }

        let html = response.text().await.map_err(transport_error)?;
        let tickets = extract_tickets(&html, filter);

        debug!(tickets = tickets.len(), "Ticket listing parsed");
        Ok(tickets)
    }
}

//! Help desk scraping.
//!
//! The help desk offers no API, so this module drives its admin web pages:
//! `SessionAuthenticator` logs in through the HTML form, `TicketExtractor`
//! reads the ticket listing, `ConnectionTester` validates credentials, and
//! `HelpdeskClient` ties them together behind a session cache.

mod cache;
mod client;
mod extractor;
mod http;
mod listing;
mod probe;
mod session;
mod types;

pub use cache::{SessionCache, SessionKey, SessionLease};
pub use client::HelpdeskClient;
pub use extractor::TicketExtractor;
pub use http::{collect_cookies, desk_url, DeskHttp, LISTING_PATH, LOGIN_PATH};
pub use listing::{
    extract_tickets, parse_listing_page, NO_SUBJECT, UNDEFINED_PRIORITY, UNKNOWN_PRIORITY_CODE,
    UNKNOWN_STATUS,
};
pub use probe::{ConnectionTester, ADMIN_UNREACHABLE, FAILURE_MESSAGE, SUCCESS_MESSAGE};
pub use session::{
    contains_failure_marker, extract_csrf_token, SessionAuthenticator, LOGIN_FAILURE_MARKERS,
};
pub use types::*;

//! HTTP plumbing shared by the scraper components.

use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::{redirect, Client};

use crate::config::HttpConfig;

use super::{transport_error, DeskError};

/// Path of the login form, relative to the help desk base URL.
pub const LOGIN_PATH: &str = "/admin/index.php";
/// Path of the ticket listing, relative to the help desk base URL.
pub const LISTING_PATH: &str = "/admin/admin_main.php";

/// A pair of HTTP clients sharing the same timeouts.
///
/// `direct` never follows redirects: a redirect on the login POST or on the
/// listing page is evidence about the session. `following` is used where the
/// help desk may legitimately bounce the request around.
#[derive(Clone)]
pub struct DeskHttp {
    direct: Client,
    following: Client,
}

impl DeskHttp {
    pub fn new(config: &HttpConfig) -> Result<Self, DeskError> {
        let build = |policy: redirect::Policy| {
            Client::builder()
                .connect_timeout(config.connect_timeout())
                .timeout(config.timeout())
                .user_agent(config.user_agent.clone())
                .redirect(policy)
                .build()
                .map_err(transport_error)
        };

        Ok(Self {
            direct: build(redirect::Policy::none())?,
            following: build(redirect::Policy::limited(config.max_redirects))?,
        })
    }

    pub fn direct(&self) -> &Client {
        &self.direct
    }

    pub fn following(&self) -> &Client {
        &self.following
    }
}

/// Build a help desk URL from a base URL and an absolute path.
pub fn desk_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Collect `Set-Cookie` headers as a `Cookie` header value.
///
/// Only the `name=value` pair of each cookie is kept; attributes such as
/// `path` or `HttpOnly` are dropped. Returns `None` when no cookie was set.
pub fn collect_cookies(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

//! Login handshake against the help desk's HTML form.

use once_cell::sync::Lazy;
use reqwest::header::COOKIE;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::http::{collect_cookies, desk_url, DeskHttp, LOGIN_PATH};
use super::{transport_error, DeskError, SessionToken};

/// Substrings the login page shows when credentials are refused.
pub const LOGIN_FAILURE_MARKERS: [&str; 4] = [
    "Wrong username or password",
    "Nom d'utilisateur ou mot de passe incorrect",
    "Identifiant ou mot de passe incorrect",
    "Mauvais nom d'utilisateur ou mot de passe",
];

static CSRF_INPUT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"input[name="token"]"#).expect("valid selector"));

/// Performs the two-step form login and returns the session cookies.
#[derive(Clone)]
pub struct SessionAuthenticator {
    http: DeskHttp,
}

impl SessionAuthenticator {
    pub fn new(http: DeskHttp) -> Self {
        Self { http }
    }

    /// Log in and return the session cookies.
    ///
    /// 1. GET the login form, keeping its pre-session cookies and CSRF token.
    /// 2. POST the form without following redirects.
    /// 3. Succeed only if cookies were set and no failure marker is present.
    pub async fn login(
        &self,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<SessionToken, DeskError> {
        let login_url = desk_url(base_url, LOGIN_PATH);

        debug!(url = %login_url, "Fetching help desk login form");
        let form_page = self
            .http
            .following()
            .get(&login_url)
            .send()
            .await
            .map_err(transport_error)?;
        let pre_session = collect_cookies(form_page.headers());
        let form_html = form_page.text().await.map_err(transport_error)?;
        let csrf_token = extract_csrf_token(&form_html);

        let mut params = vec![
            ("user", username),
            ("pass", password),
            ("remember", "CHECKED"),
            ("a", "do_login"),
        ];
        if let Some(token) = csrf_token.as_deref() {
            params.push(("token", token));
        }

        debug!(
            csrf = csrf_token.is_some(),
            pre_session = pre_session.is_some(),
            "Submitting help desk login"
        );
        let mut request = self.http.direct().post(&login_url).form(&params);
        if let Some(cookies) = pre_session {
            request = request.header(COOKIE, cookies);
        }
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        let cookies = collect_cookies(response.headers());
        let body = response.text().await.map_err(transport_error)?;

        match cookies {
            Some(cookies) if !contains_failure_marker(&body) => {
                debug!(status = %status, "Help desk login accepted");
                Ok(SessionToken::new(cookies))
            }
            Some(_) => {
                warn!(username = username, "Help desk rejected credentials");
                Err(DeskError::InvalidCredentials)
            }
            None => {
                warn!(
                    username = username,
                    status = %status,
                    "Help desk login set no session cookie"
                );
                Err(DeskError::InvalidCredentials)
            }
        }
    }
}

/// Value of the hidden `token` input, if the form carries one.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    Html::parse_document(html)
        .select(&CSRF_INPUT)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}

/// Whether a login response contains one of the known rejection messages.
pub fn contains_failure_marker(body: &str) -> bool {
    LOGIN_FAILURE_MARKERS
        .iter()
        .any(|marker| body.contains(marker))
}

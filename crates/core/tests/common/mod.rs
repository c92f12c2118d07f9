//! In-process fake help desk for integration tests.
//!
//! Serves the three pages the scraper touches, with the same markup contract
//! and session behavior as the real admin interface:
//! - `GET /admin/index.php`: login form, sets a pre-session cookie
//! - `POST /admin/index.php`: login, redirects with session cookies on success
//! - `GET /admin/admin_main.php`: ticket listing, redirects to the login page
//!   when the session is unknown

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Form, State};
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, Response, StatusCode};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

pub const USERNAME: &str = "agent";
pub const PASSWORD: &str = "s3cret";
pub const CSRF_TOKEN: &str = "csrf-f00dcafe";
pub const PRE_SESSION_COOKIE: &str = "PHPSESSID=pre-session";

/// Behavior knobs for the fake help desk.
#[derive(Debug, Clone)]
pub struct FakeDeskOptions {
    /// CSRF token embedded in the login form, if any.
    pub csrf_token: Option<String>,
    /// Message shown when the login is refused.
    pub failure_marker: String,
    /// Whether a successful login sets session cookies.
    pub set_cookie_on_login: bool,
    /// Whether the listing page honors issued sessions.
    pub accept_sessions: bool,
    /// Listing page body served to authenticated requests.
    pub listing_html: String,
    /// Delay before answering the listing page.
    pub listing_delay: Option<Duration>,
}

impl Default for FakeDeskOptions {
    fn default() -> Self {
        Self {
            csrf_token: Some(CSRF_TOKEN.to_string()),
            failure_marker: "Wrong username or password".to_string(),
            set_cookie_on_login: true,
            accept_sessions: true,
            listing_html: listing_page(&[
                TicketRow::new("100", "Nouveau", "Haute", "3", "A1"),
                TicketRow::new("101", "Résolu", "Basse", "1", "B2"),
            ]),
            listing_delay: None,
        }
    }
}

/// What the fake received on its last login POST.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub form: HashMap<String, String>,
    pub cookie: Option<String>,
}

struct DeskState {
    options: FakeDeskOptions,
    login_attempts: AtomicUsize,
    logins: AtomicUsize,
    listing_hits: AtomicUsize,
    sessions: Mutex<HashSet<String>>,
    last_login: Mutex<Option<LoginAttempt>>,
}

/// A running fake help desk bound to a random local port.
pub struct FakeDesk {
    pub base_url: String,
    state: Arc<DeskState>,
}

impl FakeDesk {
    pub async fn start() -> Self {
        Self::with_options(FakeDeskOptions::default()).await
    }

    pub async fn with_options(options: FakeDeskOptions) -> Self {
        let state = Arc::new(DeskState {
            options,
            login_attempts: AtomicUsize::new(0),
            logins: AtomicUsize::new(0),
            listing_hits: AtomicUsize::new(0),
            sessions: Mutex::new(HashSet::new()),
            last_login: Mutex::new(None),
        });

        let app = Router::new()
            .route("/admin/index.php", get(login_form).post(do_login))
            .route("/admin/admin_main.php", get(listing))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Successful logins so far.
    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    /// Login POSTs so far, successful or not.
    pub fn login_attempts(&self) -> usize {
        self.state.login_attempts.load(Ordering::SeqCst)
    }

    pub fn listing_hits(&self) -> usize {
        self.state.listing_hits.load(Ordering::SeqCst)
    }

    pub fn last_login(&self) -> Option<LoginAttempt> {
        self.state.last_login.lock().unwrap().clone()
    }

    /// Forget every issued session, as a server-side expiry would.
    pub fn revoke_sessions(&self) {
        self.state.sessions.lock().unwrap().clear();
    }
}

/// One row of the synthetic listing page.
pub struct TicketRow {
    pub id: String,
    pub status: String,
    pub priority: String,
    pub priority_code: String,
    pub room: String,
}

impl TicketRow {
    pub fn new(id: &str, status: &str, priority: &str, priority_code: &str, room: &str) -> Self {
        Self {
            id: id.to_string(),
            status: status.to_string(),
            priority: priority.to_string(),
            priority_code: priority_code.to_string(),
            room: room.to_string(),
        }
    }
}

/// Render a listing page in the help desk's markup.
pub fn listing_page(rows: &[TicketRow]) -> String {
    let rows: Vec<String> = rows
        .iter()
        .map(|r| {
            format!(
                r#"<tr>
  <td><input type="checkbox" name="id[]" value="{id}"></td>
  <td>{id}</td>
  <td>2024-03-01 10:00</td>
  <td>Alice Martin</td>
  <td><a class="link" href="admin_ticket.php?track={id}">Demande {id}</a></td>
  <td><span class="status">{status}</span></td>
  <td>{room}</td>
  <td><div class="dropdown priority" data-value="{code}"><div class="label"><span>{priority}</span></div></div></td>
</tr>"#,
                id = r.id,
                status = r.status,
                room = r.room,
                code = r.priority_code,
                priority = r.priority,
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html><head><title>Tickets</title></head>
<body>
<table class="table ticket-list">
<thead><tr><th></th><th>ID</th><th>Mis à jour</th><th>Nom</th><th>Sujet</th><th>Statut</th><th>Salle</th><th>Priorité</th></tr></thead>
<tbody>
{}
</tbody>
</table>
</body></html>"#,
        rows.join("\n")
    )
}

fn login_form_html(csrf_token: Option<&str>) -> String {
    let token = csrf_token
        .map(|t| format!(r#"<input type="hidden" name="token" value="{}">"#, t))
        .unwrap_or_default();
    format!(
        r#"<html><body><form action="index.php" method="post">
<input type="text" name="user"><input type="password" name="pass">
<input type="hidden" name="a" value="do_login">{}
</form></body></html>"#,
        token
    )
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("PHPSESSID="))
        .map(str::to_string)
}

async fn login_form(State(state): State<Arc<DeskState>>) -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(SET_COOKIE, format!("{}; path=/", PRE_SESSION_COOKIE))
        .body(Body::from(login_form_html(
            state.options.csrf_token.as_deref(),
        )))
        .unwrap()
}

async fn do_login(
    State(state): State<Arc<DeskState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response<Body> {
    state.login_attempts.fetch_add(1, Ordering::SeqCst);
    let cookie = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.last_login.lock().unwrap() = Some(LoginAttempt {
        form: form.clone(),
        cookie: cookie.clone(),
    });

    let field = |name: &str| form.get(name).map(String::as_str);
    let pre_session_ok = cookie
        .as_deref()
        .is_some_and(|c| c.contains(PRE_SESSION_COOKIE));
    let token_ok = field("token") == state.options.csrf_token.as_deref();
    let form_ok = field("user") == Some(USERNAME)
        && field("pass") == Some(PASSWORD)
        && field("remember") == Some("CHECKED")
        && field("a") == Some("do_login");

    if !(pre_session_ok && token_ok && form_ok) {
        return Response::builder()
            .status(StatusCode::OK)
            .header(SET_COOKIE, format!("{}; path=/", PRE_SESSION_COOKIE))
            .body(Body::from(format!(
                r#"<html><body><div class="notification red">{}</div>{}</body></html>"#,
                state.options.failure_marker,
                login_form_html(state.options.csrf_token.as_deref())
            )))
            .unwrap();
    }

    let n = state.logins.fetch_add(1, Ordering::SeqCst) + 1;
    let session = format!("sess-{}", n);
    state.sessions.lock().unwrap().insert(session.clone());

    if !state.options.set_cookie_on_login {
        return Response::builder()
            .status(StatusCode::OK)
            .body(Body::from("<html><body>Bienvenue</body></html>"))
            .unwrap();
    }

    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, "admin_main.php")
        .header(SET_COOKIE, format!("PHPSESSID={}; path=/; HttpOnly", session))
        .header(SET_COOKIE, format!("hesk_user={}; path=/", USERNAME))
        .body(Body::empty())
        .unwrap()
}

async fn listing(State(state): State<Arc<DeskState>>, headers: HeaderMap) -> Response<Body> {
    state.listing_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = state.options.listing_delay {
        tokio::time::sleep(delay).await;
    }

    let known = session_id(&headers)
        .is_some_and(|id| state.sessions.lock().unwrap().contains(&id));

    if state.options.accept_sessions && known {
        Response::builder()
            .status(StatusCode::OK)
            .body(Body::from(state.options.listing_html.clone()))
            .unwrap()
    } else {
        Response::builder()
            .status(StatusCode::FOUND)
            .header(LOCATION, "index.php?a=login&notice=1")
            .body(Body::empty())
            .unwrap()
    }
}

/// A base URL nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

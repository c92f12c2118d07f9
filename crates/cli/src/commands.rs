//! Subcommand implementations.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};

use ticketboard_core::{
    Config, ConnectionTester, Credential, CredentialVault, DeskHttp, FilterSpec, HelpdeskClient,
    SanitizedConfig, SessionAuthenticator, TargetConfig,
};

fn vault(config: &Config) -> Result<Arc<CredentialVault>> {
    let vault = CredentialVault::from_config(&config.vault).context(
        "No encryption secret: set vault.secret or the ENCRYPTION_KEY environment variable",
    )?;
    Ok(Arc::new(vault))
}

fn client(config: &Config) -> Result<HelpdeskClient> {
    HelpdeskClient::new(&config.http, &config.session, vault(config)?)
        .context("Failed to create help desk client")
}

fn target(config: &Config) -> Result<&TargetConfig> {
    config
        .target
        .as_ref()
        .ok_or_else(|| anyhow!("No [target] section configured"))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

pub fn encrypt(config: &Config, password: &str) -> Result<ExitCode> {
    let encrypted = vault(config)?
        .encrypt(password)
        .context("Failed to encrypt password")?;
    println!("{}", encrypted);
    Ok(ExitCode::SUCCESS)
}

pub async fn test(
    config: &Config,
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Result<ExitCode> {
    let http = DeskHttp::new(&config.http).context("Failed to create HTTP clients")?;
    let tester = ConnectionTester::new(SessionAuthenticator::new(http.clone()), http);

    let (url, username, password) = match (url, username, password) {
        (Some(url), Some(username), Some(password)) => (url, username, password),
        (url, username, password) => {
            let target = target(config)
                .context("Pass --url, --username and --password or configure a target")?;
            let password = match password {
                Some(password) => password,
                None => vault(config)?
                    .decrypt(&target.password)
                    .context("Failed to decrypt target.password")?,
            };
            (
                url.unwrap_or_else(|| target.url.clone()),
                username.unwrap_or_else(|| target.username.clone()),
                password,
            )
        }
    };

    info!(url = %url, "Testing help desk connection");
    let result = tester.test(&url, &username, &password).await;
    print_json(&result, true)?;

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn tickets(
    config: &Config,
    status: Vec<String>,
    priority: Vec<String>,
    room: Vec<String>,
    watch: Option<u64>,
) -> Result<ExitCode> {
    let target = target(config)?;
    let client = client(config)?;
    let credential = Credential::new(&target.url, &target.username, &target.password);

    let overrides = FilterSpec {
        status: non_empty(status),
        priority: non_empty(priority),
        room: non_empty(room),
    };
    let filter = if overrides.is_empty() {
        target.filters.clone()
    } else {
        overrides
    };

    let Some(secs) = watch else {
        let batch = client
            .fetch_tickets(&credential, &filter)
            .await
            .context("Failed to fetch tickets")?;
        print_json(&batch, true)?;
        return Ok(ExitCode::SUCCESS);
    };

    if secs == 0 {
        return Err(anyhow!("--watch interval must be at least 1 second"));
    }

    info!(interval_secs = secs, "Watching help desk tickets");
    let mut interval = tokio::time::interval(Duration::from_secs(secs));
    let interrupted = signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        let result = tokio::select! {
            result = async {
                interval.tick().await;
                client.fetch_tickets(&credential, &filter).await
            } => result,
            _ = &mut interrupted => {
                info!("Interrupted, stopping watch");
                return Ok(ExitCode::SUCCESS);
            }
        };

        match result {
            Ok(batch) => {
                info!(tickets = batch.tickets.len(), "Tickets refreshed");
                print_json(&batch, false)?;
            }
            Err(e) if e.is_retryable() || e.is_auth() => {
                warn!(error = %e, "Ticket refresh failed, retrying next tick");
            }
            Err(e) => return Err(e).context("Failed to fetch tickets"),
        }
    }
}

pub fn show_config(config: &Config) -> Result<ExitCode> {
    print_json(&SanitizedConfig::from(config), true)?;
    Ok(ExitCode::SUCCESS)
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

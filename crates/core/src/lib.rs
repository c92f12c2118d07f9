pub mod config;
pub mod desk;
pub mod filter;
pub mod vault;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, HttpConfig, SanitizedConfig, SessionConfig, TargetConfig, VaultConfig,
};
pub use desk::{
    ConnectionTestResult, ConnectionTester, Credential, DeskError, DeskHttp, HelpdeskClient,
    SessionAuthenticator, SessionCache, SessionKey, SessionToken, TicketBatch, TicketExtractor,
    TicketRecord,
};
pub use filter::FilterSpec;
pub use vault::{CredentialVault, CryptoError};

//! Server configuration.
//!
//! All configuration comes from environment variables (a `.env` file is loaded at startup if present):
//!
//! * `PRS_HOST`: The interface to bind to. Default: `127.0.0.1`.
//! * `PRS_PORT`: The port to listen on. Default: `8480`.
//! * `PRS_DATABASE_URL`: The sqlite database url, e.g. `sqlite://data/recon_store.db`.
//! * `PRS_WEBHOOK_SECRET`: The shared secret for verifying webhook signatures.
//! * `PRS_SIGNATURE_HEADER`: The header carrying the HMAC signature. Default: `x-webhook-signature`.
//! * `PRS_DISABLE_HMAC_CHECKS`: Set to `1` or `true` to skip signature checks. Local development only.
//! * `PRS_EVENT_DEADLINE`: Maximum seconds a single delivery may spend in reconciliation. Default: 10.

use std::{env, time::Duration};

use log::*;

use crate::secret::Secret;

const DEFAULT_PRS_HOST: &str = "127.0.0.1";
const DEFAULT_PRS_PORT: u16 = 8480;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/recon_store.db";
const DEFAULT_SIGNATURE_HEADER: &str = "x-webhook-signature";
const DEFAULT_EVENT_DEADLINE: Duration = Duration::from_secs(10);

/// Header carrying the processor's delivery id for deduplication. Optional on every request.
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Upper bound on how long a single delivery may spend in reconciliation before the server gives up and
    /// acknowledges it with a failure message.
    pub event_deadline: Duration,
    pub webhook: WebhookAuthConfig,
}

#[derive(Clone, Debug)]
pub struct WebhookAuthConfig {
    /// The shared secret the payment processor signs each delivery body with.
    pub hmac_secret: Secret<String>,
    /// If false, the signature check is skipped and every delivery is accepted. **DANGER**
    pub hmac_checks: bool,
    pub signature_header: String,
}

impl Default for WebhookAuthConfig {
    fn default() -> Self {
        Self {
            hmac_secret: Secret::default(),
            hmac_checks: true,
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PRS_HOST.to_string(),
            port: DEFAULT_PRS_PORT,
            database_url: String::default(),
            event_deadline: DEFAULT_EVENT_DEADLINE,
            webhook: WebhookAuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PRS_HOST").ok().unwrap_or_else(|| DEFAULT_PRS_HOST.into());
        let port = env::var("PRS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PRS_PORT. {e} Using the default, {DEFAULT_PRS_PORT}, instead."
                    );
                    DEFAULT_PRS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PRS_PORT);
        let database_url = env::var("PRS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ PRS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}, instead.");
            DEFAULT_DATABASE_URL.into()
        });
        let event_deadline = env::var("PRS_EVENT_DEADLINE")
            .map(|s| {
                s.parse::<u64>().map(Duration::from_secs).unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid number of seconds for PRS_EVENT_DEADLINE. {e} Using the default \
                         instead."
                    );
                    DEFAULT_EVENT_DEADLINE
                })
            })
            .ok()
            .unwrap_or(DEFAULT_EVENT_DEADLINE);
        Self { host, port, database_url, event_deadline, webhook: WebhookAuthConfig::from_env_or_default() }
    }
}

impl WebhookAuthConfig {
    pub fn from_env_or_default() -> Self {
        let hmac_secret = env::var("PRS_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ PRS_WEBHOOK_SECRET is not set. Webhook signatures cannot be verified without the shared secret \
                 configured on the payment processor, so every signed delivery will be rejected."
            );
            String::default()
        });
        let hmac_secret = Secret::new(hmac_secret);
        let hmac_checks = env::var("PRS_DISABLE_HMAC_CHECKS").map(|s| !(&s == "1" || &s == "true")).unwrap_or(true);
        if !hmac_checks {
            warn!("🪛️ Webhook HMAC checks are disabled. This must never be the case in production.");
        }
        let signature_header =
            env::var("PRS_SIGNATURE_HEADER").ok().unwrap_or_else(|| DEFAULT_SIGNATURE_HEADER.into());
        Self { hmac_secret, hmac_checks, signature_header }
    }
}

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// FirebaseConfig
// ---------------------------------------------------------------------------

/// Connection parameters of the Firebase project backing the dashboard.
///
/// Only `api_key` and `database_url` are needed by the service itself; the
/// remaining identifiers are carried so the full project descriptor can be
/// supplied from one `.env` file and surfaced in logs.
#[derive(Clone)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: Option<String>,
    /// Realtime Database root, e.g. `https://my-project-default-rtdb.firebaseio.com`.
    /// Stored without a trailing slash.
    pub database_url: String,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub measurement_id: Option<String>,
    /// Base URL of the Identity Toolkit API. Override to target the auth emulator.
    pub auth_url: String,
    /// Base URL of the Secure Token API used for id-token refresh.
    pub token_url: String,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"<redacted>")
            .field("auth_domain", &self.auth_domain)
            .field("database_url", &self.database_url)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .field("measurement_id", &self.measurement_id)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub firebase: FirebaseConfig,
    /// Remote node holding the sensor document, e.g. `/SensorData`.
    pub sensor_path: String,
    /// Whether mounted panels keep an event log.
    pub event_log: bool,
    /// Delay before the streaming transport reconnects after a dropped stream.
    pub stream_retry_secs: u64,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        Ok(Self {
            firebase: FirebaseConfig {
                api_key: vars.required("FIREBASE_API_KEY")?,
                auth_domain: vars.optional("FIREBASE_AUTH_DOMAIN"),
                database_url: trim_url(&vars.required("FIREBASE_DATABASE_URL")?),
                project_id: vars.optional("FIREBASE_PROJECT_ID"),
                storage_bucket: vars.optional("FIREBASE_STORAGE_BUCKET"),
                messaging_sender_id: vars.optional("FIREBASE_MESSAGING_SENDER_ID"),
                app_id: vars.optional("FIREBASE_APP_ID"),
                measurement_id: vars.optional("FIREBASE_MEASUREMENT_ID"),
                auth_url: trim_url(&vars.or_default(
                    "FIREBASE_AUTH_URL",
                    "https://identitytoolkit.googleapis.com",
                )),
                token_url: trim_url(&vars.or_default(
                    "FIREBASE_TOKEN_URL",
                    "https://securetoken.googleapis.com",
                )),
            },
            sensor_path: normalize_path(&vars.or_default("SENSOR_PATH", "/SensorData"))?,
            event_log: parse_bool(&vars.or_default("EVENT_LOG", "true"))
                .context("EVENT_LOG must be a boolean (true/false/1/0)")?,
            stream_retry_secs: vars
                .or_default("STREAM_RETRY_SECS", "5")
                .parse()
                .context("STREAM_RETRY_SECS must be a positive integer")?,
            server_host: vars.or_default("SERVER_HOST", "0.0.0.0"),
            server_port: vars
                .or_default("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .with_context(|| format!("missing required env var: {key}"))
    }

    /// Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_owned())
    }
}

fn trim_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

/// Normalize a database path to `/a/b` form: one leading slash, no trailing one.
fn normalize_path(raw: &str) -> Result<String> {
    let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
    anyhow::ensure!(
        !segments.is_empty(),
        "SENSOR_PATH must name a node below the database root, got: {raw:?}"
    );
    Ok(format!("/{}", segments.join("/")))
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("not a boolean: {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("FIREBASE_API_KEY", "key-123"),
        ("FIREBASE_DATABASE_URL", "https://demo-rtdb.firebaseio.com/"),
    ];

    #[test]
    fn minimal_config_uses_defaults() {
        let c = config_from(MINIMAL).unwrap();
        assert_eq!(c.firebase.api_key, "key-123");
        assert_eq!(c.firebase.database_url, "https://demo-rtdb.firebaseio.com");
        assert_eq!(c.firebase.auth_url, "https://identitytoolkit.googleapis.com");
        assert_eq!(c.firebase.token_url, "https://securetoken.googleapis.com");
        assert!(c.firebase.measurement_id.is_none());
        assert_eq!(c.sensor_path, "/SensorData");
        assert!(c.event_log);
        assert_eq!(c.stream_retry_secs, 5);
        assert_eq!(c.server_host, "0.0.0.0");
        assert_eq!(c.server_port, 8080);
    }

    #[test]
    fn missing_api_key_errors() {
        let err = config_from(&[("FIREBASE_DATABASE_URL", "https://x")]).unwrap_err();
        assert!(err.to_string().contains("FIREBASE_API_KEY"));
    }

    #[test]
    fn blank_required_value_counts_as_missing() {
        let err = config_from(&[
            ("FIREBASE_API_KEY", "k"),
            ("FIREBASE_DATABASE_URL", "   "),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("FIREBASE_DATABASE_URL"));
    }

    #[test]
    fn optional_project_fields_are_carried() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("FIREBASE_PROJECT_ID", "demo"));
        pairs.push(("FIREBASE_MEASUREMENT_ID", "G-XYZ"));
        let c = config_from(&pairs).unwrap();
        assert_eq!(c.firebase.project_id.as_deref(), Some("demo"));
        assert_eq!(c.firebase.measurement_id.as_deref(), Some("G-XYZ"));
    }

    #[test]
    fn sensor_path_is_normalized() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("SENSOR_PATH", "home//SensorData/"));
        let c = config_from(&pairs).unwrap();
        assert_eq!(c.sensor_path, "/home/SensorData");
    }

    #[test]
    fn root_sensor_path_is_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("SENSOR_PATH", "/"));
        assert!(config_from(&pairs).is_err());
    }

    #[test]
    fn event_log_can_be_disabled() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("EVENT_LOG", "off"));
        assert!(!config_from(&pairs).unwrap().event_log);
    }

    #[test]
    fn invalid_port_errors() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("SERVER_PORT", "eighty"));
        let err = config_from(&pairs).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let c = config_from(MINIMAL).unwrap();
        let dbg = format!("{:?}", c);
        assert!(!dbg.contains("key-123"));
    }
}

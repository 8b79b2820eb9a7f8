//! Process configuration
//!
//! Variables come from the process environment, optionally seeded from an
//! env file. Values already present in the environment win over the file.
//! Every missing or malformed variable is collected and reported in one
//! error.

use config::{Config, Environment, Map};
use fsbackfill_core::{BfError, BfErrorKind};
use fsbackfill_core_types::Sensitive;
use fsbackfill_firestore::{Credentials, FirestoreSettings};
use fsbackfill_store::{parse_ssl_mode, SinkSettings, DEFAULT_MAX_CONNECTIONS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const FIREBASE_PROJECT_ID: &str = "FIREBASE_PROJECT_ID";
pub const FIREBASE_SERVICE_ACCOUNT: &str = "FIREBASE_SERVICE_ACCOUNT";
pub const FIRESTORE_EMULATOR_HOST: &str = "FIRESTORE_EMULATOR_HOST";
pub const PG_HOST: &str = "PG_HOST";
pub const PG_PORT: &str = "PG_PORT";
pub const PG_DATABASE: &str = "PG_DATABASE";
pub const PG_USER: &str = "PG_USER";
pub const PG_PASSWORD: &str = "PG_PASSWORD";
pub const PG_SSL_MODE: &str = "PG_SSL_MODE";
pub const PG_MAX_CONNECTIONS: &str = "PG_MAX_CONNECTIONS";

const KNOWN_VARS: &[&str] = &[
    FIREBASE_PROJECT_ID,
    FIREBASE_SERVICE_ACCOUNT,
    FIRESTORE_EMULATOR_HOST,
    PG_HOST,
    PG_PORT,
    PG_DATABASE,
    PG_USER,
    PG_PASSWORD,
    PG_SSL_MODE,
    PG_MAX_CONNECTIONS,
];

const DEFAULT_ENV_FILE: &str = ".env";
const DEFAULT_SSL_MODE: &str = "require";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("invalid configuration: {}", problems.join("; "))]
    Invalid { problems: Vec<String> },

    #[error("cannot assemble configuration: {0}")]
    Source(#[from] config::ConfigError),
}

impl From<ConfigError> for BfError {
    fn from(err: ConfigError) -> Self {
        let kind = match err {
            ConfigError::EnvFile { .. } => BfErrorKind::Io,
            ConfigError::Invalid { .. } | ConfigError::Source(_) => BfErrorKind::InvalidConfig,
        };
        BfError::new(kind)
            .with_op("load_config")
            .with_message(err.to_string())
    }
}

/// Everything INIT needs to build the source and sink
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub firestore: FirestoreSettings,
    /// Absent for dry runs, which never touch PostgreSQL
    pub sink: Option<SinkSettings>,
}

/// Raw variables after the `config` crate has lowercased their names
#[derive(Debug, Default, Deserialize)]
struct RawEnv {
    firebase_project_id: Option<String>,
    firebase_service_account: Option<String>,
    firestore_emulator_host: Option<String>,
    pg_host: Option<String>,
    pg_port: Option<String>,
    pg_database: Option<String>,
    pg_user: Option<String>,
    pg_password: Option<String>,
    pg_ssl_mode: Option<String>,
    pg_max_connections: Option<String>,
}

impl AppConfig {
    /// Load from the environment, seeded from `env_file` (or `./.env` when
    /// present)
    pub fn load(env_file: Option<&Path>, needs_sink: bool) -> Result<Self, ConfigError> {
        let file_vars = match env_file {
            Some(path) => read_env_file(path)?,
            None => match read_env_file(Path::new(DEFAULT_ENV_FILE)) {
                Err(ConfigError::EnvFile { source, .. }) if source.not_found() => Map::new(),
                other => other?,
            },
        };
        let vars = overlay(file_vars, std::env::vars());
        Self::from_vars(vars, needs_sink)
    }

    pub fn from_vars(vars: Map<String, String>, needs_sink: bool) -> Result<Self, ConfigError> {
        let raw: RawEnv = Config::builder()
            .add_source(Environment::default().source(Some(vars)))
            .build()?
            .try_deserialize()?;

        let mut problems = Vec::new();
        let firestore = firestore_settings(&raw, &mut problems);
        let sink = if needs_sink {
            sink_settings(&raw, &mut problems)
        } else {
            None
        };

        match firestore {
            Some(firestore) if problems.is_empty() => Ok(Self { firestore, sink }),
            _ => Err(ConfigError::Invalid { problems }),
        }
    }
}

fn firestore_settings(raw: &RawEnv, problems: &mut Vec<String>) -> Option<FirestoreSettings> {
    let project_id = required(&raw.firebase_project_id, FIREBASE_PROJECT_ID, problems);
    let credentials = match present(&raw.firestore_emulator_host) {
        Some(host) => Some(Credentials::Emulator {
            host: host.to_string(),
        }),
        None => required(&raw.firebase_service_account, FIREBASE_SERVICE_ACCOUNT, problems)
            .map(|path| Credentials::ServiceAccountFile(PathBuf::from(path))),
    };

    Some(FirestoreSettings {
        project_id: project_id?,
        credentials: credentials?,
    })
}

fn sink_settings(raw: &RawEnv, problems: &mut Vec<String>) -> Option<SinkSettings> {
    let host = required(&raw.pg_host, PG_HOST, problems);
    let port = required(&raw.pg_port, PG_PORT, problems).and_then(|p| {
        p.parse::<u16>()
            .map_err(|_| problems.push(format!("{PG_PORT} must be a port number, got {p:?}")))
            .ok()
    });
    let database = required(&raw.pg_database, PG_DATABASE, problems);
    let user = required(&raw.pg_user, PG_USER, problems);
    let password = required(&raw.pg_password, PG_PASSWORD, problems);

    let ssl_raw = present(&raw.pg_ssl_mode).unwrap_or(DEFAULT_SSL_MODE);
    let ssl_mode = parse_ssl_mode(ssl_raw)
        .map_err(|_| {
            problems.push(format!(
                "{PG_SSL_MODE} must be one of disable, allow, prefer, require, verify-ca, verify-full; got {ssl_raw:?}"
            ))
        })
        .ok();

    let max_connections = match present(&raw.pg_max_connections) {
        None => Some(DEFAULT_MAX_CONNECTIONS),
        Some(n) => match n.parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                problems.push(format!(
                    "{PG_MAX_CONNECTIONS} must be a positive integer, got {n:?}"
                ));
                None
            }
        },
    };

    Some(SinkSettings {
        host: host?,
        port: port?,
        database: database?,
        user: user?,
        password: Sensitive::new(password?),
        ssl_mode: ssl_mode?,
        max_connections: max_connections?,
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, name: &str, problems: &mut Vec<String>) -> Option<String> {
    let found = present(value).map(str::to_string);
    if found.is_none() {
        problems.push(format!("{name} is not set"));
    }
    found
}

/// Known variables from an env file; other keys are ignored
pub fn read_env_file(path: &Path) -> Result<Map<String, String>, ConfigError> {
    let env_file_error = |source| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let mut vars = Map::new();
    for item in dotenvy::from_path_iter(path).map_err(env_file_error)? {
        let (key, value) = item.map_err(env_file_error)?;
        if KNOWN_VARS.contains(&key.as_str()) {
            vars.insert(key, value);
        }
    }
    Ok(vars)
}

/// Layer process variables over file variables
pub fn overlay(
    mut file_vars: Map<String, String>,
    process: impl IntoIterator<Item = (String, String)>,
) -> Map<String, String> {
    for (key, value) in process {
        if KNOWN_VARS.contains(&key.as_str()) {
            file_vars.insert(key, value);
        }
    }
    file_vars
}

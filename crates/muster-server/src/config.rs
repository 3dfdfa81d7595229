use anyhow::Result;
use muster_core::reconcile::ReconcilePolicy;
use muster_models::snapshot::IdentityKeys;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;

fn harden_secret_file_permissions(path: &str) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_engine")]
    pub engine: DatabaseEngine,
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Statement timeout in seconds for PostgreSQL connections (0 = disabled).
    #[serde(default)]
    pub statement_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    #[default]
    Sqlite,
    Postgres,
}

impl From<DatabaseEngine> for muster_db::DatabaseEngine {
    fn from(engine: DatabaseEngine) -> Self {
        match engine {
            DatabaseEngine::Sqlite => muster_db::DatabaseEngine::Sqlite,
            DatabaseEngine::Postgres => muster_db::DatabaseEngine::Postgres,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: default_database_engine(),
            url: "sqlite://./data/muster.db?mode=rwc".into(),
            max_connections: default_max_connections(),
            statement_timeout_secs: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: generate_random_hex(32),
        }
    }
}

/// How stored audit snapshots are interpreted.
#[derive(Debug, Deserialize, Serialize)]
pub struct AuditConfig {
    #[serde(default = "default_metadata_key")]
    pub metadata_key: String,
    #[serde(default = "default_status_field")]
    pub status_field: String,
    #[serde(default = "default_first_name_keys")]
    pub first_name_keys: Vec<String>,
    #[serde(default = "default_last_name_keys")]
    pub last_name_keys: Vec<String>,
    #[serde(default = "default_organization_keys")]
    pub organization_keys: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            metadata_key: default_metadata_key(),
            status_field: default_status_field(),
            first_name_keys: default_first_name_keys(),
            last_name_keys: default_last_name_keys(),
            organization_keys: default_organization_keys(),
        }
    }
}

impl AuditConfig {
    pub fn policy(&self) -> ReconcilePolicy {
        ReconcilePolicy {
            metadata_key: self.metadata_key.clone(),
            status_field: self.status_field.clone(),
            identity: IdentityKeys {
                first_name: self.first_name_keys.clone(),
                last_name: self.last_name_keys.clone(),
                organization: self.organization_keys.clone(),
            },
        }
    }
}

fn generate_random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

fn default_database_engine() -> DatabaseEngine {
    DatabaseEngine::Sqlite
}
fn default_max_connections() -> u32 {
    10
}
fn default_metadata_key() -> String {
    ReconcilePolicy::default().metadata_key
}
fn default_status_field() -> String {
    ReconcilePolicy::default().status_field
}
fn default_first_name_keys() -> Vec<String> {
    IdentityKeys::default().first_name
}
fn default_last_name_keys() -> Vec<String> {
    IdentityKeys::default().last_name
}
fn default_organization_keys() -> Vec<String> {
    IdentityKeys::default().organization
}

fn toml_string_list(values: &[String]) -> String {
    toml::Value::from(values.to_vec()).to_string()
}

fn looks_like_placeholder_secret(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return true;
    }
    normalized.contains("change_me")
        || normalized.contains("replace_me")
        || normalized.contains("replace_with")
        || normalized.starts_with("example")
        || normalized == "secret"
}

fn validate_configuration(config: &Config) -> Result<()> {
    let jwt_secret = config.auth.jwt_secret.trim();
    if jwt_secret.len() < 32 || looks_like_placeholder_secret(jwt_secret) {
        anyhow::bail!(
            "Invalid auth.jwt_secret: use a strong random secret (at least 32 characters) and never leave placeholder values"
        );
    }
    if config.audit.metadata_key.trim().is_empty() || config.audit.status_field.trim().is_empty() {
        anyhow::bail!("Invalid audit section: metadata_key and status_field must not be empty");
    }
    Ok(())
}

/// Generate a commented config file template with the given values filled in.
fn generate_config_template(config: &Config) -> String {
    format!(
        r#"# Muster Server Configuration
# Generated automatically on first run. Edit as needed.

[server]
bind_address = "{bind_address}"

[database]
engine = "{db_engine}"
url = "{db_url}"
max_connections = {max_connections}
# statement_timeout_secs = 30

[auth]
# Shared with the auth service that issues dashboard tokens.
jwt_secret = "{jwt_secret}"

[audit]
# Key of the metadata object the write path embeds in snapshots.
metadata_key = "{metadata_key}"
# Snapshot field compared to detect status transitions.
status_field = "{status_field}"
# Snapshot keys used for the subject label, first match wins.
first_name_keys = {first_name_keys}
last_name_keys = {last_name_keys}
organization_keys = {organization_keys}
"#,
        bind_address = config.server.bind_address,
        db_engine = match config.database.engine {
            DatabaseEngine::Sqlite => "sqlite",
            DatabaseEngine::Postgres => "postgres",
        },
        db_url = config.database.url,
        max_connections = config.database.max_connections,
        jwt_secret = config.auth.jwt_secret,
        metadata_key = config.audit.metadata_key,
        status_field = config.audit.status_field,
        first_name_keys = toml_string_list(&config.audit.first_name_keys),
        last_name_keys = toml_string_list(&config.audit.last_name_keys),
        organization_keys = toml_string_list(&config.audit.organization_keys),
    )
}

// ── Config Loading ───────────────────────────────────────────────────────────

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if std::path::Path::new(path).exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::info!(
                "Config file not found at '{}', generating defaults...",
                path
            );
            let config = Config::default();

            if let Some(parent) = std::path::Path::new(path).parent() {
                fs::create_dir_all(parent)?;
            }

            let template = generate_config_template(&config);
            fs::write(path, &template)?;
            tracing::info!("Generated default config at '{}'", path);
            config
        };
        let _ = harden_secret_file_permissions(path);

        // Environment variable overrides
        if let Ok(value) = std::env::var("MUSTER_BIND_ADDRESS") {
            config.server.bind_address = value;
        }
        if let Ok(value) = std::env::var("MUSTER_DATABASE_URL") {
            config.database.url = value;
        }
        if let Ok(value) = std::env::var("MUSTER_DATABASE_ENGINE") {
            let normalized = value.trim().to_ascii_lowercase();
            match normalized.as_str() {
                "sqlite" => config.database.engine = DatabaseEngine::Sqlite,
                "postgres" | "postgresql" => config.database.engine = DatabaseEngine::Postgres,
                _ => {
                    tracing::warn!(
                        "Ignoring invalid MUSTER_DATABASE_ENGINE value '{}'; expected sqlite or postgres",
                        value
                    );
                }
            }
        }
        if let Ok(value) = std::env::var("MUSTER_DATABASE_MAX_CONNECTIONS") {
            if let Ok(parsed) = value.parse::<u32>() {
                config.database.max_connections = parsed;
            }
        }
        if let Ok(value) = std::env::var("MUSTER_DATABASE_STATEMENT_TIMEOUT_SECS") {
            if let Ok(parsed) = value.parse::<u64>() {
                config.database.statement_timeout_secs = parsed;
            }
        }
        if let Ok(value) = std::env::var("MUSTER_JWT_SECRET") {
            config.auth.jwt_secret = value;
        }
        if let Ok(value) = std::env::var("MUSTER_AUDIT_METADATA_KEY") {
            if !value.trim().is_empty() {
                config.audit.metadata_key = value;
            }
        }
        if let Ok(value) = std::env::var("MUSTER_AUDIT_STATUS_FIELD") {
            if !value.trim().is_empty() {
                config.audit.status_field = value;
            }
        }

        validate_configuration(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, DatabaseConfig, DatabaseEngine};
    use muster_models::snapshot::IdentityKeys;

    #[test]
    fn database_defaults_to_sqlite_engine() {
        let db = DatabaseConfig::default();
        assert_eq!(db.engine, DatabaseEngine::Sqlite);
    }

    #[test]
    fn missing_file_generates_loadable_template() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = temp.path().join("nested").join("muster.toml");
        let path = config_path.to_str().expect("config path utf8");

        let generated = Config::load(path).expect("generate config");
        assert!(config_path.exists());
        let reloaded = Config::load(path).expect("reload config");
        assert_eq!(reloaded.auth.jwt_secret, generated.auth.jwt_secret);
        assert_eq!(reloaded.audit.metadata_key, "_auditMetadata");
        assert_eq!(reloaded.audit.status_field, "status");
        assert_eq!(reloaded.audit.policy().identity, IdentityKeys::default());
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = temp.path().join("muster.toml");
        std::fs::write(
            &config_path,
            "[auth]\njwt_secret = \"change_me_change_me_change_me_change_me\"\n",
        )
        .expect("write config");
        let err = Config::load(config_path.to_str().expect("utf8")).expect_err("must reject");
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn audit_section_builds_policy() {
        let config: Config = toml::from_str(
            r#"
[auth]
jwt_secret = "0123456789abcdef0123456789abcdef"

[audit]
status_field = "stage"
first_name_keys = ["givenName"]
"#,
        )
        .expect("parse");
        let policy = config.audit.policy();
        assert_eq!(policy.status_field, "stage");
        assert_eq!(policy.identity.first_name, vec!["givenName"]);
        assert_eq!(policy.identity.last_name, IdentityKeys::default().last_name);
        assert_eq!(policy.metadata_key, "_auditMetadata");
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
    }
}

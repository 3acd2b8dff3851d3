use std::fs;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::StorageLayout;

pub const CONFIG_FILE: &str = "lunatransfer.toml";

const SECRET_FILE: &str = ".session_secret";
const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;
const MAX_TOKEN_EXPIRY_HOURS: i64 = 10 * 366 * 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub storage_dir: PathBuf,
    pub session: SessionConfig,
    pub password: PasswordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HMAC key for session tokens. Falls back to `<data_dir>/.session_secret`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub ttl_hours: i64,
    /// Keep revoked tokens in `blacklist.json` across restarts.
    pub persist_blacklist: bool,
}

/// Argon2id cost parameters for password digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            storage_dir: PathBuf::from("./storage"),
            session: SessionConfig::default(),
            password: PasswordConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
            persist_blacklist: false,
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl CoreConfig {
    /// Config rooted at `data_dir`, with storage in `<data_dir>/storage`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            storage_dir: data_dir.join("storage"),
            data_dir,
            ..Self::default()
        }
    }

    /// Reads `path` if it exists, then applies `LUNA_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("error parsing {}: {e}", path.display())))
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("LUNA_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = dir.into();
        }
        if let Some(dir) = var("LUNA_STORAGE_PATH").filter(|v| !v.is_empty()) {
            self.storage_dir = dir.into();
        }
        if let Some(secret) = var("LUNA_SESSION_SECRET").filter(|v| !v.is_empty()) {
            self.session.secret = Some(secret);
        }
        if let Some(hours) = var("LUNA_TOKEN_EXPIRY_HOURS") {
            match hours.parse() {
                Ok(h) => self.session.ttl_hours = h,
                Err(_) => tracing::warn!("Ignoring invalid LUNA_TOKEN_EXPIRY_HOURS: {hours}"),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.ttl_hours <= 0 {
            return Err(Error::Config("token expiry must be positive".to_string()));
        }
        if self.session.ttl_hours > MAX_TOKEN_EXPIRY_HOURS {
            return Err(Error::Config(format!(
                "token expiry cannot exceed {MAX_TOKEN_EXPIRY_HOURS} hours"
            )));
        }
        if self.session.secret.as_deref() == Some("") {
            return Err(Error::Config("session secret cannot be empty".to_string()));
        }
        if self.password.iterations == 0 || self.password.parallelism == 0 {
            return Err(Error::Config(
                "password hashing iterations and parallelism must be positive".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.data_dir, &self.storage_dir)
    }

    pub fn token_ttl(&self) -> Result<TimeDelta> {
        TimeDelta::try_hours(self.session.ttl_hours).ok_or_else(|| {
            Error::Config(format!(
                "token expiry out of range: {} hours",
                self.session.ttl_hours
            ))
        })
    }

    #[must_use]
    pub fn secret_path(&self) -> PathBuf {
        self.data_dir.join(SECRET_FILE)
    }

    /// Returns the configured secret, or the one stored in the data directory.
    pub fn resolve_secret(&self) -> Result<String> {
        if let Some(secret) = &self.session.secret {
            return Ok(secret.clone());
        }

        let path = self.secret_path();
        match fs::read_to_string(&path) {
            Ok(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Ok(_) => Err(Error::Config(format!("{} is empty", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::Config(format!(
                "no session secret configured and {} does not exist; run 'lunatransfer admin init'",
                path.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes a freshly generated secret to the data directory unless one exists.
    /// Returns true if a new secret was written.
    pub fn ensure_secret_file(&self) -> Result<bool> {
        let path = self.secret_path();
        if path.exists() {
            return Ok(false);
        }

        fs::create_dir_all(&self.data_dir)?;
        fs::write(&path, crate::auth::generate_secret())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(true)
    }
}

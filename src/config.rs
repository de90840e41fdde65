//! JSON configuration, written out from defaults on first run
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory of the sled database.
    pub database_path: PathBuf,
    /// Upper bound on the hours a single subscription may request.
    pub max_hours: u32,
    /// Lifetime of sessions not opened with "remember me".
    pub session_ttl_minutes: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("tutoring.db"),
            max_hours: 40,
            session_ttl_minutes: 60 * 24,
        }
    }
}

impl ServiceConfig {
    /// Read the config at `path`, writing the defaults there first if the file is missing.
    pub fn load_or_init(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let template = serde_json::to_string_pretty(&Self::default())?;
            std::fs::write(path, template)
                .with_context(|| format!("failed to write config template to {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote default configuration");
        }

        Self::load(path)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("invalid config at {}", path.display()))?;

        if config.max_hours == 0 {
            anyhow::bail!("max_hours must be at least 1");
        }
        if config.session_ttl_minutes <= 0
            || chrono::Duration::try_minutes(config.session_ttl_minutes).is_none()
        {
            anyhow::bail!(
                "session_ttl_minutes must be a positive number of minutes, got {}",
                config.session_ttl_minutes
            );
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn template_is_written_once() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("config.json");

        let config = ServiceConfig::load_or_init(&path)?;
        assert_eq!(config, ServiceConfig::default());
        assert!(path.exists());

        std::fs::write(&path, r#"{ "max_hours": 8 }"#)?;
        let config = ServiceConfig::load_or_init(&path)?;
        assert_eq!(config.max_hours, 8);
        assert_eq!(config.session_ttl_minutes, ServiceConfig::default().session_ttl_minutes);

        Ok(())
    }

    #[test]
    fn zero_hours_bound_is_rejected() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "max_hours": 0 }"#)?;

        assert!(ServiceConfig::load(&path).is_err());

        Ok(())
    }

    #[test]
    fn unusable_session_lifetime_is_rejected() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("config.json");

        for ttl in ["0", "-5", "9223372036854775807"] {
            std::fs::write(&path, format!(r#"{{ "session_ttl_minutes": {ttl} }}"#))?;
            assert!(ServiceConfig::load(&path).is_err(), "accepted {ttl}");
        }

        Ok(())
    }
}

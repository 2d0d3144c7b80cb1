//! The Configuration Surface named in the uninstall coordinator spec: three
//! knobs, all of them ambient (env + CLI), none of them a service-spec
//! loader — that loader is an external collaborator out of scope here.

mod error;

pub use error::ConfigError;

use clap::Args;

/// `service.name` / `uninstall.enabled` / whether a secrets client was
/// configured, gathered from the environment or CLI flags.
#[derive(Debug, Clone, Args)]
pub struct UninstallConfig {
    /// Namespace under which all persisted state lives, and the secrets
    /// namespace used by the TLS-cleanup phase.
    #[arg(long, env = "SCUTTLE_SERVICE_NAME")]
    pub service_name: String,

    /// Gate that enables the uninstall coordinator at all. When false, the
    /// caller should not construct a coordinator.
    #[arg(long, env = "SCUTTLE_UNINSTALL_ENABLED", default_value_t = true)]
    pub uninstall_enabled: bool,

    /// Whether a secrets client is configured. When false the
    /// TLS-cleanup phase is omitted from the plan regardless of whether
    /// the service spec declares transport encryption.
    #[arg(long, env = "SCUTTLE_SECRETS_ENABLED", default_value_t = false)]
    pub secrets_enabled: bool,
}

impl UninstallConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Invalid("service_name must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_service_name_rejected() {
        let cfg = UninstallConfig {
            service_name: "  ".into(),
            uninstall_enabled: true,
            secrets_enabled: false,
        };
        assert!(cfg.validate().is_err());
    }
}

use std::fmt;

use crate::environment::EnvironmentSnapshot;

pub const PLAY_STORE_INSTALLER: &str = "com.android.vending";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerPolicy {
    /// The recorded installer must be one of these package identities.
    AllowList(Vec<String>),
    /// Channel verification switched off by explicit configuration.
    Bypass,
}

impl Default for InstallerPolicy {
    fn default() -> Self {
        Self::AllowList(vec![PLAY_STORE_INSTALLER.to_string()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerFailure {
    NotRecorded,
    NotAllowed { installer: String },
    QueryFailed { detail: String },
}

impl InstallerFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotRecorded => "installer_not_recorded",
            Self::NotAllowed { .. } => "installer_not_allowed",
            Self::QueryFailed { .. } => "installer_query_failed",
        }
    }
}

impl fmt::Display for InstallerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRecorded => write!(f, "no installer recorded for package"),
            Self::NotAllowed { installer } => {
                write!(f, "installer '{}' is not an allowed channel", installer)
            }
            Self::QueryFailed { detail } => write!(f, "installer query failed: {}", detail),
        }
    }
}

pub fn verify_installer(
    env: &EnvironmentSnapshot<'_>,
    policy: &InstallerPolicy,
) -> Result<(), InstallerFailure> {
    let allowed = match policy {
        InstallerPolicy::Bypass => {
            tracing::warn!("distribution channel verification bypassed by configuration");
            return Ok(());
        }
        InstallerPolicy::AllowList(allowed) => allowed,
    };

    let installer = env
        .packages
        .installer_package()
        .map_err(|err| InstallerFailure::QueryFailed {
            detail: err.to_string(),
        })?
        .filter(|installer| !installer.trim().is_empty())
        .ok_or(InstallerFailure::NotRecorded)?;

    if allowed.iter().any(|candidate| candidate == &installer) {
        Ok(())
    } else {
        Err(InstallerFailure::NotAllowed { installer })
    }
}

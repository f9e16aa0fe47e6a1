//! The shared licensing secret.
//!
//! Keys are HMACs under this secret, and the activation record is sealed
//! with it. It is compiled into both the vendor tool and the application,
//! which makes the scheme security by obscurity: anyone who extracts the
//! string from a shipped binary can mint keys. The only defence here is
//! keeping it out of source control.
//!
//! Release builds set `CASEFILE_LICENSE_SECRET` at compile time. Without it
//! a development secret is used and a warning is logged.

use std::fmt;
use std::sync::Once;
use tracing::warn;

/// Used when no secret was injected at build time.
const DEVELOPMENT_SECRET: &str = "casefile-development-secret";

static DEVELOPMENT_WARNING: Once = Once::new();

/// The secret shared by the key generator and the runtime validator.
#[derive(Clone, PartialEq, Eq)]
pub struct LicenseSecret {
    value: String,
}

impl LicenseSecret {
    /// Wraps an explicit secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns the secret compiled into this binary.
    #[must_use]
    pub fn embedded() -> Self {
        match option_env!("CASEFILE_LICENSE_SECRET") {
            Some(value) if !value.is_empty() => Self::new(value),
            _ => {
                DEVELOPMENT_WARNING.call_once(|| {
                    warn!("CASEFILE_LICENSE_SECRET was not set at build time, using the development secret");
                });
                Self::new(DEVELOPMENT_SECRET)
            }
        }
    }

    /// Returns true if this is the built-in development secret.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.value == DEVELOPMENT_SECRET
    }

    pub(crate) fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for LicenseSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseSecret")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

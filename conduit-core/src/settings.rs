use crate::{DataError, ErrorContext, Result, Vendor};
use std::{env, time::Duration};

/// Connection url, vendor identity and default command timeout of one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: String,
    pub vendor: Vendor,
    pub command_timeout: Option<Duration>,
}

impl Settings {
    /// Settings for `url`, the vendor comes from its scheme.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let vendor = Vendor::from_url(&url)?;
        Ok(Self {
            url,
            vendor,
            command_timeout: None,
        })
    }
    pub fn with_vendor(url: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            url: url.into(),
            vendor,
            command_timeout: None,
        }
    }
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }
    /// Reads `CONDUIT_URL`, optional `CONDUIT_VENDOR` and optional `CONDUIT_COMMAND_TIMEOUT` (seconds).
    pub fn from_env() -> Result<Self> {
        let url = env::var("CONDUIT_URL").map_err(|_| {
            DataError::argument("The environment variable `CONDUIT_URL` is not set")
        })?;
        let mut settings = match env::var("CONDUIT_VENDOR") {
            Ok(vendor) => Self::with_vendor(url, vendor.parse()?),
            Err(..) => Self::new(url)?,
        };
        if let Ok(timeout) = env::var("CONDUIT_COMMAND_TIMEOUT") {
            let seconds: u64 = timeout.trim().parse().with_context(|| {
                format!(
                    "`CONDUIT_COMMAND_TIMEOUT` must be a number of seconds, found `{}`",
                    timeout
                )
            })?;
            settings.command_timeout = Some(Duration::from_secs(seconds));
        }
        Ok(settings)
    }
}

//! Platform letters for stops whose displays use them.

use std::collections::HashMap;

use thiserror::Error;

/// Failure to look up a platform name.
#[derive(Debug, Error)]
#[error("error getting platform name for {atco_code}: {message}")]
pub struct PlatformLookupError {
    pub atco_code: String,
    pub message: String,
}

/// Maps a stop code to the platform letter shown to passengers.
pub trait PlatformNamer: Send + Sync {
    /// `Ok(None)` for stops without a named platform.
    fn platform_for(&self, atco_code: &str) -> Result<Option<String>, PlatformLookupError>;
}

/// The fixed table of lettered platforms.
///
/// St Peter's Square and Victoria number their stops from 1 but sign their
/// platforms A to D in the opposite order.
#[derive(Debug, Clone)]
pub struct StaticPlatformNames {
    names: HashMap<&'static str, &'static str>,
}

impl Default for StaticPlatformNames {
    fn default() -> Self {
        let names = HashMap::from([
            ("9400ZZMASTP1", "D"),
            ("9400ZZMASTP2", "C"),
            ("9400ZZMASTP3", "B"),
            ("9400ZZMASTP4", "A"),
            ("9400ZZMAVIC1", "D"),
            ("9400ZZMAVIC2", "C"),
            ("9400ZZMAVIC3", "B"),
            ("9400ZZMAVIC4", "A"),
        ]);
        Self { names }
    }
}

impl PlatformNamer for StaticPlatformNames {
    fn platform_for(&self, atco_code: &str) -> Result<Option<String>, PlatformLookupError> {
        Ok(self.names.get(atco_code).map(|name| name.to_string()))
    }
}

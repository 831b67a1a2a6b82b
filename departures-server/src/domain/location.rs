//! Stop and stop-area location codes.

use std::fmt;

/// Error returned when parsing an invalid location code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid location code: {reason}")]
pub struct InvalidLocationCode {
    reason: &'static str,
}

impl InvalidLocationCode {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Prefix shared by every tram stop and stop area code.
const NETWORK_PREFIX: &[u8] = b"940";

/// Locality segment that follows the kind marker.
const LOCALITY: &[u8] = b"ZZMA";

/// A validated tram location code.
///
/// Codes have the shape `940` + kind + `ZZMA` + three letters, optionally
/// followed by a platform digit 1-4. The kind byte is `0` for a single
/// physical stop (an ATCO code such as `9400ZZMASTP1`) and `G` for a stop
/// area grouping several stops (such as `940GZZMASTP`).
///
/// # Examples
///
/// ```
/// use departures_server::domain::LocationCode;
///
/// let area = LocationCode::parse("940GZZMASTP").unwrap();
/// assert!(area.is_stop_area());
///
/// let stop = LocationCode::parse_normalized("9400zzmastp1").unwrap();
/// assert_eq!(stop.as_str(), "9400ZZMASTP1");
/// assert!(stop.is_stop());
///
/// assert!(LocationCode::parse("940XZZMASTP").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LocationCode(String);

impl LocationCode {
    /// Parse a location code that must already be uppercase.
    pub fn parse(s: &str) -> Result<Self, InvalidLocationCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 11 && bytes.len() != 12 {
            return Err(InvalidLocationCode::new("must be 11 or 12 characters"));
        }

        if &bytes[..3] != NETWORK_PREFIX {
            return Err(InvalidLocationCode::new("must start with 940"));
        }

        if bytes[3] != b'0' && bytes[3] != b'G' {
            return Err(InvalidLocationCode::new("kind must be 0 or G"));
        }

        if &bytes[4..8] != LOCALITY {
            return Err(InvalidLocationCode::new("locality must be ZZMA"));
        }

        if !bytes[8..11].iter().all(u8::is_ascii_uppercase) {
            return Err(InvalidLocationCode::new(
                "stop name must be three uppercase letters",
            ));
        }

        if let Some(&platform) = bytes.get(11)
            && !(b'1'..=b'4').contains(&platform)
        {
            return Err(InvalidLocationCode::new("platform suffix must be 1-4"));
        }

        Ok(Self(s.to_string()))
    }

    /// Parse a location code after converting it to uppercase.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidLocationCode> {
        Self::parse(&s.to_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the code identifies a single physical stop.
    pub fn is_stop(&self) -> bool {
        self.0.as_bytes()[3] == b'0'
    }

    /// True when the code identifies a stop area.
    pub fn is_stop_area(&self) -> bool {
        !self.is_stop()
    }
}

impl fmt::Debug for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationCode({})", self.0)
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Log severity levels.
//!
//! Codes and names follow the Cloud Logging `LogSeverity` enumeration:
//! <https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry#LogSeverity>

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Ordered log severity. `Default` is the lowest, `Emergency` the highest.
///
/// The discriminants are the numeric codes the ingestion backend assigns to
/// each level, so `as i32` yields the wire code directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum Severity {
    Default = 0,
    Debug = 100,
    Info = 200,
    Notice = 300,
    Warning = 400,
    Error = 500,
    Critical = 600,
    Alert = 700,
    Emergency = 800,
}

impl Severity {
    /// Canonical uppercase name, as rendered in emitted entries.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Default => "DEFAULT",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }

    /// Look up a severity by its numeric code.
    pub fn from_code(code: i32) -> Option<Severity> {
        match code {
            0 => Some(Severity::Default),
            100 => Some(Severity::Debug),
            200 => Some(Severity::Info),
            300 => Some(Severity::Notice),
            400 => Some(Severity::Warning),
            500 => Some(Severity::Error),
            600 => Some(Severity::Critical),
            700 => Some(Severity::Alert),
            800 => Some(Severity::Emergency),
            _ => None,
        }
    }

    /// Name for a raw numeric code. Unmapped codes render as `"UNKNOWN"`.
    pub fn code_name(code: i32) -> &'static str {
        Severity::from_code(code).map_or("UNKNOWN", Severity::name)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Case-insensitive parse from the canonical name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEFAULT" => Ok(Severity::Default),
            "DEBUG" => Ok(Severity::Debug),
            "INFO" => Ok(Severity::Info),
            "NOTICE" => Ok(Severity::Notice),
            "WARNING" => Ok(Severity::Warning),
            "ERROR" => Ok(Severity::Error),
            "CRITICAL" => Ok(Severity::Critical),
            "ALERT" => Ok(Severity::Alert),
            "EMERGENCY" => Ok(Severity::Emergency),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_total_and_increasing() {
        let all = [
            Severity::Default,
            Severity::Debug,
            Severity::Info,
            Severity::Notice,
            Severity::Warning,
            Severity::Error,
            Severity::Critical,
            Severity::Alert,
            Severity::Emergency,
        ];
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1], "{} should rank below {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn max_by_rank_picks_highest() {
        let max = [Severity::Info, Severity::Error, Severity::Debug]
            .into_iter()
            .max()
            .unwrap();
        assert_eq!(max, Severity::Error);
    }

    #[test]
    fn renders_canonical_names() {
        assert_eq!(Severity::Default.to_string(), "DEFAULT");
        assert_eq!(Severity::Warning.to_string(), "WARNING");
        assert_eq!(Severity::Emergency.to_string(), "EMERGENCY");
    }

    #[test]
    fn codes_match_backend_enumeration() {
        assert_eq!(Severity::Default as i32, 0);
        assert_eq!(Severity::Info as i32, 200);
        assert_eq!(Severity::Emergency as i32, 800);
    }

    #[test]
    fn from_code_roundtrips() {
        for code in [0, 100, 200, 300, 400, 500, 600, 700, 800] {
            let sev = Severity::from_code(code).unwrap();
            assert_eq!(sev as i32, code);
        }
    }

    #[test]
    fn unmapped_code_renders_unknown() {
        assert!(Severity::from_code(150).is_none());
        assert_eq!(Severity::code_name(150), "UNKNOWN");
        assert_eq!(Severity::code_name(-1), "UNKNOWN");
        assert_eq!(Severity::code_name(400), "WARNING");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!("Notice".parse::<Severity>().unwrap(), Severity::Notice);
        assert!("verbose".parse::<Severity>().is_err());
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, r#""CRITICAL""#);
        let back: Severity = serde_json::from_str(r#""info""#).unwrap();
        assert_eq!(back, Severity::Info);
    }
}

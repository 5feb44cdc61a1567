//! Structured platform descriptors.
//!
//! A platform names the architecture, operating system and channel a machine
//! runs or an application's charm targets. It is written as
//! `<arch>/<os>/<channel>`, e.g. `amd64/ubuntu/22.04/stable`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Architecture assumed when legacy data names none.
pub const DEFAULT_ARCHITECTURE: &str = "amd64";

/// Risk appended to the version of a channel derived from a series.
pub const DEFAULT_RISK: &str = "stable";

/// Error parsing a platform string or series name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformParseError {
    #[error("platform {0:?}: expected <arch>/<os>/<channel>")]
    Malformed(String),

    #[error("unknown series {0:?}")]
    UnknownSeries(String),
}

/// Architecture, operating system and channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    /// `<version>/<risk>`, e.g. `22.04/stable`.
    pub channel: String,
}

impl Platform {
    pub fn new(
        architecture: impl Into<String>,
        os: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            architecture: architecture.into(),
            os: os.into(),
            channel: channel.into(),
        }
    }

    /// Parses `<arch>/<os>/<channel>`. The channel may itself contain `/`.
    pub fn parse(s: &str) -> Result<Self, PlatformParseError> {
        let mut parts = s.splitn(3, '/');
        let (Some(arch), Some(os), Some(channel)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(PlatformParseError::Malformed(s.to_string()));
        };
        if arch.is_empty() || os.is_empty() || channel.is_empty() {
            return Err(PlatformParseError::Malformed(s.to_string()));
        }
        Ok(Self::new(arch, os, channel))
    }

    /// Derives a platform from a legacy series name.
    ///
    /// Only series in the known table are accepted; anything else is an
    /// error rather than a guess.
    pub fn from_series(series: &str, architecture: &str) -> Result<Self, PlatformParseError> {
        let (os, version) = series_base(series)
            .ok_or_else(|| PlatformParseError::UnknownSeries(series.to_string()))?;
        Ok(Self::new(
            architecture,
            os,
            format!("{}/{}", version, DEFAULT_RISK),
        ))
    }

    /// The version part of the channel (`22.04` for `22.04/stable`).
    pub fn version(&self) -> &str {
        self.channel
            .split_once('/')
            .map(|(version, _)| version)
            .unwrap_or(&self.channel)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.architecture, self.os, self.channel)
    }
}

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::parse(s)
    }
}

const SERIES: &[(&str, &str, &str)] = &[
    ("precise", "ubuntu", "12.04"),
    ("trusty", "ubuntu", "14.04"),
    ("xenial", "ubuntu", "16.04"),
    ("bionic", "ubuntu", "18.04"),
    ("cosmic", "ubuntu", "18.10"),
    ("disco", "ubuntu", "19.04"),
    ("eoan", "ubuntu", "19.10"),
    ("focal", "ubuntu", "20.04"),
    ("groovy", "ubuntu", "20.10"),
    ("hirsute", "ubuntu", "21.04"),
    ("impish", "ubuntu", "21.10"),
    ("jammy", "ubuntu", "22.04"),
    ("kinetic", "ubuntu", "22.10"),
    ("lunar", "ubuntu", "23.04"),
    ("mantic", "ubuntu", "23.10"),
    ("noble", "ubuntu", "24.04"),
    ("centos7", "centos", "7"),
    ("centos8", "centos", "8"),
    ("centos9", "centos", "9"),
];

/// Operating system and version for a series name.
pub fn series_base(series: &str) -> Option<(&'static str, &'static str)> {
    SERIES
        .iter()
        .find(|(name, _, _)| *name == series)
        .map(|(_, os, version)| (*os, *version))
}

//! Release versions and their ordering.
//!
//! Accepts both dotted pre-release tags as used on GitHub ("v1.4.0-beta.2")
//! and the compact form common in Python-style release metadata ("1.4.0b2").

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, UpdateError};

/// Pre-release stage of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreRelease {
    /// Alpha release ("alpha.1", "a1").
    Alpha(u32),
    /// Beta release ("beta.2", "b2").
    Beta(u32),
    /// Release candidate ("rc.3", "rc3").
    ReleaseCandidate(u32),
}

impl PreRelease {
    /// Stage rank, alpha < beta < rc.
    #[must_use]
    pub const fn stage(self) -> u8 {
        match self {
            Self::Alpha(_) => 0,
            Self::Beta(_) => 1,
            Self::ReleaseCandidate(_) => 2,
        }
    }

    const fn number(self) -> u32 {
        match self {
            Self::Alpha(n) | Self::Beta(n) | Self::ReleaseCandidate(n) => n,
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        let tag = tag.to_ascii_lowercase();
        let (stage, rest): (fn(u32) -> Self, &str) =
            if let Some(rest) = tag.strip_prefix("alpha") {
                (Self::Alpha, rest)
            } else if let Some(rest) = tag.strip_prefix("beta") {
                (Self::Beta, rest)
            } else if let Some(rest) = tag.strip_prefix("rc") {
                (Self::ReleaseCandidate, rest)
            } else if let Some(rest) = tag.strip_prefix('a') {
                (Self::Alpha, rest)
            } else if let Some(rest) = tag.strip_prefix('b') {
                (Self::Beta, rest)
            } else {
                return None;
            };

        let rest = rest.strip_prefix('.').unwrap_or(rest);
        if rest.is_empty() {
            Some(stage(0))
        } else {
            rest.parse().ok().map(stage)
        }
    }
}

impl PartialOrd for PreRelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PreRelease {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.stage(), self.number()).cmp(&(other.stage(), other.number()))
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alpha(n) => write!(f, "alpha.{n}"),
            Self::Beta(n) => write!(f, "beta.{n}"),
            Self::ReleaseCandidate(n) => write!(f, "rc.{n}"),
        }
    }
}

/// A `major.minor.patch` version with an optional pre-release stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre_release: Option<PreRelease>,
}

impl Version {
    /// Create a stable version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
        }
    }

    /// Attach a pre-release stage.
    #[must_use]
    pub const fn with_pre_release(mut self, pre_release: PreRelease) -> Self {
        self.pre_release = Some(pre_release);
        self
    }

    #[must_use]
    pub const fn is_stable(&self) -> bool {
        self.pre_release.is_none()
    }
}

/// Splits "1.4.0b2" into ("1.4.0", "b2") and "1.4.0-beta.2" into ("1.4.0", "beta.2").
fn split_pre_release(s: &str) -> (&str, Option<&str>) {
    if let Some((core, tag)) = s.split_once('-') {
        return (core, Some(tag));
    }
    match s.find(|c: char| c.is_ascii_alphabetic()) {
        Some(idx) => (&s[..idx], Some(&s[idx..])),
        None => (s, None),
    }
}

impl FromStr for Version {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let invalid = || UpdateError::InvalidVersion(s.to_string());

        let (core, tag) = split_pre_release(trimmed);
        let pre_release = match tag {
            Some(tag) => Some(PreRelease::parse(tag).ok_or_else(invalid)?),
            None => None,
        };

        let mut numbers = core.split('.').map(str::parse::<u32>);
        let (Some(Ok(major)), Some(Ok(minor)), Some(Ok(patch)), None) = (
            numbers.next(),
            numbers.next(),
            numbers.next(),
            numbers.next(),
        ) else {
            return Err(invalid());
        };

        Ok(Self {
            major,
            minor,
            patch,
            pre_release,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = self.pre_release {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            // 1.0.0-rc.1 < 1.0.0
            .then_with(|| match (self.pre_release, other.pre_release) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(&b),
            })
    }
}

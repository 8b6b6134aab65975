//! Companion config-node version gate
//!
//! The palette requires a minimum version of the companion database
//! config node it is deployed next to. The host probes the installed
//! version at startup and feeds it to a [`CompanionGate`]; nodes hold
//! the gate as an explicit capability object and refuse to touch the
//! client while it is unsatisfied.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Version of the companion config node required by this palette
pub const REQUIRED_COMPANION_VERSION: CompanionVersion = CompanionVersion {
    major: 0,
    minor: 3,
    patch: 1,
};

/// A `major.minor.patch` version triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompanionVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl CompanionVersion {
    /// Parse a `major.minor.patch` string, ignoring surrounding noise
    /// such as a leading `v` or pre-release suffixes
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim().trim_start_matches('v');
        let core = trimmed
            .split(|c: char| c == '-' || c == '+')
            .next()
            .unwrap_or(trimmed);

        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// Whether this version satisfies the given requirement
    pub fn satisfies(&self, required: &CompanionVersion) -> bool {
        self >= required
    }
}

impl fmt::Display for CompanionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Shared capability object recording whether the companion config node
/// satisfies the palette's version requirement
pub struct CompanionGate {
    satisfied: AtomicBool,
    observed: Mutex<Option<String>>,
}

impl CompanionGate {
    /// A gate that has not seen any version yet and assumes the
    /// requirement is met (benefit of the doubt when probing fails)
    pub fn assume_satisfied() -> Self {
        Self {
            satisfied: AtomicBool::new(true),
            observed: Mutex::new(None),
        }
    }

    /// A gate that starts unsatisfied until a version is observed
    pub fn unsatisfied() -> Self {
        Self {
            satisfied: AtomicBool::new(false),
            observed: Mutex::new(None),
        }
    }

    /// Record the observed companion version and update the gate.
    ///
    /// An unparseable version string leaves the gate satisfied, the
    /// same benefit of the doubt the probing path grants: a broken
    /// probe must not deactivate the palette.
    pub fn observe(&self, version: &str) -> bool {
        if let Ok(mut observed) = self.observed.lock() {
            *observed = Some(version.to_string());
        }

        let satisfied = match CompanionVersion::parse(version) {
            Some(parsed) => parsed.satisfies(&REQUIRED_COMPANION_VERSION),
            None => true,
        };
        self.satisfied.store(satisfied, Ordering::SeqCst);
        satisfied
    }

    /// Whether the requirement is currently satisfied
    pub fn is_satisfied(&self) -> bool {
        self.satisfied.load(Ordering::SeqCst)
    }

    /// The last version string observed, if any
    pub fn observed_version(&self) -> Option<String> {
        self.observed.lock().ok().and_then(|v| v.clone())
    }
}

impl Default for CompanionGate {
    fn default() -> Self {
        Self::assume_satisfied()
    }
}

//! Where and when a crash can be injected

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use travel_common::ServiceName;

/// The process a crash point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrashSite {
    /// The coordinator
    Middleware,
    /// A participant service
    Service(ServiceName),
}

impl fmt::Display for CrashSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrashSite::Middleware => f.write_str("middleware"),
            CrashSite::Service(service) => write!(f, "{}", service),
        }
    }
}

impl FromStr for CrashSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("middleware") {
            Ok(CrashSite::Middleware)
        } else {
            s.parse().map(CrashSite::Service)
        }
    }
}

/// Position relative to the protocol step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrashTiming {
    Before,
    /// Part way through a fan-out (middleware only)
    In,
    After,
}

impl FromStr for CrashTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(CrashTiming::Before),
            "in" => Ok(CrashTiming::In),
            "after" => Ok(CrashTiming::After),
            other => Err(format!("Unknown crash timing: {}", other)),
        }
    }
}

/// Protocol step a crash point is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrashPhase {
    /// Coordinator sending prepare requests
    Prepare,
    /// Coordinator sending the commit/abort decision
    Decision,
    /// Participant answering a prepare request
    Vote,
    /// Participant applying a commit
    Save,
}

impl FromStr for CrashPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prepare" => Ok(CrashPhase::Prepare),
            "decision" => Ok(CrashPhase::Decision),
            "vote" => Ok(CrashPhase::Vote),
            "save" => Ok(CrashPhase::Save),
            other => Err(format!("Unknown crash phase: {}", other)),
        }
    }
}

/// An armable crash point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrashPoint {
    pub timing: CrashTiming,
    pub phase: CrashPhase,
}

impl CrashPoint {
    pub fn new(timing: CrashTiming, phase: CrashPhase) -> Self {
        Self { timing, phase }
    }

    /// Whether this point exists at the given site
    ///
    /// The middleware has before/in/after points around prepare and decision;
    /// participants have before/after points around vote and save.
    pub fn is_valid_for(&self, site: CrashSite) -> bool {
        match site {
            CrashSite::Middleware => {
                matches!(self.phase, CrashPhase::Prepare | CrashPhase::Decision)
            }
            CrashSite::Service(_) => {
                matches!(self.phase, CrashPhase::Vote | CrashPhase::Save)
                    && self.timing != CrashTiming::In
            }
        }
    }
}

impl fmt::Display for CrashPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?}", self.timing, self.phase)
    }
}

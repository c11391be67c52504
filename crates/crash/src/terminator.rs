//! Process termination

use crate::point::{CrashPoint, CrashSite};
use parking_lot::Mutex;
use std::fmt::Debug;

/// Exit code of a process killed by a crash point or a crash command
pub const CRASH_EXIT_CODE: i32 = 1;

/// Exit code of a process stopped by a shutdown request
pub const SHUTDOWN_EXIT_CODE: i32 = 0;

/// Why a process is being terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// An armed crash point fired
    Crash(CrashPoint),
    /// Unconditional kill requested by an operator
    Kill,
    /// Orderly stop
    Shutdown,
}

/// Ends the current process
pub trait Terminator: Send + Sync + Debug {
    fn terminate(&self, site: CrashSite, reason: Termination);
}

/// Exits the process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, site: CrashSite, reason: Termination) {
        let code = match reason {
            Termination::Shutdown => {
                tracing::info!("Shutting down {}", site);
                SHUTDOWN_EXIT_CODE
            }
            Termination::Kill => {
                tracing::error!("Killing {}", site);
                CRASH_EXIT_CODE
            }
            Termination::Crash(point) => {
                tracing::error!("Crash point {} fired in {}", point, site);
                CRASH_EXIT_CODE
            }
        };
        std::process::exit(code);
    }
}

/// Records terminations instead of exiting, for in-process tests
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    events: Mutex<Vec<(CrashSite, Termination)>>,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every termination requested so far, oldest first
    pub fn events(&self) -> Vec<(CrashSite, Termination)> {
        self.events.lock().clone()
    }

    /// Whether the given site was asked to terminate
    pub fn terminated(&self, site: CrashSite) -> bool {
        self.events.lock().iter().any(|(s, _)| *s == site)
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, site: CrashSite, reason: Termination) {
        tracing::debug!("Recorded {:?} of {}", reason, site);
        self.events.lock().push((site, reason));
    }
}

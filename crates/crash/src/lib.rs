//! Crash injection
//!
//! Services consult a [`CrashInjector`] at fixed points of the commit
//! protocol. An armed point terminates the process through a
//! [`Terminator`], which tests replace with a [`RecordingTerminator`].

mod injector;
mod point;
mod terminator;

pub use injector::CrashInjector;
pub use point::{CrashPhase, CrashPoint, CrashSite, CrashTiming};
pub use terminator::{
    CRASH_EXIT_CODE, ProcessTerminator, RecordingTerminator, SHUTDOWN_EXIT_CODE, Termination,
    Terminator,
};

//! Armed crash points of one process

use crate::point::{CrashPhase, CrashPoint, CrashSite, CrashTiming};
use crate::terminator::{ProcessTerminator, Termination, Terminator};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Crash points armed in the current process
///
/// Armed points stay armed: every pass through a point terminates again.
#[derive(Debug)]
pub struct CrashInjector {
    site: CrashSite,
    armed: Mutex<HashSet<CrashPoint>>,
    terminator: Arc<dyn Terminator>,
}

impl CrashInjector {
    /// Injector that really exits the process
    pub fn new(site: CrashSite) -> Self {
        Self::with_terminator(site, Arc::new(ProcessTerminator))
    }

    /// Injector with a custom way of terminating
    pub fn with_terminator(site: CrashSite, terminator: Arc<dyn Terminator>) -> Self {
        Self {
            site,
            armed: Mutex::new(HashSet::new()),
            terminator,
        }
    }

    /// The process this injector belongs to
    pub fn site(&self) -> CrashSite {
        self.site
    }

    /// Arm a crash point; returns false if the point does not exist here
    pub fn arm(&self, point: CrashPoint) -> bool {
        if !point.is_valid_for(self.site) {
            tracing::debug!("Rejected crash point {} for {}", point, self.site);
            return false;
        }
        tracing::info!("Armed crash point {} in {}", point, self.site);
        self.armed.lock().insert(point);
        true
    }

    /// Arm a crash point from its parts
    pub fn inject(&self, timing: CrashTiming, phase: CrashPhase) -> bool {
        self.arm(CrashPoint::new(timing, phase))
    }

    /// Disarm every crash point
    pub fn reset(&self) {
        self.armed.lock().clear();
    }

    /// Whether a point is armed
    pub fn is_armed(&self, timing: CrashTiming, phase: CrashPhase) -> bool {
        self.armed
            .lock()
            .contains(&CrashPoint::new(timing, phase))
    }

    /// Terminate if the point is armed
    pub fn checkpoint(&self, timing: CrashTiming, phase: CrashPhase) {
        let point = CrashPoint::new(timing, phase);
        if self.armed.lock().contains(&point) {
            self.terminator
                .terminate(self.site, Termination::Crash(point));
        }
    }

    /// Terminate unconditionally
    pub fn kill(&self) {
        self.terminator.terminate(self.site, Termination::Kill);
    }

    /// Terminate with a shutdown after `grace`, from a background thread
    pub fn shutdown_after(&self, grace: Duration) {
        let site = self.site;
        let terminator = self.terminator.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("{}-shutdown", site))
            .spawn(move || {
                std::thread::sleep(grace);
                terminator.terminate(site, Termination::Shutdown);
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to schedule shutdown of {}: {}", site, e);
            self.terminator.terminate(site, Termination::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminator::RecordingTerminator;
    use travel_common::ServiceName;

    fn recording(site: CrashSite) -> (CrashInjector, Arc<RecordingTerminator>) {
        let terminator = Arc::new(RecordingTerminator::new());
        (
            CrashInjector::with_terminator(site, terminator.clone()),
            terminator,
        )
    }

    #[test]
    fn test_unarmed_checkpoint_is_silent() {
        let (injector, terminator) = recording(CrashSite::Middleware);

        injector.checkpoint(CrashTiming::Before, CrashPhase::Prepare);
        assert!(terminator.events().is_empty());
    }

    #[test]
    fn test_armed_point_fires_every_time() {
        let (injector, terminator) = recording(CrashSite::Middleware);

        assert!(injector.inject(CrashTiming::In, CrashPhase::Decision));
        injector.checkpoint(CrashTiming::In, CrashPhase::Decision);
        injector.checkpoint(CrashTiming::In, CrashPhase::Decision);
        injector.checkpoint(CrashTiming::After, CrashPhase::Decision);

        let point = CrashPoint::new(CrashTiming::In, CrashPhase::Decision);
        assert_eq!(
            terminator.events(),
            vec![
                (CrashSite::Middleware, Termination::Crash(point)),
                (CrashSite::Middleware, Termination::Crash(point)),
            ]
        );
    }

    #[test]
    fn test_invalid_point_is_not_armed() {
        let site = CrashSite::Service(ServiceName::Flights);
        let (injector, _) = recording(site);

        assert!(!injector.inject(CrashTiming::In, CrashPhase::Save));
        assert!(!injector.inject(CrashTiming::Before, CrashPhase::Decision));
        assert!(!injector.is_armed(CrashTiming::In, CrashPhase::Save));

        assert!(injector.inject(CrashTiming::Before, CrashPhase::Save));
        assert!(injector.is_armed(CrashTiming::Before, CrashPhase::Save));

        injector.reset();
        assert!(!injector.is_armed(CrashTiming::Before, CrashPhase::Save));
    }

    #[test]
    fn test_kill_and_shutdown() {
        let site = CrashSite::Service(ServiceName::Rooms);
        let (injector, terminator) = recording(site);

        injector.kill();
        injector.shutdown_after(Duration::from_millis(10));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while terminator.events().len() < 2 {
            assert!(std::time::Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(
            terminator.events(),
            vec![(site, Termination::Kill), (site, Termination::Shutdown)]
        );
    }
}

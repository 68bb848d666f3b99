//! `reattach()` decision (C8 point 7, spec §4.8): after a failed attach
//! attempt, decide whether to retry on the Active dataset, fall back to
//! the Pending dataset, downgrade, or detach outright.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReattachState {
    Stop,
    Active,
    Pending,
}

impl Default for ReattachState {
    fn default() -> Self {
        Self::Stop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReattachDecision {
    RetryActiveDataset,
    FallBackToPendingDataset,
    DowngradeToReed,
    Detach,
}

pub struct ReattachTracker {
    pub state: ReattachState,
    pub has_pending_dataset: bool,
    pub was_router: bool,
}

impl ReattachTracker {
    pub fn new(has_pending_dataset: bool, was_router: bool) -> Self {
        Self {
            state: ReattachState::Stop,
            has_pending_dataset,
            was_router,
        }
    }

    /// Called once an attach attempt (on the Active dataset) has failed.
    pub fn decide(&mut self) -> ReattachDecision {
        match self.state {
            ReattachState::Stop => {
                self.state = ReattachState::Active;
                ReattachDecision::RetryActiveDataset
            }
            ReattachState::Active if self.has_pending_dataset => {
                self.state = ReattachState::Pending;
                ReattachDecision::FallBackToPendingDataset
            }
            ReattachState::Active if self.was_router => {
                self.state = ReattachState::Stop;
                ReattachDecision::DowngradeToReed
            }
            _ => {
                self.state = ReattachState::Stop;
                ReattachDecision::Detach
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = ReattachState::Stop;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_once_on_active_dataset_before_anything_else() {
        let mut tracker = ReattachTracker::new(false, false);
        assert_eq!(tracker.decide(), ReattachDecision::RetryActiveDataset);
    }

    #[test]
    fn falls_back_to_pending_dataset_when_available() {
        let mut tracker = ReattachTracker::new(true, false);
        tracker.decide();
        assert_eq!(tracker.decide(), ReattachDecision::FallBackToPendingDataset);
    }

    #[test]
    fn downgrades_former_routers_with_no_pending_dataset() {
        let mut tracker = ReattachTracker::new(false, true);
        tracker.decide();
        assert_eq!(tracker.decide(), ReattachDecision::DowngradeToReed);
    }

    #[test]
    fn detaches_as_the_final_fallback() {
        let mut tracker = ReattachTracker::new(false, false);
        tracker.decide();
        assert_eq!(tracker.decide(), ReattachDecision::Detach);
    }
}

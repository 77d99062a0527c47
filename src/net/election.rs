//! Trusted-source election.
//!
//! A joining peer asks the scene for its source a few times, then elects
//! itself if nobody answered. The schedule is a cancellable task driven by
//! the peer's clock; observing any `SyncSource` cancels it.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::ElectionConfig;

/// What a due election timer asks the peer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionStep {
    /// Broadcast `GetSource`.
    RequestSource { attempt: u32 },
    /// Announce the local peer as the trusted source.
    SelfElect,
}

/// The bootstrap schedule of one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionTask {
    steps: Vec<(Duration, ElectionStep)>,
    next: usize,
    cancelled: bool,
}

impl ElectionTask {
    /// Lays out the schedule for a peer that joined at `start`.
    pub fn schedule(start: Duration, config: &ElectionConfig, jitter: Duration) -> Self {
        let offsets = config.schedule();
        let last = offsets.len().saturating_sub(1);
        let steps = offsets
            .into_iter()
            .enumerate()
            .map(|(i, offset)| {
                let step = if i == last {
                    ElectionStep::SelfElect
                } else {
                    ElectionStep::RequestSource { attempt: i as u32 + 1 }
                };
                (start + offset + jitter, step)
            })
            .collect();
        ElectionTask {
            steps,
            next: 0,
            cancelled: false,
        }
    }

    /// When the next step fires, if any remain.
    pub fn next_due(&self) -> Option<Duration> {
        if self.cancelled {
            return None;
        }
        self.steps.get(self.next).map(|(at, _)| *at)
    }

    /// Pops the next step if it is due at `now`.
    pub fn poll(&mut self, now: Duration) -> Option<ElectionStep> {
        let due = self.next_due()?;
        if due > now {
            return None;
        }
        let (_, step) = self.steps[self.next];
        self.next += 1;
        Some(step)
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// True once cancelled or every step has fired.
    pub fn is_finished(&self) -> bool {
        self.cancelled || self.next >= self.steps.len()
    }
}

/// Runs the election schedule of one peer.
#[derive(Debug)]
pub struct TrustedSourceElector {
    config: ElectionConfig,
    rng: SmallRng,
    task: Option<ElectionTask>,
}

impl TrustedSourceElector {
    pub fn new(config: ElectionConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_entropy(),
        };
        TrustedSourceElector {
            config,
            rng,
            task: None,
        }
    }

    /// Starts a fresh schedule at `now`, replacing any running one.
    pub fn begin(&mut self, now: Duration) {
        let jitter_ms = self.config.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(self.rng.gen_range(0..jitter_ms))
        };
        let task = ElectionTask::schedule(now, &self.config, jitter);
        debug!(jitter_ms = jitter.as_millis() as u64, first = ?task.next_due(), "election scheduled");
        self.task = Some(task);
    }

    pub fn task(&self) -> Option<&ElectionTask> {
        self.task.as_ref()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.task.as_ref().and_then(ElectionTask::next_due)
    }

    /// Pops the next due step.
    pub fn poll(&mut self, now: Duration) -> Option<ElectionStep> {
        self.task.as_mut().and_then(|t| t.poll(now))
    }

    /// Stops the schedule; pending steps never fire.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if !task.is_finished() {
                debug!("election cancelled");
            }
            task.cancel();
        }
    }

    /// True while steps are still pending.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

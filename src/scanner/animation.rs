// SPDX-License-Identifier: GPL-3.0-only

//! Loading animation chains
//!
//! While processing, the message panel runs two independent chains: the
//! background blur pulses between two intensities and the loading border
//! rotates by quarter turns. Each step asks the host to call back after the
//! step has finished, and every callback re-checks the scan state first.
//! Leaving [`ScanState::Processing`] therefore ends both chains at their next
//! step boundary without any cancel call; the border snaps back to identity.

use super::state::ScanState;
use super::timers::TimerRequest;
use crate::constants::animation;
use std::time::Duration;
use tracing::debug;

/// The two independent animation chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    BlurPulse,
    BorderRotation,
}

impl AnimationKind {
    /// Time from the start of a step to its completion
    pub fn step_length(&self) -> Duration {
        match self {
            AnimationKind::BlurPulse => animation::BLUR_PULSE_DELAY + animation::BLUR_PULSE_DURATION,
            AnimationKind::BorderRotation => {
                animation::BORDER_ROTATION_DELAY + animation::BORDER_ROTATION_DURATION
            }
        }
    }

    fn next_step(self) -> TimerRequest {
        TimerRequest::AnimationStep {
            kind: self,
            after: self.step_length(),
        }
    }
}

/// Background blur intensity of the message panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlurIntensity {
    Light,
    #[default]
    ExtraLight,
}

impl BlurIntensity {
    fn toggled(self) -> Self {
        match self {
            BlurIntensity::Light => BlurIntensity::ExtraLight,
            BlurIntensity::ExtraLight => BlurIntensity::Light,
        }
    }

    /// Panel background alpha for this intensity
    pub fn alpha(&self) -> f32 {
        match self {
            BlurIntensity::Light => animation::LIGHT_BLUR_ALPHA,
            BlurIntensity::ExtraLight => animation::EXTRA_LIGHT_BLUR_ALPHA,
        }
    }
}

/// Current animation targets and which chains are alive
#[derive(Debug, Clone, Default)]
pub struct LoadingAnimation {
    blur: BlurIntensity,
    quarter_turns: u8,
    blur_running: bool,
    border_running: bool,
}

impl LoadingAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the chains that are not already alive
    ///
    /// A chain whose next step is still pending keeps running instead of being
    /// started twice, so this is safe to call on every state update.
    pub fn start(&mut self, state: ScanState) -> Vec<TimerRequest> {
        let mut requests = Vec::new();

        if !state.is_loading() {
            return requests;
        }

        if !self.blur_running {
            self.blur_running = true;
            self.blur = BlurIntensity::Light;
            requests.push(AnimationKind::BlurPulse.next_step());
        }

        if !self.border_running {
            self.border_running = true;
            self.quarter_turns = 1;
            requests.push(AnimationKind::BorderRotation.next_step());
        }

        if !requests.is_empty() {
            debug!(chains = requests.len(), "Loading animation started");
        }

        requests
    }

    /// Complete a step and decide whether the chain continues
    ///
    /// Returns the request for the next step, or `None` when the chain ended
    /// because the state left processing.
    pub fn step(&mut self, kind: AnimationKind, state: ScanState) -> Option<TimerRequest> {
        let running = match kind {
            AnimationKind::BlurPulse => &mut self.blur_running,
            AnimationKind::BorderRotation => &mut self.border_running,
        };

        if !*running {
            return None;
        }

        if !state.is_loading() {
            *running = false;
            match kind {
                AnimationKind::BlurPulse => self.blur = BlurIntensity::default(),
                AnimationKind::BorderRotation => self.quarter_turns = 0,
            }
            debug!(?kind, %state, "Loading animation chain finished");
            return None;
        }

        match kind {
            AnimationKind::BlurPulse => self.blur = self.blur.toggled(),
            AnimationKind::BorderRotation => self.quarter_turns = (self.quarter_turns + 1) % 4,
        }

        Some(kind.next_step())
    }

    /// Whether a chain has a pending step
    pub fn is_running(&self, kind: AnimationKind) -> bool {
        match kind {
            AnimationKind::BlurPulse => self.blur_running,
            AnimationKind::BorderRotation => self.border_running,
        }
    }

    pub fn blur(&self) -> BlurIntensity {
        self.blur
    }

    /// Border rotation in quarter turns (0 is identity)
    pub fn quarter_turns(&self) -> u8 {
        self.quarter_turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_outside_processing_does_nothing() {
        let mut animation = LoadingAnimation::new();
        assert!(animation.start(ScanState::Scanning).is_empty());
        assert!(!animation.is_running(AnimationKind::BlurPulse));
        assert!(!animation.is_running(AnimationKind::BorderRotation));
    }

    #[test]
    fn test_start_twice_keeps_one_chain_each() {
        let mut animation = LoadingAnimation::new();
        assert_eq!(animation.start(ScanState::Processing).len(), 2);
        assert!(animation.start(ScanState::Processing).is_empty());
    }

    #[test]
    fn test_steps_alternate_blur_and_rotate_border() {
        let mut animation = LoadingAnimation::new();
        animation.start(ScanState::Processing);
        assert_eq!(animation.blur(), BlurIntensity::Light);
        assert_eq!(animation.quarter_turns(), 1);

        let next = animation.step(AnimationKind::BlurPulse, ScanState::Processing);
        assert_eq!(
            next,
            Some(TimerRequest::AnimationStep {
                kind: AnimationKind::BlurPulse,
                after: Duration::from_millis(2500),
            })
        );
        assert_eq!(animation.blur(), BlurIntensity::ExtraLight);

        for _ in 0..3 {
            animation.step(AnimationKind::BorderRotation, ScanState::Processing);
        }
        assert_eq!(animation.quarter_turns(), 0);
    }

    #[test]
    fn test_guard_ends_chain_and_snaps_to_identity() {
        let mut animation = LoadingAnimation::new();
        animation.start(ScanState::Processing);

        assert_eq!(
            animation.step(AnimationKind::BorderRotation, ScanState::Scanning),
            None
        );
        assert_eq!(animation.quarter_turns(), 0);
        assert!(!animation.is_running(AnimationKind::BorderRotation));

        // The other chain is independent until its own step comes due
        assert!(animation.is_running(AnimationKind::BlurPulse));
        assert_eq!(animation.step(AnimationKind::BlurPulse, ScanState::Scanning), None);
        assert_eq!(animation.blur(), BlurIntensity::ExtraLight);

        // Stale callbacks after the end are ignored
        assert_eq!(animation.step(AnimationKind::BlurPulse, ScanState::Processing), None);
    }
}

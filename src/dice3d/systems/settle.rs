//! Settling detection
//!
//! A roll is done once every die has stayed below both velocity thresholds
//! for a run of consecutive physics steps. A ceiling on accumulated frame
//! time forces completion so a die that never quite stops cannot hang the
//! roll.

use crate::dice3d::tray::BodyState;
use crate::dice3d::types::SettleSettings;

/// Where a roll stands with respect to settling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleStatus {
    Moving,
    Settled,
    /// Still moving, but the timeout elapsed.
    TimedOut,
}

#[derive(Clone, Debug)]
pub struct SettleTracker {
    linear_threshold: f32,
    angular_threshold: f32,
    required_frames: u32,
    timeout_seconds: f32,
    calm_frames: u32,
    elapsed: f32,
}

impl SettleTracker {
    pub fn new(settings: &SettleSettings) -> Self {
        Self {
            linear_threshold: settings.linear_threshold,
            angular_threshold: settings.angular_threshold,
            required_frames: settings.required_frames.max(1),
            timeout_seconds: settings.timeout_seconds,
            calm_frames: 0,
            elapsed: 0.0,
        }
    }

    /// Whether a single body is at rest.
    pub fn is_settled(&self, state: &BodyState) -> bool {
        state.linear_velocity.length() < self.linear_threshold
            && state.angular_velocity.length() < self.angular_threshold
    }

    /// Record one physics step. Any moving die restarts the count.
    pub fn observe_step<'a>(&mut self, states: impl IntoIterator<Item = &'a BodyState>) {
        let mut all_settled = true;
        for state in states {
            if !self.is_settled(state) {
                all_settled = false;
                break;
            }
        }

        if all_settled {
            self.calm_frames = self.calm_frames.saturating_add(1);
        } else {
            self.calm_frames = 0;
        }
    }

    /// Add host frame time toward the timeout. This is the raw frame delta,
    /// not the clamped simulation time.
    pub fn add_elapsed(&mut self, seconds: f32) {
        if seconds.is_finite() && seconds > 0.0 {
            self.elapsed += seconds;
        }
    }

    pub fn status(&self) -> SettleStatus {
        if self.calm_frames >= self.required_frames {
            SettleStatus::Settled
        } else if self.elapsed >= self.timeout_seconds {
            SettleStatus::TimedOut
        } else {
            SettleStatus::Moving
        }
    }

    pub fn calm_frames(&self) -> u32 {
        self.calm_frames
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn body(linear: f32, angular: f32) -> BodyState {
        BodyState {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::new(linear, 0.0, 0.0),
            angular_velocity: Vec3::new(0.0, angular, 0.0),
        }
    }

    fn tracker(required_frames: u32) -> SettleTracker {
        SettleTracker::new(&SettleSettings {
            required_frames,
            ..SettleSettings::default()
        })
    }

    #[test]
    fn test_single_body_thresholds() {
        let tracker = tracker(3);
        assert!(tracker.is_settled(&body(0.05, 0.05)));
        assert!(!tracker.is_settled(&body(0.2, 0.0)));
        assert!(!tracker.is_settled(&body(0.0, 0.2)));
    }

    #[test]
    fn test_requires_consecutive_calm_steps() {
        let mut tracker = tracker(3);
        let calm = [body(0.0, 0.0), body(0.01, 0.02)];
        let moving = [body(0.0, 0.0), body(1.0, 0.0)];

        tracker.observe_step(&calm);
        tracker.observe_step(&calm);
        assert_eq!(tracker.status(), SettleStatus::Moving);

        // A momentary bounce restarts the count.
        tracker.observe_step(&moving);
        assert_eq!(tracker.calm_frames(), 0);

        for _ in 0..3 {
            tracker.observe_step(&calm);
        }
        assert_eq!(tracker.status(), SettleStatus::Settled);
    }

    #[test]
    fn test_timeout_forces_completion() {
        let mut tracker = SettleTracker::new(&SettleSettings {
            timeout_seconds: 1.0,
            ..SettleSettings::default()
        });
        for _ in 0..9 {
            tracker.observe_step(&[body(5.0, 5.0)]);
            tracker.add_elapsed(0.1);
        }
        assert_eq!(tracker.status(), SettleStatus::Moving);

        tracker.add_elapsed(0.2);
        assert_eq!(tracker.status(), SettleStatus::TimedOut);
        assert!((tracker.elapsed() - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_settled_wins_over_timeout() {
        let mut tracker = tracker(1);
        tracker.add_elapsed(100.0);
        tracker.observe_step(&[body(0.0, 0.0)]);
        assert_eq!(tracker.status(), SettleStatus::Settled);
    }

    #[test]
    fn test_ignores_bad_frame_time() {
        let mut tracker = tracker(1);
        tracker.add_elapsed(f32::NAN);
        tracker.add_elapsed(-4.0);
        assert_eq!(tracker.elapsed(), 0.0);
    }
}

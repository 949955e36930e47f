//! Roll orchestration
//!
//! [`DiceEngine`] owns the tray, the dice currently in it and the one roll
//! that may be in flight. The host drives it from its render loop through
//! [`DiceEngine::frame`]; each `roll()` hands back a [`PendingRoll`] that
//! completes once the dice settle, the liveness timeout fires, or the roll
//! is cleared, replaced or torn down.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rapier3d::prelude::RigidBodyHandle;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

use crate::dice3d::meshes::die_model;
use crate::dice3d::notation;
use crate::dice3d::rng::SecureRng;
use crate::dice3d::systems::{
    resolve_readings, FaceReader, FaceReading, OrientationReader, SettleStatus, SettleTracker,
};
use crate::dice3d::throw_control::{plan_throw, PlannedDie, ThrowControl};
use crate::dice3d::tray::{BodySpec, BodyState, FixedStepper, Tray};
use crate::dice3d::types::*;
use crate::dice3d::visuals::{DiePose, DieVisuals, NullVisuals, VisualHandle, VisualSpec};

const EVENT_CAPACITY: usize = 64;

pub type RollOutcome = Result<DiceRollResult, RollError>;

/// Where the engine is in the roll lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollPhase {
    Idle,
    Spawning,
    Simulating,
    Settled,
    Resolved,
    Error,
    Destroyed,
}

/// Lifecycle notifications for renderers and host UI
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Ready,
    Rolling { expression: String, dice: usize },
    Resolved(DiceRollResult),
    Rejected(RollError),
    Cleared,
    Destroyed,
}

/// A die in the tray: its body and its visual, always disposed together.
#[derive(Clone, Copy, Debug)]
struct DieInstance {
    term: DiceTerm,
    role: DieRole,
    radius: f32,
    body: RigidBodyHandle,
    visual: VisualHandle,
}

struct ActiveRoll {
    expression: String,
    modifier: i32,
    settle: SettleTracker,
    sender: oneshot::Sender<RollOutcome>,
}

/// Completes with the outcome of one `roll()` call.
///
/// Resolves to [`RollError::EngineDestroyed`] if the engine goes away first.
#[must_use = "a roll's outcome is only observed through its PendingRoll"]
pub struct PendingRoll {
    receiver: oneshot::Receiver<RollOutcome>,
}

impl PendingRoll {
    fn settled(outcome: RollOutcome) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(outcome);
        Self { receiver }
    }

    /// Take the outcome if the roll has finished, without waiting.
    ///
    /// Returns `None` while the dice are still rolling. Once the outcome has
    /// been taken, later calls report `EngineDestroyed`.
    pub fn try_take(&mut self) -> Option<RollOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RollError::EngineDestroyed)),
        }
    }
}

impl Future for PendingRoll {
    type Output = RollOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RollError::EngineDestroyed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

pub struct DiceEngine<R: RngCore + CryptoRng = OsRng> {
    config: TrayConfig,
    throw_control: ThrowControl,
    rng: SecureRng<R>,
    reader: Box<dyn FaceReader>,
    visuals: Box<dyn DieVisuals>,
    tray: Option<Tray>,
    stepper: FixedStepper,
    dice: Vec<DieInstance>,
    active: Option<ActiveRoll>,
    phase: RollPhase,
    destroyed: bool,
    events: broadcast::Sender<EngineEvent>,
}

impl DiceEngine<OsRng> {
    /// Engine drawing throws from operating-system entropy. Call
    /// [`initialize`](Self::initialize) before rolling.
    pub fn new(config: TrayConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, SecureRng::os())
    }

    /// Build and initialize in one go.
    pub fn ready(config: TrayConfig) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config)?;
        engine.build_tray();
        Ok(engine)
    }
}

impl<R: RngCore + CryptoRng> DiceEngine<R> {
    pub fn with_rng(config: TrayConfig, rng: SecureRng<R>) -> Result<Self, ConfigError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            stepper: FixedStepper::new(&config.step),
            throw_control: ThrowControl::from(&config.throw),
            config,
            rng,
            reader: Box::new(OrientationReader),
            visuals: Box::new(NullVisuals::default()),
            tray: None,
            dice: Vec::new(),
            active: None,
            phase: RollPhase::Idle,
            destroyed: false,
            events,
        })
    }

    /// Replace how resting dice are read.
    pub fn with_reader(mut self, reader: impl FaceReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    /// Replace the visual collaborator.
    pub fn with_visuals(mut self, visuals: impl DieVisuals + 'static) -> Self {
        self.visuals = Box::new(visuals);
        self
    }

    /// Build the physics world. Rolling is refused until this has run.
    pub fn initialize(&mut self) -> Result<(), RollError> {
        if self.destroyed {
            return Err(RollError::EngineDestroyed);
        }
        if self.tray.is_none() {
            self.build_tray();
        }
        Ok(())
    }

    fn build_tray(&mut self) {
        self.tray = Some(Tray::new(&self.config.tray, self.config.step.dt));
        self.phase = RollPhase::Idle;
        info!(
            "Dice tray ready ({:.1} x {:.1}, dt {:.5})",
            self.config.tray.half_extent * 2.0,
            self.config.tray.half_extent * 2.0,
            self.config.step.dt
        );
        self.emit(EngineEvent::Ready);
    }

    pub fn is_ready(&self) -> bool {
        self.tray.is_some() && !self.destroyed
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn phase(&self) -> RollPhase {
        self.phase
    }

    pub fn config(&self) -> &TrayConfig {
        &self.config
    }

    pub fn throw_control(&self) -> &ThrowControl {
        &self.throw_control
    }

    pub fn set_throw_control(&mut self, control: ThrowControl) {
        self.throw_control = control;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Number of dice currently in the tray.
    pub fn dice_count(&self) -> usize {
        self.dice.len()
    }

    /// Whether a roll is still waiting for its dice.
    pub fn is_rolling(&self) -> bool {
        self.active.is_some()
    }

    /// Current pose of every die, keyed by its visual handle.
    pub fn die_poses(&self) -> Vec<(VisualHandle, DiePose)> {
        let Some(tray) = self.tray.as_ref() else {
            return Vec::new();
        };
        self.dice
            .iter()
            .filter_map(|die| {
                let state = tray.body_state(die.body).ok()?;
                Some((
                    die.visual,
                    DiePose {
                        position: state.position,
                        rotation: state.rotation,
                    },
                ))
            })
            .collect()
    }

    /// Throw the dice for `expression`.
    ///
    /// Parse failures reject immediately and leave the tray untouched. A roll
    /// still in flight is rejected with [`RollError::Superseded`] and its dice
    /// are removed before the new ones spawn.
    pub fn roll(&mut self, expression: &str) -> PendingRoll {
        match self.start_roll(expression) {
            Ok(receiver) => PendingRoll { receiver },
            Err(error) => {
                debug!("Roll `{}` rejected: {}", expression, error);
                self.emit(EngineEvent::Rejected(error.clone()));
                PendingRoll::settled(Err(error))
            }
        }
    }

    fn start_roll(&mut self, expression: &str) -> Result<oneshot::Receiver<RollOutcome>, RollError> {
        if self.destroyed {
            return Err(RollError::EngineDestroyed);
        }
        if self.tray.is_none() {
            return Err(RollError::EngineNotReady);
        }
        let parsed = notation::parse(expression)?;
        let planned = plan_throw(&parsed, &self.config, &self.throw_control, &mut self.rng)?;

        if let Some(previous) = self.active.take() {
            debug!("Roll `{}` superseded by `{}`", previous.expression, expression);
            self.reject(previous, RollError::Superseded);
        }
        self.dispose_dice();

        self.phase = RollPhase::Spawning;
        if let Err(error) = self.spawn_dice(&planned) {
            warn!("Failed to spawn dice for `{}`: {}", expression, error);
            self.dispose_dice();
            self.phase = RollPhase::Error;
            return Err(error);
        }

        let (sender, receiver) = oneshot::channel();
        self.active = Some(ActiveRoll {
            expression: expression.to_string(),
            modifier: parsed.modifier,
            settle: SettleTracker::new(&self.config.settle),
            sender,
        });
        self.stepper.reset();
        self.phase = RollPhase::Simulating;

        info!("Rolling `{}` with {} dice", expression, self.dice.len());
        self.emit(EngineEvent::Rolling {
            expression: expression.to_string(),
            dice: self.dice.len(),
        });
        Ok(receiver)
    }

    fn spawn_dice(&mut self, planned: &[PlannedDie]) -> Result<(), RollError> {
        let tray = self.tray.as_mut().ok_or(RollError::EngineNotReady)?;

        for (slot, die) in planned.iter().enumerate() {
            let dice_type = die.term.die;
            let spec = BodySpec {
                radius: die.radius,
                density: dice_type.density() * self.config.dice.density_scale,
                friction: self.config.dice.friction,
                restitution: self.config.dice.restitution,
            };
            let body = tray.spawn_die(die_model(dice_type.shape()), &spec, &die.plan)?;

            let tint = self.config.tint(die.role == DieRole::PercentileTens);
            let visual = self
                .visuals
                .create(&VisualSpec::new(dice_type, die.role, die.radius, tint));
            self.visuals.update(
                visual,
                DiePose {
                    position: die.plan.position,
                    rotation: die.plan.rotation,
                },
            );

            debug!(
                "Spawned {} ({:?}) in slot {} at {:?}",
                dice_type.name(),
                die.role,
                slot,
                die.plan.position
            );
            self.dice.push(DieInstance {
                term: die.term,
                role: die.role,
                radius: die.radius,
                body,
                visual,
            });
        }
        Ok(())
    }

    /// Render-loop callback: advance the physics by `frame_delta` seconds of
    /// host time, push poses to the visuals and settle the roll when done.
    pub fn frame(&mut self, frame_delta: f32) -> RollPhase {
        if self.destroyed || self.tray.is_none() {
            return self.phase;
        }

        let steps = self.stepper.advance(frame_delta);
        if let Some(active) = self.active.as_mut() {
            active.settle.add_elapsed(frame_delta);
        }

        for _ in 0..steps {
            if let Err(error) = self.step_once() {
                self.fail(error);
                return self.phase;
            }
        }

        for (visual, pose) in self.die_poses() {
            self.visuals.update(visual, pose);
        }

        let status = match self.active.as_ref() {
            Some(active) => active.settle.status(),
            None => return self.phase,
        };
        match status {
            SettleStatus::Moving => {}
            SettleStatus::Settled => {
                if let Some(active) = self.active.as_ref() {
                    debug!(
                        "Dice settled after {} calm steps ({:.2}s)",
                        active.settle.calm_frames(),
                        active.settle.elapsed()
                    );
                }
                self.finish(false);
            }
            SettleStatus::TimedOut => {
                warn!(
                    "Dice did not settle within {:.1}s; reading them as they lie",
                    self.config.settle.timeout_seconds
                );
                self.finish(true);
            }
        }
        self.phase
    }

    fn step_once(&mut self) -> Result<(), RollError> {
        let tray = self.tray.as_mut().ok_or(RollError::EngineDestroyed)?;
        tray.step();

        let mut states: Vec<BodyState> = Vec::with_capacity(self.dice.len());
        for die in &self.dice {
            tray.contain(die.body, die.radius)?;
            states.push(tray.body_state(die.body)?);
        }

        if let Some(active) = self.active.as_mut() {
            active.settle.observe_step(&states);
        }
        Ok(())
    }

    fn finish(&mut self, timed_out: bool) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.phase = RollPhase::Settled;

        match self.read_result(active.modifier, timed_out) {
            Ok(result) => {
                info!(
                    "Rolled `{}`: {} = {}",
                    active.expression,
                    result.breakdown.join(", "),
                    result.total
                );
                let _ = active.sender.send(Ok(result.clone()));
                self.phase = RollPhase::Resolved;
                self.emit(EngineEvent::Resolved(result));
            }
            Err(error) => {
                warn!("Could not read `{}`: {}", active.expression, error);
                self.phase = RollPhase::Error;
                self.reject(active, error);
            }
        }
    }

    fn read_result(&mut self, modifier: i32, timed_out: bool) -> RollOutcome {
        let tray = self.tray.as_ref().ok_or(RollError::EngineDestroyed)?;

        let mut readings = Vec::with_capacity(self.dice.len());
        for die in &self.dice {
            let state = tray.body_state(die.body)?;
            readings.push(FaceReading {
                term: die.term,
                role: die.role,
                raw: self.reader.read_face(die.term.die.shape(), state.rotation),
            });
        }

        let faces = resolve_readings(&readings)?;
        Ok(DiceRollResult::from_faces(&faces, modifier, timed_out))
    }

    fn fail(&mut self, error: RollError) {
        warn!("Physics fault: {}", error);
        self.phase = RollPhase::Error;
        if let Some(active) = self.active.take() {
            self.reject(active, error);
        }
    }

    fn reject(&self, active: ActiveRoll, error: RollError) {
        let _ = active.sender.send(Err(error.clone()));
        self.emit(EngineEvent::Rejected(error));
    }

    /// Remove every die and reject a roll still in flight with
    /// [`RollError::Cleared`]. Calling it again is a no-op.
    pub fn clear(&mut self) {
        if self.destroyed {
            return;
        }
        let had_roll = match self.active.take() {
            Some(active) => {
                self.reject(active, RollError::Cleared);
                true
            }
            None => false,
        };
        let had_dice = !self.dice.is_empty();
        self.dispose_dice();
        self.phase = RollPhase::Idle;

        if had_roll || had_dice {
            debug!("Tray cleared");
            self.emit(EngineEvent::Cleared);
        }
    }

    /// Tear the engine down. A pending roll rejects with
    /// [`RollError::EngineDestroyed`] and nothing touches the world again.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Some(active) = self.active.take() {
            self.reject(active, RollError::EngineDestroyed);
        }
        for die in self.dice.drain(..) {
            self.visuals.dispose(die.visual);
        }
        self.tray = None;
        self.phase = RollPhase::Destroyed;

        info!("Dice engine destroyed");
        self.emit(EngineEvent::Destroyed);
    }

    fn dispose_dice(&mut self) {
        for die in self.dice.drain(..) {
            if let Some(tray) = self.tray.as_mut() {
                tray.remove_die(die.body);
            }
            self.visuals.dispose(die.visual);
        }
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Roll and drive frames until the roll completes, yielding to the
    /// runtime between frames.
    ///
    /// Each frame counts as `frame_delta` seconds toward the settle timeout,
    /// however long it really took.
    pub async fn run_headless(&mut self, expression: &str, frame_delta: f32) -> RollOutcome {
        let frame_delta = if frame_delta.is_finite() && frame_delta > 0.0 {
            frame_delta
        } else {
            self.config.step.dt
        };

        let mut pending = self.roll(expression);
        loop {
            if let Some(outcome) = pending.try_take() {
                return outcome;
            }
            self.frame(frame_delta);
            tokio::task::yield_now().await;
        }
    }
}

impl<R: RngCore + CryptoRng> Drop for DiceEngine<R> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice3d::visuals::{RecordingVisuals, VisualCommand};
    use glam::Quat;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct FixedReader(Vec<u32>, usize);

    impl FaceReader for FixedReader {
        fn read_face(&mut self, _shape: DieShape, _rotation: Quat) -> u32 {
            let value = self.0[self.1 % self.0.len()];
            self.1 += 1;
            value
        }
    }

    fn seeded(config: TrayConfig) -> DiceEngine<StdRng> {
        let mut engine =
            DiceEngine::with_rng(config, SecureRng::from_rng(StdRng::seed_from_u64(42))).unwrap();
        engine.initialize().unwrap();
        engine
    }

    /// Settles as soon as anything is checked and times out quickly.
    fn quick_config() -> TrayConfig {
        let mut config = TrayConfig::default();
        config.settle.linear_threshold = f32::MAX;
        config.settle.angular_threshold = f32::MAX;
        config.settle.required_frames = 1;
        config
    }

    #[test]
    fn test_not_ready_before_initialize() {
        let mut engine = DiceEngine::new(TrayConfig::default()).unwrap();
        assert!(!engine.is_ready());
        let mut pending = engine.roll("1d6");
        assert_eq!(pending.try_take(), Some(Err(RollError::EngineNotReady)));

        engine.initialize().unwrap();
        assert!(engine.is_ready());
    }

    #[test]
    fn test_parse_failure_leaves_tray_untouched() {
        let mut engine = seeded(TrayConfig::default());
        let mut first = engine.roll("3d6");
        assert_eq!(engine.dice_count(), 3);

        let mut bad = engine.roll("1d7");
        assert_eq!(bad.try_take(), Some(Err(RollError::InvalidDie(7))));
        assert_eq!(engine.dice_count(), 3);
        assert!(engine.is_rolling());
        assert_eq!(first.try_take(), None);
    }

    #[test]
    fn test_roll_resolves_with_reader_values() {
        let mut engine = seeded(quick_config()).with_reader(FixedReader(vec![3, 4], 0));
        let mut pending = engine.roll("2d6+5");
        assert_eq!(engine.phase(), RollPhase::Simulating);

        engine.frame(1.0 / 60.0);
        let result = pending.try_take().unwrap().unwrap();
        assert_eq!(result.values, vec![3, 4]);
        assert_eq!(result.total, 12);
        assert!(!result.timed_out);
        assert_eq!(engine.phase(), RollPhase::Resolved);
    }

    #[test]
    fn test_percentile_roll_reads_pair() {
        let mut engine = seeded(quick_config()).with_reader(FixedReader(vec![0, 0], 0));
        let mut pending = engine.roll("1d100");
        assert_eq!(engine.dice_count(), 2);

        engine.frame(1.0 / 60.0);
        let result = pending.try_take().unwrap().unwrap();
        assert_eq!(result.values, vec![100]);
        assert_eq!(result.breakdown, vec!["d100:100"]);
    }

    #[test]
    fn test_new_roll_supersedes_pending() {
        let mut engine = seeded(TrayConfig::default());
        let mut first = engine.roll("4d6");
        let _second = engine.roll("1d20");

        assert_eq!(first.try_take(), Some(Err(RollError::Superseded)));
        assert_eq!(engine.dice_count(), 1);
    }

    #[test]
    fn test_clear_is_idempotent_and_disposes_both_halves() {
        let recorder = RecordingVisuals::new();
        let mut engine = seeded(TrayConfig::default()).with_visuals(recorder.clone());
        let mut events = engine.subscribe();

        let mut pending = engine.roll("2d8");
        assert_eq!(recorder.live().len(), 2);

        engine.clear();
        engine.clear();
        assert_eq!(pending.try_take(), Some(Err(RollError::Cleared)));
        assert_eq!(engine.dice_count(), 0);
        assert!(recorder.live().is_empty());
        assert_eq!(engine.phase(), RollPhase::Idle);

        let disposed = recorder
            .drain()
            .into_iter()
            .filter(|c| matches!(c, VisualCommand::Dispose { .. }))
            .count();
        assert_eq!(disposed, 2);

        assert!(matches!(events.try_recv(), Ok(EngineEvent::Rolling { dice: 2, .. })));
        assert!(matches!(
            events.try_recv(),
            Ok(EngineEvent::Rejected(RollError::Cleared))
        ));
        assert_eq!(events.try_recv().ok(), Some(EngineEvent::Cleared));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_destroy_rejects_pending_and_blocks_rolls() {
        let mut engine = seeded(TrayConfig::default());
        let mut pending = engine.roll("1d12");

        engine.destroy();
        assert_eq!(pending.try_take(), Some(Err(RollError::EngineDestroyed)));
        assert_eq!(engine.phase(), RollPhase::Destroyed);
        assert!(!engine.is_ready());

        assert_eq!(engine.frame(0.1), RollPhase::Destroyed);
        let mut later = engine.roll("1d6");
        assert_eq!(later.try_take(), Some(Err(RollError::EngineDestroyed)));
        assert_eq!(engine.initialize(), Err(RollError::EngineDestroyed));
    }

    #[test]
    fn test_drop_rejects_pending() {
        let mut engine = seeded(TrayConfig::default());
        let mut pending = engine.roll("1d4");
        drop(engine);
        assert_eq!(pending.try_take(), Some(Err(RollError::EngineDestroyed)));
    }

    #[test]
    fn test_timeout_resolves_moving_dice() {
        let mut config = TrayConfig::default();
        config.settle.linear_threshold = 0.0;
        config.settle.timeout_seconds = 0.5;
        let mut engine = seeded(config);
        let mut pending = engine.roll("1d20");

        for _ in 0..29 {
            engine.frame(1.0 / 60.0);
        }
        assert_eq!(pending.try_take(), None);

        for _ in 0..2 {
            engine.frame(1.0 / 60.0);
        }
        let result = pending.try_take().unwrap().unwrap();
        assert!(result.timed_out);
        assert!((1..=20).contains(&result.total));
    }
}

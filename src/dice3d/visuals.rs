//! Visual collaborator seam
//!
//! The engine owns the physical half of each die; whatever draws dice owns
//! the visual half behind [`DieVisuals`]. Both halves are created at spawn
//! and disposed together.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use glam::{Quat, Vec3};

use crate::dice3d::meshes::{die_model, label_text};
use crate::dice3d::types::{DiceType, DieRole, DieShape};

/// Opaque id of one die's visual half
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisualHandle(pub u64);

/// One face label: text drawn at `position`, facing along `normal`.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLabel {
    pub text: String,
    pub position: Vec3,
    pub normal: Vec3,
}

/// Everything a renderer needs to build one die
#[derive(Clone, Debug, PartialEq)]
pub struct VisualSpec {
    pub die: DiceType,
    pub shape: DieShape,
    pub role: DieRole,
    pub radius: f32,
    /// Linear RGBA.
    pub tint: [f32; 4],
    pub labels: Vec<FaceLabel>,
}

impl VisualSpec {
    pub fn new(die: DiceType, role: DieRole, radius: f32, tint: [f32; 4]) -> Self {
        let shape = die.shape();
        let labels = die_model(shape)
            .faces
            .iter()
            .map(|face| FaceLabel {
                text: label_text(shape, role, face.value),
                position: face.centroid * radius,
                normal: face.normal,
            })
            .collect();

        Self {
            die,
            shape,
            role,
            radius,
            tint,
            labels,
        }
    }
}

/// World pose of a die body
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiePose {
    pub position: Vec3,
    pub rotation: Quat,
}

pub trait DieVisuals {
    fn create(&mut self, spec: &VisualSpec) -> VisualHandle;
    fn update(&mut self, handle: VisualHandle, pose: DiePose);
    fn dispose(&mut self, handle: VisualHandle);
}

/// Headless visuals: hands out ids and draws nothing.
#[derive(Debug, Default)]
pub struct NullVisuals {
    next: u64,
}

impl DieVisuals for NullVisuals {
    fn create(&mut self, _spec: &VisualSpec) -> VisualHandle {
        self.next += 1;
        VisualHandle(self.next)
    }

    fn update(&mut self, _handle: VisualHandle, _pose: DiePose) {}

    fn dispose(&mut self, _handle: VisualHandle) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum VisualCommand {
    Create {
        handle: VisualHandle,
        spec: VisualSpec,
    },
    Update {
        handle: VisualHandle,
        pose: DiePose,
    },
    Dispose {
        handle: VisualHandle,
    },
}

#[derive(Debug, Default)]
struct Recording {
    next: u64,
    commands: Vec<VisualCommand>,
    live: BTreeSet<VisualHandle>,
}

/// Queues every visual command for someone else to replay.
///
/// Clones share one queue, so a renderer can keep a clone while the engine
/// owns the original.
#[derive(Clone, Debug, Default)]
pub struct RecordingVisuals {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingVisuals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued command, oldest first.
    pub fn drain(&self) -> Vec<VisualCommand> {
        std::mem::take(&mut self.inner.borrow_mut().commands)
    }

    /// Handles created and not yet disposed.
    pub fn live(&self) -> Vec<VisualHandle> {
        self.inner.borrow().live.iter().copied().collect()
    }
}

impl DieVisuals for RecordingVisuals {
    fn create(&mut self, spec: &VisualSpec) -> VisualHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next += 1;
        let handle = VisualHandle(inner.next);
        inner.live.insert(handle);
        inner.commands.push(VisualCommand::Create {
            handle,
            spec: spec.clone(),
        });
        handle
    }

    fn update(&mut self, handle: VisualHandle, pose: DiePose) {
        let mut inner = self.inner.borrow_mut();
        if inner.live.contains(&handle) {
            inner.commands.push(VisualCommand::Update { handle, pose });
        }
    }

    fn dispose(&mut self, handle: VisualHandle) {
        let mut inner = self.inner.borrow_mut();
        if inner.live.remove(&handle) {
            inner.commands.push(VisualCommand::Dispose { handle });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_labels_every_face() {
        let spec = VisualSpec::new(DiceType::D100, DieRole::PercentileTens, 0.4, [1.0; 4]);
        assert_eq!(spec.shape, DieShape::Trapezohedron);
        assert_eq!(spec.labels.len(), 10);
        assert!(spec.labels.iter().any(|l| l.text == "00"));
        assert!(spec.labels.iter().all(|l| l.position.length() <= 0.4 + 1e-5));
    }

    #[test]
    fn test_recording_tracks_live_handles() {
        let recorder = RecordingVisuals::new();
        let mut visuals = recorder.clone();
        let spec = VisualSpec::new(DiceType::D6, DieRole::Single, 0.35, [1.0; 4]);

        let a = visuals.create(&spec);
        let b = visuals.create(&spec);
        assert_ne!(a, b);
        assert_eq!(recorder.live(), vec![a, b]);

        visuals.dispose(a);
        visuals.dispose(a);
        visuals.update(
            a,
            DiePose {
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            },
        );
        assert_eq!(recorder.live(), vec![b]);

        let commands = recorder.drain();
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[2], VisualCommand::Dispose { handle } if handle == a));
        assert!(recorder.drain().is_empty());
    }
}

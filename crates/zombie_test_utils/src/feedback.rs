//! A feedback sink that remembers every call.

use glam::Vec3;
use zombie_core::components::{EntityId, MotionState, PlacementState};
use zombie_core::feedback::{FeedbackSink, SoundEffect};
use zombie_core::selection::SelectionChanged;

/// One recorded feedback call.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    /// `show_selection`
    Selection(EntityId, bool),
    /// `show_destination`
    Destination(Option<Vec3>),
    /// `play`
    Sound(SoundEffect),
    /// `resources_changed`
    Resources(Vec<(String, i64)>),
    /// `selection_changed`
    SelectionChanged(SelectionChanged),
    /// `placement_preview`
    Preview(PlacementState, Option<Vec3>),
    /// `motion_changed`
    Motion(EntityId, MotionState),
}

/// Records feedback in call order.
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    /// Every call so far.
    pub calls: Vec<Feedback>,
}

impl RecordingFeedback {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sounds played, in order.
    #[must_use]
    pub fn sounds(&self) -> Vec<SoundEffect> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Feedback::Sound(effect) => Some(*effect),
                _ => None,
            })
            .collect()
    }

    /// How many times `effect` was played.
    #[must_use]
    pub fn count(&self, effect: SoundEffect) -> usize {
        self.sounds().iter().filter(|e| **e == effect).count()
    }

    /// Most recent resource snapshot.
    #[must_use]
    pub fn last_resources(&self) -> Option<&[(String, i64)]> {
        self.calls.iter().rev().find_map(|call| match call {
            Feedback::Resources(snapshot) => Some(snapshot.as_slice()),
            _ => None,
        })
    }

    /// Most recent selection notification.
    #[must_use]
    pub fn last_selection(&self) -> Option<&SelectionChanged> {
        self.calls.iter().rev().find_map(|call| match call {
            Feedback::SelectionChanged(change) => Some(change),
            _ => None,
        })
    }

    /// Most recent placement preview state.
    #[must_use]
    pub fn last_preview(&self) -> Option<PlacementState> {
        self.calls.iter().rev().find_map(|call| match call {
            Feedback::Preview(state, _) => Some(*state),
            _ => None,
        })
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl FeedbackSink for RecordingFeedback {
    fn show_selection(&mut self, entity: EntityId, shown: bool) {
        self.calls.push(Feedback::Selection(entity, shown));
    }

    fn show_destination(&mut self, point: Option<Vec3>) {
        self.calls.push(Feedback::Destination(point));
    }

    fn play(&mut self, effect: SoundEffect) {
        self.calls.push(Feedback::Sound(effect));
    }

    fn resources_changed(&mut self, snapshot: &[(String, i64)]) {
        self.calls.push(Feedback::Resources(snapshot.to_vec()));
    }

    fn selection_changed(&mut self, change: &SelectionChanged) {
        self.calls.push(Feedback::SelectionChanged(change.clone()));
    }

    fn placement_preview(&mut self, state: PlacementState, position: Option<Vec3>) {
        self.calls.push(Feedback::Preview(state, position));
    }

    fn motion_changed(&mut self, entity: EntityId, state: MotionState) {
        self.calls.push(Feedback::Motion(entity, state));
    }
}

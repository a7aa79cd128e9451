// trainer-core/src/lib.rs

//! The core logic for the interval ear-training exercises.
//! This crate maps note ranges to playable pitch sequences, names arbitrary
//! frequencies, and drives challenge progression. It never produces sound
//! itself: it talks to a synthesis engine through the `audio` façade, and it
//! is completely headless.

pub mod audio;
pub mod bootstrap;
pub mod challenge;
pub mod error;
pub mod interval;
pub mod progression;
pub mod session;
pub mod store;
pub mod tuning;

pub use audio::{AudioControl, Pitch, RecordingEngine, SynthEngine, VoiceRole, VoiceSpec};
pub use bootstrap::{BootStatus, Bootstrap};
pub use challenge::{Challenge, ChallengeList, SliderRange};
pub use error::{TrainerError, TrainerResult};
pub use interval::{StepSpec, resolve_step};
pub use progression::{ChallengeStatus, Progression, SavedProgress};
pub use session::{SliderState, SubmitOutcome, TrainingSession};
pub use store::{JsonFileStore, MemoryStore, ProgressStore};
pub use tuning::{
    NoteWithDelta, PitchSequence, build_pitch_sequence, frequency_to_nearest_note,
    midi_to_frequency, midi_to_note, note_to_midi,
};

//! # Error Types
//!
//! Every fallible operation in the core returns [`TrainerResult`]. Parsing and
//! range-construction errors always propagate to the caller; nothing in this
//! crate substitutes a default value for bad input.

use thiserror::Error;

use crate::audio::VoiceRole;

/// Result type for trainer operations.
pub type TrainerResult<T> = Result<T, TrainerError>;

/// Errors produced by the pitch mapper, progression engine and audio façade.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// A note name that is not valid scientific pitch notation.
    #[error("invalid note name: '{name}'")]
    InvalidNoteName { name: String },

    /// Frequency was zero, negative or not finite.
    #[error("invalid frequency: {freq} Hz")]
    InvalidFrequency { freq: f64 },

    /// The low end of a range sits above the high end.
    #[error("invalid range: {min} is above {max}")]
    InvalidRange { min: String, max: String },

    /// Step is not finite, or too small to produce a bounded sequence.
    #[error("invalid step: {step} semitones")]
    InvalidStep { step: f64 },

    /// A named step that is not in the interval vocabulary.
    #[error("unknown interval name: '{name}'")]
    UnknownIntervalName { name: String },

    /// Index out of bounds, or the challenge list is empty.
    #[error("challenge not found at index {index}")]
    ChallengeNotFound { index: usize },

    /// Attack or release attempted before the engine bootstrap completed.
    #[error("synthesis engine is not ready")]
    EngineNotReady,

    /// The engine's voice pool has no voice for this synth id.
    #[error("no voice for synth id {synth_id}")]
    VoiceNotFound { synth_id: u32 },

    /// Two musical roles were bound to the same voice.
    #[error("sweep and drone both bound to synth id {synth_id}")]
    VoiceAliased { synth_id: u32 },

    /// A role-level call made before any voice was bound to that role.
    #[error("no voice bound to the {role} role")]
    RoleUnbound { role: VoiceRole },

    /// Play or submit attempted on a challenge that is still locked.
    #[error("challenge at index {index} is locked")]
    ChallengeLocked { index: usize },

    #[error("duplicate challenge id {id}")]
    DuplicateChallengeId { id: u32 },

    /// A challenge record that decoded but failed validation.
    #[error("challenge {id} is invalid: {source}")]
    InvalidChallenge {
        id: u32,
        #[source]
        source: Box<TrainerError>,
    },

    /// Challenge data that is not a well-formed list of records.
    #[error("malformed challenge data: {0}")]
    MalformedChallenges(#[source] serde_json::Error),

    #[error("slider position {position} is outside 0..{len}")]
    SliderOutOfRange { position: usize, len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Saved progress that could not be encoded or decoded.
    #[error("progress file error: {0}")]
    Persistence(#[source] serde_json::Error),
}

impl TrainerError {
    /// Wraps a validation failure with the id of the offending challenge.
    pub fn in_challenge(id: u32, source: TrainerError) -> Self {
        Self::InvalidChallenge {
            id,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_challenge_names_the_id_and_cause() {
        let err = TrainerError::in_challenge(
            7,
            TrainerError::UnknownIntervalName {
                name: "P99".into(),
            },
        );
        let message = err.to_string();
        assert!(message.contains("challenge 7"));
        assert!(message.contains("P99"));
    }
}

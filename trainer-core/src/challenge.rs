//! # Challenge Definitions
//!
//! Challenge records arrive from outside the trainer as a JSON array. This
//! module decodes them and rejects anything the rest of the engine could not
//! play: unparseable notes, inverted ranges, unknown step names, duplicate ids.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;

use crate::error::{TrainerError, TrainerResult};
use crate::interval::StepSpec;
use crate::tuning::{self, PitchSequence};

/// The notes at either end of a challenge's slider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderRange {
    pub min: String,
    pub max: String,
}

/// A single ear-training exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: u32,
    /// Snake-case name, e.g. "perfect_fifth"
    pub name: String,
    /// Note the slider starts on
    pub slider_initial_tone: String,
    pub slider_range: SliderRange,
    pub slider_step: StepSpec,
    /// Voice that plays the pitch under the learner's control
    pub slider_synth_id: u32,
    /// Voice that sustains the reference pitch
    pub drone_synth_id: u32,
    pub drone_note: String,
    /// Label of the interval the learner is looking for, e.g. "P5"
    pub interval: String,
}

impl Challenge {
    /// Checks that every note parses, the range is ordered, the step
    /// resolves and the two voices are distinct.
    pub fn validate(&self) -> TrainerResult<()> {
        self.check().map_err(|e| TrainerError::in_challenge(self.id, e))
    }

    fn check(&self) -> TrainerResult<()> {
        self.pitch_sequence()?;
        tuning::note_to_midi(&self.slider_initial_tone)?;
        tuning::note_to_midi(&self.drone_note)?;
        if self.slider_synth_id == self.drone_synth_id {
            return Err(TrainerError::VoiceAliased {
                synth_id: self.slider_synth_id,
            });
        }
        Ok(())
    }

    pub fn step_semitones(&self) -> TrainerResult<f64> {
        self.slider_step.semitones()
    }

    /// Frequencies the slider moves across for this challenge.
    pub fn pitch_sequence(&self) -> TrainerResult<PitchSequence> {
        tuning::build_pitch_sequence(
            &self.slider_range.min,
            &self.slider_range.max,
            self.step_semitones()?,
        )
    }

    /// Human-readable title: "perfect_fifth" becomes "Perfect Fifth".
    pub fn display_title(&self) -> String {
        self.name
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The ordered set of challenges. Order is the unlock order.
///
/// Always holds at least one challenge, and every id is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeList {
    challenges: Vec<Challenge>,
}

impl ChallengeList {
    /// Validates every challenge and the list as a whole.
    ///
    /// # Errors
    /// * `ChallengeNotFound` - the list is empty
    /// * `DuplicateChallengeId` - two challenges share an id
    /// * `InvalidChallenge` - a record failed [`Challenge::validate`]
    pub fn new(challenges: Vec<Challenge>) -> TrainerResult<Self> {
        if challenges.is_empty() {
            return Err(TrainerError::ChallengeNotFound { index: 0 });
        }

        let mut seen = BTreeSet::new();
        for challenge in &challenges {
            if !seen.insert(challenge.id) {
                return Err(TrainerError::DuplicateChallengeId { id: challenge.id });
            }
            challenge.validate()?;
        }

        Ok(Self { challenges })
    }

    /// Decodes and validates a JSON array of challenge records.
    pub fn from_json(json: &str) -> TrainerResult<Self> {
        let challenges: Vec<Challenge> =
            serde_json::from_str(json).map_err(TrainerError::MalformedChallenges)?;
        Self::new(challenges)
    }

    pub fn from_reader<R: Read>(reader: R) -> TrainerResult<Self> {
        let challenges: Vec<Challenge> =
            serde_json::from_reader(reader).map_err(TrainerError::MalformedChallenges)?;
        Self::new(challenges)
    }

    pub fn get(&self, index: usize) -> TrainerResult<&Challenge> {
        self.challenges
            .get(index)
            .ok_or(TrainerError::ChallengeNotFound { index })
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter()
    }

    pub fn as_slice(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn ids(&self) -> Vec<u32> {
        self.challenges.iter().map(|c| c.id).collect()
    }

    pub fn position_of(&self, id: u32) -> Option<usize> {
        self.challenges.iter().position(|c| c.id == id)
    }
}

//! # Training Session
//!
//! Ties the pieces together for one learner: the challenge list, the
//! progression, the slider of the active challenge, the audio façade and the
//! progress store. Every user action is a method call that runs to
//! completion; nothing here reacts to state changes on its own.
//!
//! ## Flow
//! 1. [`TrainingSession::new`] restores progress and prepares the slider.
//! 2. Once the engine bootstrap finishes, [`TrainingSession::engine_ready`]
//!    opens the audio gate and starts the drone.
//! 3. [`TrainingSession::slide_to`] moves the sweep pitch.
//! 4. [`TrainingSession::submit`] completes the challenge and moves on.

use crate::audio::{AudioControl, Pitch, SynthEngine};
use crate::bootstrap::{BootStatus, Bootstrap};
use crate::challenge::{Challenge, ChallengeList};
use crate::error::{TrainerError, TrainerResult};
use crate::progression::{ChallengeStatus, Progression};
use crate::store::ProgressStore;
use crate::tuning::{self, NoteWithDelta, PitchSequence};

/// The slider of the active challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderState {
    challenge_id: u32,
    sequence: PitchSequence,
    notes: Vec<NoteWithDelta>,
    position: usize,
    drone_frequency: f64,
}

impl SliderState {
    /// Builds the slider for `challenge`, placed on its initial tone.
    ///
    /// The initial position is the point labelled with the initial tone. If
    /// the step skips that note, the point nearest to it is used instead.
    pub fn for_challenge(challenge: &Challenge) -> TrainerResult<Self> {
        let sequence = challenge.pitch_sequence()?;
        let notes = sequence.notes()?;

        let initial_midi = tuning::note_to_midi(&challenge.slider_initial_tone)?;
        let initial_frequency = tuning::midi_to_frequency(initial_midi as f64);
        let position = notes
            .iter()
            .position(|note| note.midi == initial_midi && note.delta_cents.abs() < 1.0)
            .or_else(|| sequence.position_nearest(initial_frequency))
            .unwrap_or(0);

        let drone_midi = tuning::note_to_midi(&challenge.drone_note)?;

        Ok(Self {
            challenge_id: challenge.id,
            sequence,
            notes,
            position,
            drone_frequency: tuning::midi_to_frequency(drone_midi as f64),
        })
    }

    pub fn challenge_id(&self) -> u32 {
        self.challenge_id
    }

    pub fn sequence(&self) -> &PitchSequence {
        &self.sequence
    }

    pub fn notes(&self) -> &[NoteWithDelta] {
        &self.notes
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn current_note(&self) -> &NoteWithDelta {
        &self.notes[self.position]
    }

    pub fn current_frequency(&self) -> f64 {
        self.sequence.frequencies()[self.position]
    }

    /// Distance from the drone to the slider pitch, in cents.
    pub fn cents_from_drone(&self) -> f64 {
        tuning::cents_between(self.current_frequency(), self.drone_frequency)
    }

    fn check_position(&self, position: usize) -> TrainerResult<()> {
        if position < self.notes.len() {
            Ok(())
        } else {
            Err(TrainerError::SliderOutOfRange {
                position,
                len: self.notes.len(),
            })
        }
    }
}

/// What a submit changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// The challenge was not completed before this submit
    pub newly_completed: bool,
    /// The pointer moved on to another challenge
    pub advanced: bool,
    /// Every challenge is done and the pointer is on the last one
    pub terminal: bool,
}

/// One learner working through a challenge list.
#[derive(Debug)]
pub struct TrainingSession<E: SynthEngine, S: ProgressStore> {
    challenges: ChallengeList,
    progression: Progression,
    audio: AudioControl<E>,
    store: S,
    slider: SliderState,
}

impl<E: SynthEngine, S: ProgressStore> TrainingSession<E, S> {
    /// Restores saved progress and prepares the active challenge.
    ///
    /// A store that cannot be read is logged and treated as empty.
    pub fn new(challenges: ChallengeList, engine: E, store: S) -> TrainerResult<Self> {
        let saved = match store.load() {
            Ok(saved) => saved,
            Err(e) => {
                eprintln!("[SESSION] Could not read saved progress, starting fresh: {}", e);
                None
            }
        };
        let progression = Progression::restore(&challenges, saved);
        let current = challenges.get(progression.current_index())?;
        let slider = SliderState::for_challenge(current)?;

        let mut audio = AudioControl::new(engine);
        audio.bind_roles(current.slider_synth_id, current.drone_synth_id)?;

        eprintln!(
            "[SESSION] Loaded {} challenges, resuming at index {}",
            challenges.len(),
            progression.current_index()
        );
        Ok(Self {
            challenges,
            progression,
            audio,
            store,
            slider,
        })
    }

    pub fn challenges(&self) -> &ChallengeList {
        &self.challenges
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn audio(&self) -> &AudioControl<E> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioControl<E> {
        &mut self.audio
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn slider(&self) -> &SliderState {
        &self.slider
    }

    pub fn current_challenge(&self) -> TrainerResult<&Challenge> {
        self.challenges.get(self.progression.current_index())
    }

    pub fn current_status(&self) -> ChallengeStatus {
        self.progression.status(self.progression.current_index())
    }

    /// Opens the audio gate and starts the drone of the active challenge.
    pub fn engine_ready(&mut self) {
        if self.audio.is_ready() {
            return;
        }
        self.audio.mark_ready();
        self.start_drone_if_unlocked();
    }

    /// Polls a bootstrap and calls [`Self::engine_ready`] when it reports
    /// success.
    pub fn poll_bootstrap(&mut self, bootstrap: &mut Bootstrap) -> BootStatus {
        let status = bootstrap.poll();
        if status == BootStatus::Ready {
            self.engine_ready();
        }
        status
    }

    /// Moves the slider and plays the new pitch on the sweep voice.
    ///
    /// # Errors
    /// * `ChallengeLocked` - the active challenge is not unlocked yet
    /// * `EngineNotReady` - the engine has not finished starting; the slider
    ///   does not move
    /// * `SliderOutOfRange` - `position` is past the end of the slider
    pub fn slide_to(&mut self, position: usize) -> TrainerResult<&NoteWithDelta> {
        self.ensure_unlocked()?;
        if !self.audio.is_ready() {
            return Err(TrainerError::EngineNotReady);
        }
        self.slider.check_position(position)?;
        self.slider.position = position;

        let pitch = Pitch::from_frequency(self.slider.current_frequency())?;
        report(self.audio.play_sweep(pitch), "play sweep");
        Ok(self.slider.current_note())
    }

    /// Silences both the sweep and the drone.
    pub fn stop(&mut self) -> TrainerResult<()> {
        if !self.audio.is_ready() {
            return Err(TrainerError::EngineNotReady);
        }
        report(self.audio.stop_sweep(), "stop sweep");
        report(self.audio.stop_role_drone(), "stop drone");
        Ok(())
    }

    /// (Re)starts the drone of the active challenge.
    pub fn start(&mut self) -> TrainerResult<()> {
        self.ensure_unlocked()?;
        let note = self.current_challenge()?.drone_note.clone();
        match self.audio.start_role_drone(&note) {
            Err(TrainerError::EngineNotReady) => Err(TrainerError::EngineNotReady),
            other => {
                report(other, "start drone");
                Ok(())
            }
        }
    }

    /// Completes the active challenge and moves to the next unfinished one.
    ///
    /// A locked challenge is refused with `ChallengeLocked` and nothing
    /// changes.
    pub fn submit(&mut self) -> TrainerResult<SubmitOutcome> {
        self.ensure_unlocked()?;
        let newly_completed = self.progression.mark_complete();
        let advanced = self.progression.advance();
        if newly_completed {
            eprintln!(
                "[SESSION] Completed challenge {} ({}/{})",
                self.slider.challenge_id,
                self.progression.completed_count(),
                self.progression.len()
            );
        }
        if advanced {
            self.enter_current_challenge(false)?;
        }
        if newly_completed || advanced {
            self.persist();
        }
        Ok(SubmitOutcome {
            newly_completed,
            advanced,
            terminal: self.progression.is_terminal(),
        })
    }

    pub fn navigate_prev(&mut self) -> TrainerResult<bool> {
        let moved = self.progression.navigate_prev();
        self.after_navigation(moved)
    }

    pub fn navigate_next(&mut self) -> TrainerResult<bool> {
        let moved = self.progression.navigate_next();
        self.after_navigation(moved)
    }

    /// Silences everything and forgets all progress. The slider goes back to
    /// the initial tone of the first challenge.
    pub fn reset(&mut self) -> TrainerResult<()> {
        eprintln!("[SESSION] Resetting progress");
        self.audio.stop_all();
        self.progression.reset();
        self.enter_current_challenge(true)?;
        self.persist();
        Ok(())
    }

    fn after_navigation(&mut self, moved: bool) -> TrainerResult<bool> {
        if moved {
            self.enter_current_challenge(false)?;
            self.persist();
        }
        Ok(moved)
    }

    /// Swaps audio and slider over to whatever challenge the pointer is on.
    /// The slider keeps its position when the challenge is unchanged, unless
    /// `fresh_slider` is set.
    fn enter_current_challenge(&mut self, fresh_slider: bool) -> TrainerResult<()> {
        if self.audio.is_ready() {
            report(self.audio.stop_sweep(), "stop sweep");
            report(self.audio.stop_role_drone(), "stop drone");
        }

        let current = self.challenges.get(self.progression.current_index())?;
        if fresh_slider || current.id != self.slider.challenge_id {
            self.slider = SliderState::for_challenge(current)?;
        }
        self.audio
            .bind_roles(current.slider_synth_id, current.drone_synth_id)?;

        self.start_drone_if_unlocked();
        Ok(())
    }

    fn ensure_unlocked(&self) -> TrainerResult<()> {
        if self.current_status() == ChallengeStatus::Locked {
            return Err(TrainerError::ChallengeLocked {
                index: self.progression.current_index(),
            });
        }
        Ok(())
    }

    fn start_drone_if_unlocked(&mut self) {
        if !self.audio.is_ready() || self.current_status() == ChallengeStatus::Locked {
            return;
        }
        let Ok(current) = self.challenges.get(self.progression.current_index()) else {
            return;
        };
        let note = current.drone_note.clone();
        report(self.audio.start_role_drone(&note), "start drone");
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.progression.snapshot()) {
            eprintln!("[SESSION] Error saving progress: {}", e);
        }
    }
}

/// Logs an audio failure. The session carries on without sound.
fn report(result: TrainerResult<()>, action: &str) {
    if let Err(e) = result {
        eprintln!("[AUDIO] Could not {}: {}", action, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingEngine;
    use crate::challenge::tests::sample;
    use crate::interval::StepSpec;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn slider_starts_on_the_initial_tone() {
        let mut challenge = sample(1);
        challenge.slider_initial_tone = "G4".into();
        let slider = SliderState::for_challenge(&challenge).unwrap();
        assert_eq!(slider.len(), 13);
        assert_eq!(slider.position(), 7);
        assert_eq!(slider.current_note().note_name, "G4");
        assert!((slider.cents_from_drone() - 700.0).abs() < 1e-6);
    }

    #[test]
    fn slider_falls_back_to_the_nearest_point() {
        let mut challenge = sample(1);
        challenge.slider_step = StepSpec::Named("tone".into());
        challenge.slider_initial_tone = "C#4".into();
        let slider = SliderState::for_challenge(&challenge).unwrap();
        // C4, D4, E4, ... ; C#4 sits between the first two points.
        assert!(slider.position() <= 1);

        challenge.slider_initial_tone = "C8".into();
        let slider = SliderState::for_challenge(&challenge).unwrap();
        assert_eq!(slider.position(), slider.len() - 1);
    }

    #[test]
    fn flat_spelling_finds_the_sharp_label() {
        let mut challenge = sample(1);
        challenge.slider_initial_tone = "Bb4".into();
        let slider = SliderState::for_challenge(&challenge).unwrap();
        assert_eq!(slider.current_note().note_name, "A#4");
    }

    #[test]
    fn sliding_before_ready_is_rejected() {
        let list = ChallengeList::new(vec![sample(1)]).unwrap();
        let mut session =
            TrainingSession::new(list, RecordingEngine::default(), MemoryStore::default()).unwrap();
        assert!(matches!(session.slide_to(3), Err(TrainerError::EngineNotReady)));
        assert_eq!(session.slider().position(), 0);
    }

    #[test]
    fn sliding_past_the_end_is_rejected() {
        let list = ChallengeList::new(vec![sample(1)]).unwrap();
        let mut session =
            TrainingSession::new(list, RecordingEngine::default(), MemoryStore::default()).unwrap();
        session.engine_ready();
        assert!(matches!(
            session.slide_to(13),
            Err(TrainerError::SliderOutOfRange { position: 13, len: 13 })
        ));
    }
}

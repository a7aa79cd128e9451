//! # Audio Control Module
//!
//! The trainer never synthesizes sound itself. It drives an external
//! [`SynthEngine`] through [`AudioControl`], which owns the bookkeeping of
//! what each voice is sounding.
//!
//! ## Guarantees
//! - Synth ids map directly onto voices in the engine's pool (no wrapping).
//! - A monophonic voice is released before it is attacked again.
//! - Releasing a polyphonic voice releases every note it holds.
//! - Moving the sweep always releases the previous sweep pitch first.
//! - Attack and release are rejected until the engine bootstrap completes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{TrainerError, TrainerResult};
use crate::tuning;

/// Oscillator shape of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Oscillator {
    Sine,
    Triangle,
    Sawtooth,
    FatSawtooth,
}

/// Attack and release times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: f32,
    pub release: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polyphony {
    Mono,
    Poly,
}

/// One voice of the engine's pool, addressed by synth id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSpec {
    pub synth_id: u32,
    pub oscillator: Oscillator,
    pub envelope: Envelope,
    pub polyphony: Polyphony,
}

/// The four voices challenge data is written against.
pub fn default_voice_pool() -> Vec<VoiceSpec> {
    let voice = |synth_id, oscillator, attack, release, polyphony| VoiceSpec {
        synth_id,
        oscillator,
        envelope: Envelope { attack, release },
        polyphony,
    };
    vec![
        voice(0, Oscillator::Sawtooth, 0.01, 0.2, Polyphony::Mono),
        voice(1, Oscillator::Triangle, 0.05, 0.1, Polyphony::Mono),
        voice(2, Oscillator::Sine, 1.0, 2.0, Polyphony::Poly),
        voice(3, Oscillator::FatSawtooth, 0.4, 1.2, Polyphony::Poly),
    ]
}

/// A pitch as handed to the engine: a display label and its frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Pitch {
    /// Note name, with a cents suffix when off the equal-tempered grid
    /// (e.g., "A4", "A4+50c")
    pub label: String,
    pub frequency: f64,
}

impl Pitch {
    pub fn from_note(note: &str) -> TrainerResult<Self> {
        let midi = tuning::note_to_midi(note)?;
        Ok(Self {
            label: tuning::midi_to_note(midi),
            frequency: tuning::midi_to_frequency(midi as f64),
        })
    }

    pub fn from_frequency(frequency: f64) -> TrainerResult<Self> {
        let nearest = tuning::frequency_to_nearest_note(frequency)?;
        let cents = nearest.delta_cents.round();
        let label = if cents == 0.0 {
            nearest.note_name
        } else {
            format!("{}{:+}c", nearest.note_name, cents)
        };
        Ok(Self { label, frequency })
    }
}

/// The external sound engine.
///
/// Implementations own the actual oscillators. The façade guarantees that a
/// release is only sent for a pitch that was attacked on the same voice.
pub trait SynthEngine {
    /// The voice pool, one entry per synth id.
    fn voices(&self) -> Vec<VoiceSpec>;
    fn trigger_attack(&mut self, synth_id: u32, pitch: &Pitch);
    fn trigger_release(&mut self, synth_id: u32, pitch: &Pitch);
}

/// The musical job a voice is doing in the current challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceRole {
    /// The pitch under the learner's control
    Sweep,
    /// The sustained reference pitch
    Drone,
}

impl std::fmt::Display for VoiceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceRole::Sweep => f.write_str("sweep"),
            VoiceRole::Drone => f.write_str("drone"),
        }
    }
}

#[derive(Debug)]
struct VoiceSlot {
    polyphony: Polyphony,
    sounding: Vec<Pitch>,
}

/// Serializes attack/release traffic to a [`SynthEngine`].
#[derive(Debug)]
pub struct AudioControl<E: SynthEngine> {
    engine: E,
    ready: bool,
    voices: BTreeMap<u32, VoiceSlot>,
    sweep: Option<u32>,
    drone: Option<u32>,
}

impl<E: SynthEngine> AudioControl<E> {
    /// Wraps an engine. The façade starts out not ready.
    pub fn new(engine: E) -> Self {
        let mut voices = BTreeMap::new();
        for spec in engine.voices() {
            if voices.contains_key(&spec.synth_id) {
                eprintln!("[AUDIO] Ignoring duplicate voice for synth id {}", spec.synth_id);
                continue;
            }
            voices.insert(
                spec.synth_id,
                VoiceSlot {
                    polyphony: spec.polyphony,
                    sounding: Vec::new(),
                },
            );
        }
        Self {
            engine,
            ready: false,
            voices,
            sweep: None,
            drone: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Opens the gate once the engine bootstrap has finished.
    pub fn mark_ready(&mut self) {
        if !self.ready {
            eprintln!("[AUDIO] Engine ready with {} voices", self.voices.len());
            self.ready = true;
        }
    }

    /// Assigns the sweep and drone roles to their voices.
    ///
    /// # Errors
    /// * `VoiceAliased` - both roles name the same synth id
    pub fn bind_roles(&mut self, sweep_id: u32, drone_id: u32) -> TrainerResult<()> {
        if sweep_id == drone_id {
            return Err(TrainerError::VoiceAliased { synth_id: sweep_id });
        }
        self.sweep = Some(sweep_id);
        self.drone = Some(drone_id);
        Ok(())
    }

    pub fn role_voice(&self, role: VoiceRole) -> Option<u32> {
        match role {
            VoiceRole::Sweep => self.sweep,
            VoiceRole::Drone => self.drone,
        }
    }

    /// Pitches currently held on a voice.
    pub fn sounding(&self, synth_id: u32) -> &[Pitch] {
        self.voices
            .get(&synth_id)
            .map(|slot| slot.sounding.as_slice())
            .unwrap_or(&[])
    }

    pub fn attack(&mut self, synth_id: u32, note: &str) -> TrainerResult<()> {
        self.ensure_ready()?;
        let pitch = Pitch::from_note(note)?;
        self.attack_pitch(synth_id, pitch)
    }

    /// Starts `pitch` on a voice.
    ///
    /// A monophonic voice drops whatever it was sounding; a polyphonic voice
    /// re-triggers the pitch if it was already held.
    pub fn attack_pitch(&mut self, synth_id: u32, pitch: Pitch) -> TrainerResult<()> {
        self.ensure_ready()?;
        let slot = self
            .voices
            .get_mut(&synth_id)
            .ok_or(TrainerError::VoiceNotFound { synth_id })?;

        let to_release: Vec<Pitch> = match slot.polyphony {
            Polyphony::Mono => slot.sounding.drain(..).collect(),
            Polyphony::Poly => {
                let (same, others): (Vec<Pitch>, Vec<Pitch>) = slot
                    .sounding
                    .drain(..)
                    .partition(|held| held.frequency == pitch.frequency);
                slot.sounding = others;
                same
            }
        };
        for held in &to_release {
            self.engine.trigger_release(synth_id, held);
        }

        self.engine.trigger_attack(synth_id, &pitch);
        slot.sounding.push(pitch);
        Ok(())
    }

    /// Releases every pitch held on a voice. Safe on a silent voice.
    pub fn release(&mut self, synth_id: u32) -> TrainerResult<()> {
        self.ensure_ready()?;
        let slot = self
            .voices
            .get_mut(&synth_id)
            .ok_or(TrainerError::VoiceNotFound { synth_id })?;
        for held in slot.sounding.drain(..) {
            self.engine.trigger_release(synth_id, &held);
        }
        Ok(())
    }

    pub fn start_drone(&mut self, synth_id: u32, note: &str) -> TrainerResult<()> {
        self.attack(synth_id, note)
    }

    pub fn stop_drone(&mut self, synth_id: u32) -> TrainerResult<()> {
        self.release(synth_id)
    }

    /// Silences every voice. Does nothing before the engine is ready, since
    /// nothing can be sounding yet.
    pub fn stop_all(&mut self) {
        if !self.ready {
            return;
        }
        for (synth_id, slot) in self.voices.iter_mut() {
            for held in slot.sounding.drain(..) {
                self.engine.trigger_release(*synth_id, &held);
            }
        }
    }

    /// Moves the sweep voice to `pitch`, releasing the old sweep pitch first.
    pub fn play_sweep(&mut self, pitch: Pitch) -> TrainerResult<()> {
        let synth_id = self.bound(VoiceRole::Sweep)?;
        self.release(synth_id)?;
        self.attack_pitch(synth_id, pitch)
    }

    pub fn stop_sweep(&mut self) -> TrainerResult<()> {
        let synth_id = self.bound(VoiceRole::Sweep)?;
        self.release(synth_id)
    }

    /// Starts the drone voice on `note`, replacing any drone already held.
    pub fn start_role_drone(&mut self, note: &str) -> TrainerResult<()> {
        let synth_id = self.bound(VoiceRole::Drone)?;
        self.release(synth_id)?;
        self.start_drone(synth_id, note)
    }

    pub fn stop_role_drone(&mut self) -> TrainerResult<()> {
        let synth_id = self.bound(VoiceRole::Drone)?;
        self.stop_drone(synth_id)
    }

    fn bound(&self, role: VoiceRole) -> TrainerResult<u32> {
        self.role_voice(role)
            .ok_or(TrainerError::RoleUnbound { role })
    }

    fn ensure_ready(&self) -> TrainerResult<()> {
        if self.ready {
            Ok(())
        } else {
            Err(TrainerError::EngineNotReady)
        }
    }
}

/// One call received by a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Attack { synth_id: u32, label: String },
    Release { synth_id: u32, label: String },
}

/// An engine that makes no sound and remembers every call it receives.
#[derive(Debug, Clone)]
pub struct RecordingEngine {
    pool: Vec<VoiceSpec>,
    pub calls: Vec<EngineCall>,
}

impl RecordingEngine {
    pub fn new(pool: Vec<VoiceSpec>) -> Self {
        Self {
            pool,
            calls: Vec::new(),
        }
    }

    /// Returns and clears the recorded calls.
    pub fn take_calls(&mut self) -> Vec<EngineCall> {
        std::mem::take(&mut self.calls)
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new(default_voice_pool())
    }
}

impl SynthEngine for RecordingEngine {
    fn voices(&self) -> Vec<VoiceSpec> {
        self.pool.clone()
    }

    fn trigger_attack(&mut self, synth_id: u32, pitch: &Pitch) {
        self.calls.push(EngineCall::Attack {
            synth_id,
            label: pitch.label.clone(),
        });
    }

    fn trigger_release(&mut self, synth_id: u32, pitch: &Pitch) {
        self.calls.push(EngineCall::Release {
            synth_id,
            label: pitch.label.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ready() -> AudioControl<RecordingEngine> {
        let mut audio = AudioControl::new(RecordingEngine::default());
        audio.mark_ready();
        audio
    }

    fn attack(synth_id: u32, label: &str) -> EngineCall {
        EngineCall::Attack {
            synth_id,
            label: label.into(),
        }
    }

    fn release(synth_id: u32, label: &str) -> EngineCall {
        EngineCall::Release {
            synth_id,
            label: label.into(),
        }
    }

    #[test]
    fn calls_before_ready_are_rejected() {
        let mut audio = AudioControl::new(RecordingEngine::default());
        assert!(matches!(audio.attack(0, "C4"), Err(TrainerError::EngineNotReady)));
        assert!(matches!(audio.release(0), Err(TrainerError::EngineNotReady)));
        audio.stop_all();
        assert!(audio.engine().calls.is_empty());
    }

    #[test]
    fn mono_voice_releases_before_the_next_attack() {
        let mut audio = ready();
        audio.attack(0, "C4").unwrap();
        audio.attack(0, "E4").unwrap();
        assert_eq!(
            audio.engine_mut().take_calls(),
            vec![attack(0, "C4"), release(0, "C4"), attack(0, "E4")]
        );
        assert_eq!(audio.sounding(0).len(), 1);
    }

    #[test]
    fn poly_release_releases_every_note() {
        let mut audio = ready();
        audio.attack(2, "C4").unwrap();
        audio.attack(2, "E4").unwrap();
        audio.attack(2, "G4").unwrap();
        assert_eq!(audio.sounding(2).len(), 3);
        audio.engine_mut().take_calls();

        audio.release(2).unwrap();
        assert_eq!(
            audio.engine_mut().take_calls(),
            vec![release(2, "C4"), release(2, "E4"), release(2, "G4")]
        );
        assert!(audio.sounding(2).is_empty());
    }

    #[test]
    fn poly_retrigger_of_a_held_note() {
        let mut audio = ready();
        audio.attack(3, "A3").unwrap();
        audio.attack(3, "A3").unwrap();
        assert_eq!(
            audio.engine_mut().take_calls(),
            vec![attack(3, "A3"), release(3, "A3"), attack(3, "A3")]
        );
        assert_eq!(audio.sounding(3).len(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let mut audio = ready();
        audio.release(1).unwrap();
        audio.stop_drone(2).unwrap();
        audio.stop_drone(2).unwrap();
        assert!(audio.engine().calls.is_empty());
    }

    #[test]
    fn ids_do_not_wrap_onto_the_pool() {
        let mut audio = ready();
        assert!(matches!(
            audio.attack(4, "C4"),
            Err(TrainerError::VoiceNotFound { synth_id: 4 })
        ));
        assert!(audio.engine().calls.is_empty());
    }

    #[test]
    fn sweep_on_a_poly_voice_never_overlaps() {
        let mut audio = ready();
        audio.bind_roles(2, 0).unwrap();
        audio.play_sweep(Pitch::from_note("C4").unwrap()).unwrap();
        audio.play_sweep(Pitch::from_note("D4").unwrap()).unwrap();
        assert_eq!(
            audio.engine_mut().take_calls(),
            vec![attack(2, "C4"), release(2, "C4"), attack(2, "D4")]
        );
    }

    #[test]
    fn roles_must_use_distinct_voices() {
        let mut audio = ready();
        assert!(matches!(
            audio.bind_roles(1, 1),
            Err(TrainerError::VoiceAliased { synth_id: 1 })
        ));
        assert!(matches!(
            audio.stop_sweep(),
            Err(TrainerError::RoleUnbound { role: VoiceRole::Sweep })
        ));
    }

    #[test]
    fn stop_all_silences_every_voice() {
        let mut audio = ready();
        audio.bind_roles(0, 2).unwrap();
        audio.start_role_drone("C3").unwrap();
        audio.play_sweep(Pitch::from_note("G3").unwrap()).unwrap();
        audio.engine_mut().take_calls();

        audio.stop_all();
        assert_eq!(
            audio.engine_mut().take_calls(),
            vec![release(0, "G3"), release(2, "C3")]
        );
        assert!(audio.sounding(0).is_empty());
        assert!(audio.sounding(2).is_empty());
    }

    #[test]
    fn off_grid_pitches_carry_their_cents() {
        let sharp = Pitch::from_frequency(tuning::midi_to_frequency(69.25)).unwrap();
        assert_eq!(sharp.label, "A4+25c");
        let flat = Pitch::from_frequency(tuning::midi_to_frequency(59.8)).unwrap();
        assert_eq!(flat.label, "C4-20c");
        let exact = Pitch::from_frequency(440.0).unwrap();
        assert_eq!(exact.label, "A4");
        assert_eq!(Pitch::from_note("Bb3").unwrap().label, "A#3");
    }
}

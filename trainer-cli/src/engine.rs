//! # Console Engine
//!
//! A [`SynthEngine`] that prints what it would play instead of producing
//! sound. It stands in for a real synthesizer so the trainer can run in a
//! terminal.

use std::io::Write;

use trainer_core::audio::{Polyphony, default_voice_pool};
use trainer_core::{Pitch, SynthEngine, VoiceSpec};

#[derive(Debug)]
pub struct ConsoleEngine {
    pool: Vec<VoiceSpec>,
}

impl ConsoleEngine {
    pub fn new() -> Self {
        Self {
            pool: default_voice_pool(),
        }
    }

    /// The one-time start-up step, run on the bootstrap thread.
    ///
    /// Announces the voice pool; fails if stderr cannot be written.
    pub fn boot_task(&self) -> impl FnOnce() -> Result<(), String> + Send + 'static {
        let pool = self.pool.clone();
        move || {
            let mut err = std::io::stderr().lock();
            for voice in &pool {
                let kind = match voice.polyphony {
                    Polyphony::Mono => "mono",
                    Polyphony::Poly => "poly",
                };
                writeln!(
                    err,
                    "[ENGINE] voice {}: {:?} {} (attack {}s, release {}s)",
                    voice.synth_id,
                    voice.oscillator,
                    kind,
                    voice.envelope.attack,
                    voice.envelope.release
                )
                .map_err(|e| e.to_string())?;
            }
            Ok(())
        }
    }
}

impl Default for ConsoleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthEngine for ConsoleEngine {
    fn voices(&self) -> Vec<VoiceSpec> {
        self.pool.clone()
    }

    fn trigger_attack(&mut self, synth_id: u32, pitch: &Pitch) {
        eprintln!(
            "[ENGINE] attack voice {} {} ({:.2} Hz)",
            synth_id, pitch.label, pitch.frequency
        );
    }

    fn trigger_release(&mut self, synth_id: u32, pitch: &Pitch) {
        eprintln!("[ENGINE] release voice {} {}", synth_id, pitch.label);
    }
}

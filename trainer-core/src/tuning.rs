//! # Pitch Mapping Module
//!
//! This module converts between the three ways the trainer talks about pitch:
//! note names in scientific pitch notation, MIDI numbers, and frequencies in Hz.
//! All conversions use twelve-tone equal temperament with A4 = MIDI 69 = 440 Hz.
//!
//! ## Features
//! - Note name parsing with sharps, flats and doubled accidentals
//! - MIDI to frequency conversion, including fractional (quartertone) MIDI values
//! - Nearest-note lookup with deviation in Hz and cents
//! - Slider pitch sequences built from a note range and a step size

use crate::error::{TrainerError, TrainerResult};

/// Reference pitch for A4 in Hz.
pub const A4_FREQUENCY: f64 = 440.0;

/// MIDI number of A4.
pub const A4_MIDI: i32 = 69;

/// How close (in semitones) a walked step may come to the top of a range
/// before it is snapped onto the endpoint.
pub const CLAMP_TOLERANCE: f64 = 1e-9;

/// Upper bound on the number of points in a pitch sequence.
pub const MAX_SEQUENCE_LEN: usize = 4096;

/// Sharp spellings used when naming a MIDI number, indexed by pitch class.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch class of each natural note letter.
const LETTER_OFFSETS: [(char, i32); 7] = [
    ('C', 0),
    ('D', 2),
    ('E', 4),
    ('F', 5),
    ('G', 7),
    ('A', 9),
    ('B', 11),
];

// Longer spellings first so "##" is not read as "#".
const ACCIDENTALS: [(&str, i32); 5] = [("##", 2), ("bb", -2), ("#", 1), ("x", 2), ("b", -1)];

/// The equal-tempered note nearest to a frequency, and how far off the
/// frequency is.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteWithDelta {
    /// Note name (e.g., "A4", "C#3")
    pub note_name: String,
    /// MIDI number of the nearest note
    pub midi: i32,
    /// Canonical frequency of the nearest note in Hz
    pub frequency: f64,
    /// Measured minus canonical frequency, in Hz
    pub delta_hz: f64,
    /// Signed deviation in cents (positive = sharp, negative = flat)
    pub delta_cents: f64,
}

/// Parses a note name such as "C4", "A#3", "Bb2" or "C-1" into its MIDI number.
///
/// The letter is case-insensitive. Accepted accidentals are `#`, `##`, `x`,
/// `b` and `bb`. The octave is a signed integer, with C4 = 60.
///
/// # Errors
/// * `InvalidNoteName` - the input is not scientific pitch notation
pub fn note_to_midi(note: &str) -> TrainerResult<i32> {
    parse_note(note.trim()).ok_or_else(|| TrainerError::InvalidNoteName {
        name: note.to_string(),
    })
}

fn parse_note(name: &str) -> Option<i32> {
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let pitch_class = LETTER_OFFSETS
        .iter()
        .find(|(c, _)| *c == letter)
        .map(|(_, offset)| *offset)?;

    let rest = chars.as_str();
    let (shift, octave) = ACCIDENTALS
        .iter()
        .find_map(|(spelling, shift)| rest.strip_prefix(spelling).map(|tail| (*shift, tail)))
        .unwrap_or((0, rest));

    let digits = octave.strip_prefix('-').unwrap_or(octave);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let octave: i32 = octave.parse().ok()?;

    octave
        .checked_add(1)?
        .checked_mul(12)?
        .checked_add(pitch_class + shift)
}

/// Names a MIDI number using sharp spellings, e.g. 61 -> "C#4", -1 -> "B-2".
pub fn midi_to_note(midi: i32) -> String {
    let pitch_class = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[pitch_class], octave)
}

/// Frequency in Hz of a (possibly fractional) MIDI number.
///
/// Uses the equal temperament formula `f = 440 * 2^((midi - 69) / 12)`.
pub fn midi_to_frequency(midi: f64) -> f64 {
    A4_FREQUENCY * 2.0_f64.powf((midi - A4_MIDI as f64) / 12.0)
}

/// Calculates the deviation of `freq` from `reference_freq` in cents.
///
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
pub fn cents_between(freq: f64, reference_freq: f64) -> f64 {
    1200.0 * (freq / reference_freq).log2()
}

/// Finds the equal-tempered note closest to `freq` in log-frequency space.
///
/// The deviation is never more than half a semitone, so `delta_cents` lies
/// in `[-50, 50]`.
///
/// # Errors
/// * `InvalidFrequency` - `freq` is not a positive finite number, or sits so
///   far out that the nearest note's own frequency is not representable
pub fn frequency_to_nearest_note(freq: f64) -> TrainerResult<NoteWithDelta> {
    if !freq.is_finite() || freq <= 0.0 {
        return Err(TrainerError::InvalidFrequency { freq });
    }

    let midi_float = A4_MIDI as f64 + 12.0 * (freq / A4_FREQUENCY).log2();
    let midi = midi_float.round() as i32;
    let frequency = midi_to_frequency(midi as f64);
    let delta_cents = cents_between(freq, frequency);
    if !frequency.is_finite() || frequency <= 0.0 || !delta_cents.is_finite() {
        return Err(TrainerError::InvalidFrequency { freq });
    }

    Ok(NoteWithDelta {
        note_name: midi_to_note(midi),
        midi,
        frequency,
        delta_hz: freq - frequency,
        delta_cents,
    })
}

/// An ordered run of frequencies a slider can move across.
///
/// Built once per challenge by [`build_pitch_sequence`] and never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchSequence {
    frequencies: Vec<f64>,
}

impl PitchSequence {
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<f64> {
        self.frequencies.get(position).copied()
    }

    pub fn first(&self) -> Option<f64> {
        self.frequencies.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.frequencies.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.frequencies.iter().copied()
    }

    /// Labels every position with its nearest note, the way a slider shows it.
    pub fn notes(&self) -> TrainerResult<Vec<NoteWithDelta>> {
        self.iter().map(frequency_to_nearest_note).collect()
    }

    /// Position whose frequency is closest to `freq` in cents.
    pub fn position_nearest(&self, freq: f64) -> Option<usize> {
        if !freq.is_finite() || freq <= 0.0 {
            return None;
        }
        self.frequencies
            .iter()
            .enumerate()
            .min_by(|a, b| {
                let diff_a = cents_between(*a.1, freq).abs();
                let diff_b = cents_between(*b.1, freq).abs();
                diff_a.total_cmp(&diff_b)
            })
            .map(|(position, _)| position)
    }
}

/// Builds the frequencies a slider walks through between two notes.
///
/// # Arguments
/// * `lo_note` - Bottom of the range (e.g., "C3")
/// * `hi_note` - Top of the range (e.g., "C4")
/// * `step` - Step size in semitones
///
/// # Behaviour
/// * `step > 0` - ascending from `lo_note`, with the final step snapped onto
///   `hi_note`. Both endpoints appear exactly once.
/// * `step < 0` - the ascending sequence for `|step|`, reversed.
/// * `step == 0` - just the two endpoints, `[f(lo), f(hi)]`.
///
/// # Errors
/// * `InvalidStep` - `step` is not finite, or would produce more than
///   [`MAX_SEQUENCE_LEN`] points
/// * `InvalidNoteName` - either endpoint does not parse
/// * `InvalidRange` - `lo_note` is above `hi_note`
pub fn build_pitch_sequence(
    lo_note: &str,
    hi_note: &str,
    step: f64,
) -> TrainerResult<PitchSequence> {
    if !step.is_finite() {
        return Err(TrainerError::InvalidStep { step });
    }

    let lo_midi = note_to_midi(lo_note)?;
    let hi_midi = note_to_midi(hi_note)?;
    if lo_midi > hi_midi {
        return Err(TrainerError::InvalidRange {
            min: lo_note.to_string(),
            max: hi_note.to_string(),
        });
    }

    if step == 0.0 {
        return Ok(PitchSequence {
            frequencies: vec![
                midi_to_frequency(lo_midi as f64),
                midi_to_frequency(hi_midi as f64),
            ],
        });
    }

    let span = (hi_midi - lo_midi) as f64;
    if span / step.abs() >= (MAX_SEQUENCE_LEN - 1) as f64 {
        return Err(TrainerError::InvalidStep { step });
    }

    let mut frequencies = ascending_walk(lo_midi as f64, hi_midi as f64, step.abs());
    if step < 0.0 {
        frequencies.reverse();
    }
    Ok(PitchSequence { frequencies })
}

fn ascending_walk(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    let mut frequencies = Vec::new();
    let mut k = 0u32;
    loop {
        // Multiplying instead of accumulating keeps rounding error from drifting.
        let midi = lo + k as f64 * step;
        if midi >= hi - CLAMP_TOLERANCE {
            frequencies.push(midi_to_frequency(hi));
            return frequencies;
        }
        frequencies.push(midi_to_frequency(midi));
        k += 1;
    }
}

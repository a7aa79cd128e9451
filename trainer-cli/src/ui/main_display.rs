//! # Main Display Module
//!
//! Text rendering of the trainer state: the active challenge with its
//! slider, and the list of challenges with their status.

use trainer_core::{ChallengeStatus, JsonFileStore, TrainingSession};

use super::cent_meter;
use crate::engine::ConsoleEngine;

pub type Session = TrainingSession<ConsoleEngine, JsonFileStore>;

/// Renders the active challenge, or the locked notice when it is not
/// reachable yet.
pub fn challenge_view(session: &Session, audio_ready: bool) -> String {
    let Ok(challenge) = session.current_challenge() else {
        return "Challenge not found".to_string();
    };
    let index = session.progression().current_index();
    let total = session.challenges().len();

    let mut lines = vec![format!(
        "== {} ({}/{}) - {} ==",
        challenge.display_title(),
        index + 1,
        total,
        session.current_status()
    )];

    if session.current_status() == ChallengeStatus::Locked {
        lines.push("Locked: complete the previous challenge to unlock this one.".to_string());
        return lines.join("\n");
    }

    let slider = session.slider();
    let note = slider.current_note();
    lines.push(format!(
        "interval {} | drone {} | step {}",
        challenge.interval, challenge.drone_note, challenge.slider_step
    ));
    lines.push(format!(
        "{} - {} ({:.2} Hz)",
        note.note_name,
        slider.position(),
        slider.current_frequency()
    ));
    lines.push(slider_bar(slider.position(), slider.len()));
    lines.push(cent_meter::render(note.delta_cents));
    lines.push(format!("{:+.0} cents above the drone", slider.cents_from_drone()));
    if !audio_ready {
        lines.push("Type 'start' to start the game.".to_string());
    }
    lines.join("\n")
}

/// One line per challenge, e.g. `> Perfect Fifth - active`.
pub fn challenge_list(session: &Session) -> String {
    let current = session.progression().current_index();
    session
        .challenges()
        .iter()
        .zip(session.progression().statuses())
        .enumerate()
        .map(|(i, (challenge, status))| {
            let marker = if i == current { '>' } else { ' ' };
            format!("{} {} - {}", marker, challenge.display_title(), status)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Slider track with the handle at `position`, e.g. `0 |---o----| 8`.
fn slider_bar(position: usize, len: usize) -> String {
    let track: String = (0..len)
        .map(|i| if i == position { 'o' } else { '-' })
        .collect();
    format!("0 |{}| {}", track, len.saturating_sub(1))
}

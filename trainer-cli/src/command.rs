//! # Command Parsing
//!
//! Turns a line typed by the learner into a [`Message`] for the app.

use crate::Message;

pub const HELP: &str = "\
commands:
  start          start the sound engine (needed once before anything plays)
  slide <n>      move the slider to position n
  up | down      move the slider one position
  play           start the drone again
  stop           silence the slider and the drone
  submit         complete this challenge and move on
  next | prev    look at the next or previous challenge
  list           show every challenge and its status
  reset          forget all progress
  help           show this text
  quit           leave";

/// Parses one input line. Empty lines are `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Message>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();
    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }

    let message = match (command.to_ascii_lowercase().as_str(), argument) {
        ("start", None) => Message::StartGame,
        ("slide", Some(position)) => {
            let position = position
                .parse()
                .map_err(|_| format!("'{position}' is not a slider position"))?;
            Message::SlideTo(position)
        }
        ("slide", None) => return Err("slide needs a position, e.g. 'slide 3'".into()),
        ("up", None) => Message::SlideBy(1),
        ("down", None) => Message::SlideBy(-1),
        ("play", None) => Message::StartDrone,
        ("stop", None) => Message::Stop,
        ("submit", None) => Message::Submit,
        ("next", None) => Message::Next,
        ("prev", None) => Message::Prev,
        ("list", None) | ("status", None) => Message::ShowStatus,
        ("reset", None) => Message::Reset,
        ("help", None) | ("?", None) => Message::Help,
        ("quit", None) | ("exit", None) => Message::Exit,
        (other, Some(_)) if is_known(other) => {
            return Err(format!("'{other}' takes no argument"));
        }
        (other, _) => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(message))
}

fn is_known(command: &str) -> bool {
    matches!(
        command,
        "start" | "up" | "down" | "play" | "stop" | "submit" | "next" | "prev" | "list"
            | "status" | "reset" | "help" | "?" | "quit" | "exit"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        assert!(matches!(parse_command("start"), Ok(Some(Message::StartGame))));
        assert!(matches!(parse_command("slide 4"), Ok(Some(Message::SlideTo(4)))));
        assert!(matches!(parse_command("  UP "), Ok(Some(Message::SlideBy(1)))));
        assert!(matches!(parse_command("down"), Ok(Some(Message::SlideBy(-1)))));
        assert!(matches!(parse_command("submit"), Ok(Some(Message::Submit))));
        assert!(matches!(parse_command("list"), Ok(Some(Message::ShowStatus))));
        assert!(matches!(parse_command("quit"), Ok(Some(Message::Exit))));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert!(matches!(parse_command("   "), Ok(None)));
    }

    #[test]
    fn bad_input_explains_itself() {
        assert!(parse_command("slide").unwrap_err().contains("needs a position"));
        assert!(parse_command("slide -2").unwrap_err().contains("not a slider position"));
        assert!(parse_command("next 2").unwrap_err().contains("takes no argument"));
        assert!(parse_command("fly").unwrap_err().contains("unknown command"));
        assert!(parse_command("slide 1 2").unwrap_err().contains("unexpected"));
    }
}

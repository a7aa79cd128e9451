//! # Interval Trainer - Ear Training in the Terminal
//!
//! This is the composition root of the interval trainer. It loads the
//! challenge list, restores progress, wires a console engine into the audio
//! façade and drives the session from commands typed on stdin.
//!
//! ## Architecture
//! - **Main Thread**: event loop owning the session; every command runs to completion
//! - **Input Thread**: reads stdin lines and forwards them over a channel
//! - **Bootstrap Thread**: one-time engine start-up, polled on every tick
//! - **Communication**: Crossbeam channels, with a 16 ms tick while idle

mod command;
mod engine;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, select};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use trainer_core::{
    BootStatus, Bootstrap, ChallengeList, JsonFileStore, ProgressStore, SavedProgress,
    TrainerError, TrainingSession,
};

use engine::ConsoleEngine;
use ui::main_display::{self, Session};

// Defaults for the command line
const DEFAULT_CHALLENGES: &str = "challenges.json";
const DEFAULT_PROGRESS: &str = "progress.json";
const TICK: Duration = Duration::from_millis(16); // Poll interval while waiting for input

/// Interval ear-training exercises against a sustained drone.
#[derive(Debug, Parser)]
#[command(name = "interval-trainer", version)]
struct Args {
    /// JSON file holding the ordered challenge list
    #[arg(long, default_value = DEFAULT_CHALLENGES)]
    challenges: PathBuf,

    /// JSON file the current challenge index is saved to
    #[arg(long, default_value = DEFAULT_PROGRESS)]
    progress: PathBuf,

    /// Forget saved progress before starting
    #[arg(long)]
    reset: bool,
}

/// Application messages, one per learner action plus the idle tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    StartGame,          // Start the sound engine
    SlideTo(usize),     // Move the slider to a position
    SlideBy(isize),     // Nudge the slider up or down
    StartDrone,         // Restart the drone
    Stop,               // Silence slider and drone
    Submit,             // Complete the active challenge
    Next,               // Look at the next challenge
    Prev,               // Look at the previous challenge
    ShowStatus,         // Print the challenge list
    Reset,              // Forget all progress
    Help,               // Print the command list
    Exit,               // Leave the application
    Tick,               // Idle tick, polls the engine bootstrap
}

fn main() -> Result<()> {
    let args = Args::parse();
    eprintln!("[MAIN] Starting interval trainer...");

    let challenges = match load_challenges(&args.challenges) {
        Ok(challenges) => challenges,
        Err(TrainerError::ChallengeNotFound { .. }) => {
            println!("Challenge not found: {} has no challenges.", args.challenges.display());
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("could not load challenges from {}", args.challenges.display())
            });
        }
    };

    let mut store = JsonFileStore::new(&args.progress);
    if args.reset {
        reset_progress(&mut store)
            .with_context(|| format!("could not reset {}", args.progress.display()))?;
        eprintln!("[MAIN] Saved progress cleared");
    }

    let session = TrainingSession::new(challenges, ConsoleEngine::new(), store)
        .context("could not start the training session")?;

    let input = spawn_input_reader();
    let mut app = TrainerApp::new(session);
    app.run(&input);

    eprintln!("[MAIN] Application finished");
    Ok(())
}

/// Reads and validates the challenge list.
fn load_challenges(path: &Path) -> Result<ChallengeList, TrainerError> {
    let file = File::open(path)?;
    let challenges = ChallengeList::from_reader(BufReader::new(file))?;
    eprintln!("[MAIN] Loaded {} challenges from {}", challenges.len(), path.display());
    Ok(challenges)
}

/// Points saved progress back at the first challenge with nothing completed.
fn reset_progress(store: &mut impl ProgressStore) -> Result<(), TrainerError> {
    store.save(&SavedProgress {
        current_challenge: Some(0),
        ..SavedProgress::default()
    })
}

/// Forwards stdin lines to the event loop. The channel closes at end of input.
fn spawn_input_reader() -> Receiver<String> {
    let (line_tx, line_rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("[INPUT] Error reading stdin: {}", e);
                    break;
                }
            }
        }
    });
    line_rx
}

/// Main application state for the interval trainer.
struct TrainerApp {
    session: Session,
    bootstrap: Option<Bootstrap>, // Engine start-up in progress
    running: bool,
}

impl TrainerApp {
    fn new(session: Session) -> Self {
        Self {
            session,
            bootstrap: None,
            running: true,
        }
    }

    /// Processes input lines in arrival order until exit or end of input.
    fn run(&mut self, input: &Receiver<String>) {
        println!("{}", main_display::challenge_view(&self.session, false));
        println!("Type 'help' for commands.");

        while self.running {
            select! {
                recv(input) -> line => match line {
                    Ok(line) => match command::parse_command(&line) {
                        Ok(Some(message)) => self.update(message),
                        Ok(None) => {}
                        Err(e) => println!("{}", e),
                    },
                    Err(_) => {
                        eprintln!("[MAIN] Input closed");
                        self.update(Message::Exit);
                    }
                },
                default(TICK) => self.update(Message::Tick),
            }
        }
    }

    /// Handles one message.
    fn update(&mut self, message: Message) {
        if message != Message::Tick {
            eprintln!("[UPDATE] Received message: {:?}", message);
        }

        match message {
            Message::StartGame => self.start_game(),
            Message::Tick => self.poll_engine(),
            Message::SlideTo(position) => self.slide(position),
            Message::SlideBy(delta) => {
                let position = self.session.slider().position();
                match position.checked_add_signed(delta) {
                    Some(target) => self.slide(target),
                    None => println!("Already at the bottom of the slider."),
                }
            }
            Message::StartDrone => {
                if let Err(e) = self.session.start() {
                    self.show_error(e);
                }
            }
            Message::Stop => {
                if let Err(e) = self.session.stop() {
                    self.show_error(e);
                }
            }
            Message::Submit => self.submit(),
            Message::Next => self.navigate(|session| session.navigate_next()),
            Message::Prev => self.navigate(|session| session.navigate_prev()),
            Message::ShowStatus => println!("{}", main_display::challenge_list(&self.session)),
            Message::Reset => match self.session.reset() {
                Ok(()) => self.show_challenge(),
                Err(e) => self.show_error(e),
            },
            Message::Help => println!("{}", command::HELP),
            Message::Exit => {
                eprintln!("[MAIN] Exit requested - silencing all voices...");
                self.session.audio_mut().stop_all();
                self.running = false;
            }
        }
    }

    fn start_game(&mut self) {
        if self.session.audio().is_ready() {
            println!("The game is already running.");
            return;
        }
        if self.bootstrap.is_some() {
            println!("Still starting...");
            return;
        }
        let task = self.session.audio().engine().boot_task();
        self.bootstrap = Some(Bootstrap::spawn(task));
        println!("Starting...");
    }

    fn poll_engine(&mut self) {
        let Some(bootstrap) = self.bootstrap.as_mut() else {
            return;
        };
        match self.session.poll_bootstrap(bootstrap) {
            BootStatus::Pending => {}
            BootStatus::Ready => {
                self.bootstrap = None;
                self.show_challenge();
            }
            BootStatus::Failed(reason) => {
                self.bootstrap = None;
                println!("The sound engine could not start: {}", reason);
            }
        }
    }

    fn slide(&mut self, position: usize) {
        match self.session.slide_to(position) {
            Ok(_) => self.show_challenge(),
            Err(e) => self.show_error(e),
        }
    }

    fn submit(&mut self) {
        match self.session.submit() {
            Ok(outcome) if outcome.terminal => {
                println!("Every challenge is complete. Well done!");
                self.show_challenge();
            }
            Ok(outcome) if outcome.advanced => self.show_challenge(),
            Ok(_) => println!("Challenge already complete."),
            Err(e) => self.show_error(e),
        }
    }

    fn navigate(&mut self, step: impl FnOnce(&mut Session) -> Result<bool, TrainerError>) {
        match step(&mut self.session) {
            Ok(true) => self.show_challenge(),
            Ok(false) => println!("No challenge in that direction."),
            Err(e) => self.show_error(e),
        }
    }

    fn show_challenge(&self) {
        println!(
            "{}",
            main_display::challenge_view(&self.session, self.session.audio().is_ready())
        );
    }

    fn show_error(&self, error: TrainerError) {
        match error {
            TrainerError::EngineNotReady => println!("Type 'start' to start the game first."),
            TrainerError::ChallengeLocked { .. } => {
                println!("Locked: complete the previous challenge to unlock this one.")
            }
            other => println!("{}", other),
        }
    }
}

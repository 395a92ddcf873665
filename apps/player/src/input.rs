//! Player input -> game command, depending on what the screen is showing.

use client_core::{FeedbackStage, Phase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    Start,
    Answer(bool),
    Verdict(bool),
    Teach(String),
    Reset,
    Debug,
    Quit,
}

/// `:reset`, `:debug` and `:quit` work everywhere. The single-letter shortcuts
/// are only read where the player is not typing a free-form entity name.
pub fn parse_command(line: &str, phase: Phase) -> Option<PlayerCommand> {
    let input = line.trim();
    match input.to_ascii_lowercase().as_str() {
        ":reset" => return Some(PlayerCommand::Reset),
        ":debug" => return Some(PlayerCommand::Debug),
        ":quit" => return Some(PlayerCommand::Quit),
        _ => {}
    }

    if phase == Phase::FeedbackGiven(FeedbackStage::AwaitingEntity) {
        return Some(PlayerCommand::Teach(input.to_string()));
    }

    let word = input.to_ascii_lowercase();
    match (phase, word.as_str()) {
        (_, "q" | "quit") => Some(PlayerCommand::Quit),
        (_, "d" | "debug") => Some(PlayerCommand::Debug),
        (Phase::Intro, "" | "s" | "start") => Some(PlayerCommand::Start),
        (Phase::Asking, "y" | "yes") => Some(PlayerCommand::Answer(true)),
        (Phase::Asking, "n" | "no") => Some(PlayerCommand::Answer(false)),
        (Phase::Concluded, "y" | "yes" | "c" | "correct") => Some(PlayerCommand::Verdict(true)),
        (Phase::Concluded, "n" | "no" | "w" | "wrong") => Some(PlayerCommand::Verdict(false)),
        (Phase::FeedbackGiven(_), "" | "p" | "play") => Some(PlayerCommand::Reset),
        (Phase::Intro, _) => None,
        (_, "r" | "reset") => Some(PlayerCommand::Reset),
        _ => None,
    }
}

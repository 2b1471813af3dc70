//! Client side of the leaderboard: follows the game's lifecycle,
//! collects a name on game over, submits the score and shows the result.

use std::mem;

use tokio::sync::{mpsc, watch};

use crate::database::{GameScore, LeaderboardEntry, NameRules};

mod events;
mod name_entry;
mod service;

pub use events::{GameEvent, GameNotifier, Input, Key};
pub use name_entry::NameEntry;
pub use service::{ScoreService, ServiceError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Playing {
        score: GameScore,
    },
    Paused {
        score: GameScore,
    },
    NameEntry {
        score: GameScore,
        name: NameEntry,
        hint: Option<String>,
    },
    /// A request failed. `submitted` records whether the score already
    /// went through, in which case a retry only fetches the leaderboard.
    SubmitFailed {
        score: GameScore,
        name: String,
        submitted: bool,
        error: ServiceError,
    },
    LeaderboardShown {
        entries: Vec<LeaderboardEntry>,
    },
}

pub struct ScoreWorkflow<S> {
    service: S,
    rules: NameRules,
    state: WorkflowState,
}

impl<S: ScoreService> ScoreWorkflow<S> {
    pub fn new(service: S, rules: NameRules) -> Self {
        Self {
            service,
            rules,
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Applies one input. Returns the key if the workflow did not consume
    /// it and it should go to the game engine instead.
    pub async fn handle(&mut self, input: Input) -> Option<Key> {
        match input {
            Input::Game(event) => {
                self.on_game_event(event);
                None
            }
            Input::Key(key) => self.on_key(key).await,
        }
    }

    /// Drives the workflow from `inputs` until every sender is dropped.
    /// Unconsumed keys are passed on to `engine` and the overlay text is
    /// published after every input.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<Input>,
        engine: mpsc::Sender<Key>,
        overlay: watch::Sender<String>,
    ) -> Self {
        overlay.send_replace(self.overlay());
        while let Some(input) = inputs.recv().await {
            if let Some(key) = self.handle(input).await {
                if engine.send(key).await.is_err() {
                    log::debug!("Game engine stopped listening, dropped {:?}", key);
                }
            }
            overlay.send_replace(self.overlay());
        }
        self
    }

    /// Text for the overlay drawn above the game canvas.
    pub fn overlay(&self) -> String {
        match &self.state {
            WorkflowState::Idle | WorkflowState::Playing { .. } => String::new(),
            WorkflowState::Paused { .. } => "PAUSED".to_owned(),
            WorkflowState::NameEntry { score, name, hint } => {
                let mut text = format!("You scored: {}\nName: {}_", score, name.as_str());
                if let Some(hint) = hint {
                    text.push('\n');
                    text.push_str(hint);
                }
                text
            }
            WorkflowState::SubmitFailed { score, error, .. } => format!(
                "You scored: {}\n{}\nPress Enter to retry",
                score, error
            ),
            WorkflowState::LeaderboardShown { entries } if entries.is_empty() => {
                "No scores yet".to_owned()
            }
            WorkflowState::LeaderboardShown { entries } => entries
                .iter()
                .enumerate()
                .map(|(rank, entry)| format!("{}. {} {}", rank + 1, entry.name, entry.score))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn on_game_event(&mut self, event: GameEvent) {
        self.state = match (mem::replace(&mut self.state, WorkflowState::Idle), event) {
            (WorkflowState::Idle, GameEvent::ClearScreen)
            | (WorkflowState::LeaderboardShown { .. }, GameEvent::ClearScreen) => {
                WorkflowState::Playing { score: 0 }
            }
            (WorkflowState::Playing { .. }, GameEvent::Scored(score)) => {
                WorkflowState::Playing { score }
            }
            (WorkflowState::Playing { score }, GameEvent::Pause) => WorkflowState::Paused { score },
            (WorkflowState::Paused { score }, GameEvent::ClearScreen) => {
                WorkflowState::Playing { score }
            }
            (WorkflowState::Playing { .. }, GameEvent::GameOver(score))
            | (WorkflowState::Paused { .. }, GameEvent::GameOver(score)) => {
                WorkflowState::NameEntry {
                    score,
                    name: NameEntry::new(self.rules),
                    hint: None,
                }
            }
            (state, event) => {
                log::trace!("Ignoring {:?} in {:?}", event, state);
                state
            }
        };
    }

    async fn on_key(&mut self, key: Key) -> Option<Key> {
        match (&mut self.state, key) {
            (WorkflowState::NameEntry { name, hint, .. }, Key::Char(c)) => {
                name.push(c);
                *hint = None;
                None
            }
            (WorkflowState::NameEntry { name, hint, .. }, Key::Backspace) => {
                name.backspace();
                *hint = None;
                None
            }
            (WorkflowState::NameEntry { score, name, hint }, Key::Enter) => {
                match name.finish() {
                    Ok(finished) => {
                        let score = *score;
                        self.submit(score, finished, false).await;
                    }
                    Err(error) => *hint = Some(error.to_string()),
                }
                None
            }
            (WorkflowState::NameEntry { .. }, Key::Escape) => None,
            (WorkflowState::SubmitFailed { .. }, Key::Enter) => {
                self.retry().await;
                None
            }
            (WorkflowState::SubmitFailed { score, name, submitted, .. }, Key::Escape) => {
                // Back to editing, unless the score is already recorded.
                if !*submitted {
                    self.state = WorkflowState::NameEntry {
                        score: *score,
                        name: NameEntry::with_text(self.rules, name),
                        hint: None,
                    };
                }
                None
            }
            (WorkflowState::SubmitFailed { .. }, _) => None,
            (WorkflowState::LeaderboardShown { .. }, Key::Enter)
            | (WorkflowState::LeaderboardShown { .. }, Key::Escape) => {
                self.state = WorkflowState::Idle;
                None
            }
            (_, key) => Some(key),
        }
    }

    /// Repeats the request that failed, reusing the name already entered.
    /// Does nothing outside the failed state.
    pub async fn retry(&mut self) {
        if let WorkflowState::SubmitFailed {
            score,
            name,
            submitted,
            ..
        } = &self.state
        {
            let (score, name, submitted) = (*score, name.clone(), *submitted);
            self.submit(score, name, submitted).await;
        }
    }

    async fn submit(&mut self, score: GameScore, name: String, submitted: bool) {
        if !submitted {
            match self.service.submit(&name, score).await {
                Ok(()) => {}
                Err(ServiceError::Rejected(reason)) => {
                    self.state = WorkflowState::NameEntry {
                        score,
                        name: NameEntry::with_text(self.rules, &name),
                        hint: Some(reason),
                    };
                    return;
                }
                Err(error) => {
                    log::warn!("Score submission failed: {}", error);
                    self.state = WorkflowState::SubmitFailed {
                        score,
                        name,
                        submitted: false,
                        error,
                    };
                    return;
                }
            }
        }

        self.state = match self.service.leaderboard().await {
            Ok(entries) => WorkflowState::LeaderboardShown { entries },
            Err(error) => {
                log::warn!("Leaderboard request failed: {}", error);
                WorkflowState::SubmitFailed {
                    score,
                    name,
                    submitted: true,
                    error,
                }
            }
        };
    }
}

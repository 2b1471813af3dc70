use tokio::sync::mpsc;

use crate::database::GameScore;

/// Lifecycle notifications emitted by the game engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// The running score changed.
    Scored(GameScore),
    /// The engine paused the run.
    Pause,
    /// The engine cleared its overlay: a run started or resumed.
    ClearScreen,
    /// The run ended with the given score.
    GameOver(GameScore),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

/// Everything the workflow reacts to, merged onto one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Game(GameEvent),
    Key(Key),
}

impl From<GameEvent> for Input {
    fn from(event: GameEvent) -> Self {
        Self::Game(event)
    }
}

impl From<Key> for Input {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

/// Handle the engine uses to notify the workflow, replacing
/// per-event global callbacks.
#[derive(Clone, Debug)]
pub struct GameNotifier {
    sender: mpsc::Sender<Input>,
}

impl GameNotifier {
    pub fn new(sender: mpsc::Sender<Input>) -> Self {
        Self { sender }
    }

    /// Returns `false` once the workflow has stopped listening.
    pub async fn notify(&self, event: GameEvent) -> bool {
        self.sender.send(event.into()).await.is_ok()
    }

    pub async fn key_press(&self, key: Key) -> bool {
        self.sender.send(key.into()).await.is_ok()
    }
}

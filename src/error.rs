use thiserror::Error;

/// The result of attempting an invalid operation on a [crate::session::Room].
///
/// The game engine itself never raises these: malformed or out-of-turn input
/// is silently ignored there, so a game always produces a valid next state.
/// These errors exist so the transport layer can report misuse to clients.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("room does not exist")]
    RoomNotFound,
    #[error("room is full")]
    RoomFull,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("game has not started")]
    GameNotStarted,
    #[error("only the host can do that")]
    NotHost,
    #[error("this action cannot be performed during this phase of the game")]
    WrongPhase,
    #[error("invalid player index")]
    InvalidPlayerIndex,
}

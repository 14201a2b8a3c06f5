use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("a tracking session is already active")]
    SessionActive,

    #[error("no active tracking session")]
    NoSession,

    #[error("tracking session ended unexpectedly")]
    SessionLost,
}

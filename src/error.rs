//! Error types for the rules engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Phase or action sequencing violated by the caller. Recoverable: the
    /// caller must resubmit a valid decision.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A submitted roll tally or target is inconsistent with current state.
    /// The action is aborted and no state is mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A game rule would be broken (modifier caps, promotion with no
    /// eligible match, illegal action kind). Nothing is applied.
    #[error("Rule violation: {0}")]
    RuleViolation(String),

    /// A reference-data lookup missed. Indicates a setup defect; not
    /// recoverable mid-game.
    #[error("Unknown definition: {0}")]
    UnknownDefinition(String),

    /// Acting with an army that has no eligible units.
    #[error("Army {0} has no eligible units")]
    EmptyArmy(u32),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Invalid catalog format: {0}")]
    InvalidCatalogFormat(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

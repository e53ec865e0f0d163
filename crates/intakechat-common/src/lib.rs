pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ChatTurn, Phase, Profile, SessionId, SourceContent, TurnOutcome};

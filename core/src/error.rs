use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Duplicate mine placement")]
    DuplicateMine,
}

pub type Result<T> = core::result::Result<T, GameError>;

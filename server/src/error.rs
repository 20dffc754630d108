use thiserror::Error;

/// Failures raised while building or mutating the game session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read word corpus: {0}")]
    Corpus(#[from] std::io::Error),
    #[error("word corpus has {available} usable words, a board needs {required}")]
    InsufficientCorpus { required: usize, available: usize },
    #[error("word {0:?} appears more than once on the board")]
    DuplicateWord(String),
    #[error("card index {0} is outside the board")]
    IndexOutOfRange(usize),
}

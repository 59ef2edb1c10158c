use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("asset root {} is not a directory", .path.display())]
    MissingRoot { path: PathBuf },

    #[error("entry document {} not found", .path.display())]
    MissingEntry { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

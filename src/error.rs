use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagSweepError {
    /// The `exiftool` binary could not be spawned. Fatal at startup.
    #[error("ExifTool not found on PATH")]
    ToolNotFound,

    /// ExifTool exited with a status other than 0 or 1.
    /// Exit code 1 means "minor errors, files processed" and is accepted.
    #[error("ExifTool exited with status {status}: {stderr}")]
    ToolExecution { status: i32, stderr: String },

    #[error("unexpected ExifTool output: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, TagSweepError>;

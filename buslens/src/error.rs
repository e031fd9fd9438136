use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("waveform error: {0}")]
    Waveform(#[from] buslens_waveform::WaveformError),

    #[error("could not parse signal map {path}: {source}")]
    SignalMap {
        path: PathBuf,
        source: serde_json::Error,
    },
}

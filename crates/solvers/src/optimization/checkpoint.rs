use std::{
    convert::Infallible,
    io::{self, Write},
};

use serde::{Deserialize, Serialize};

/// Snapshot of an accepted design iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Number of completed iterations.
    pub iter: usize,

    /// Objective value at `x`, if it was evaluated.
    pub value: Option<f64>,

    /// Design variables.
    pub x: Vec<f64>,

    /// Physical field produced by the parameterization chain.
    pub field: Vec<f64>,

    /// Physical state returned by the forward solve.
    pub state: Vec<f64>,
}

/// Destination for periodic snapshots of an optimization run.
pub trait Checkpoint {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persists one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written. The run continues
    /// either way.
    fn save(&mut self, record: &Record) -> Result<(), Self::Error>;
}

/// Discards every record.
impl Checkpoint for () {
    type Error = Infallible;

    fn save(&mut self, _record: &Record) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Writes each record as one line of JSON.
#[derive(Debug)]
pub struct JsonLines<W> {
    writer: W,
}

/// Errors writing a JSON-lines checkpoint.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("checkpoint serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl<W: Write> JsonLines<W> {
    /// Creates a writer over `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consumes the checkpoint and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Checkpoint for JsonLines<W> {
    type Error = CheckpointError;

    fn save(&mut self, record: &Record) -> Result<(), Self::Error> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

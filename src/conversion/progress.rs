//! Normalized progress over one or two engine passes.

use mediaconv_av::{Engine, EngineJob, TimecodeStream};
use mediaconv_common::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound of first-pass progress in a two-pass encode.
const FIRST_PASS_CEILING: f64 = 0.5 - 1e-9;

/// A fully validated conversion, ready to hand to an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Flags placed before the input.
    pub pre_options: Vec<String>,
    /// One compiled flag list per pass.
    pub passes: Vec<Vec<String>>,
    /// Source duration in seconds.
    pub duration: f64,
}

impl ConversionJob {
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Engine invocation for pass `index` (zero based).
    pub fn engine_job(&self, index: usize, timeout: Option<Duration>) -> EngineJob {
        EngineJob::new(
            self.input.clone(),
            self.output.clone(),
            self.passes.get(index).cloned().unwrap_or_default(),
        )
        .with_pre_options(self.pre_options.clone())
        .with_timeout(timeout)
    }

    /// Map a raw timecode of pass `index` into overall progress.
    fn fraction(&self, index: usize, timecode: f64) -> f64 {
        let fraction = timecode / self.duration;
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match (self.pass_count(), index) {
            (2, 0) => (fraction * 0.5).min(FIRST_PASS_CEILING),
            (2, _) => 0.5 + fraction * 0.5,
            _ => fraction,
        }
    }
}

enum State {
    Pending(usize),
    Running(usize, TimecodeStream),
    Done,
}

/// Lazily driven conversion yielding progress in `[0, 1]`.
///
/// Nothing runs until the first call to `next`. Passes run strictly in
/// sequence; an error ends the sequence and no later pass is started.
/// Dropping the iterator stops the running pass.
pub struct ConversionProgress {
    engine: Arc<dyn Engine>,
    job: ConversionJob,
    timeout: Option<Duration>,
    state: State,
    last: f64,
}

impl ConversionProgress {
    pub(crate) fn new(engine: Arc<dyn Engine>, job: ConversionJob, timeout: Option<Duration>) -> Self {
        Self {
            engine,
            job,
            timeout,
            state: State::Pending(0),
            last: 0.0,
        }
    }

    pub fn job(&self) -> &ConversionJob {
        &self.job
    }
}

impl Iterator for ConversionProgress {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Done => return None,
                State::Pending(index) => {
                    if index >= self.job.pass_count() {
                        tracing::info!("Conversion of {:?} finished", self.job.input);
                        return None;
                    }
                    tracing::info!(
                        "Starting pass {}/{} for {:?}",
                        index + 1,
                        self.job.pass_count(),
                        self.job.input
                    );
                    let engine_job = self.job.engine_job(index, self.timeout);
                    tracing::debug!("Engine flags: {:?}", engine_job.flags);
                    match self.engine.convert(&engine_job) {
                        Ok(stream) => self.state = State::Running(index, stream),
                        Err(e) => return Some(Err(e)),
                    }
                }
                State::Running(index, mut stream) => match stream.next() {
                    Some(Ok(timecode)) => {
                        let value = self.job.fraction(index, timecode).max(self.last);
                        self.last = value;
                        self.state = State::Running(index, stream);
                        return Some(Ok(value));
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Pass {} failed: {}", index + 1, e);
                        return Some(Err(e));
                    }
                    None => self.state = State::Pending(index + 1),
                },
            }
        }
    }
}

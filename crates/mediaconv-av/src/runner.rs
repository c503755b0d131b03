//! FFmpeg process spawning with pull-based progress.
//!
//! [`FfmpegRun`] owns the child process. A reader thread parses the progress
//! pipe and forwards timecodes over a channel; the consumer pulls them through
//! the [`Iterator`] impl and waits at most the configured timeout for each
//! one. Dropping the run kills and reaps the child.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mediaconv_common::{Error, Result};
use parking_lot::Mutex;

use crate::engine::EngineJob;
use crate::progress::ProgressParser;

/// Keep only the last N bytes of stderr to avoid unbounded memory growth.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Lines of stderr quoted in error messages.
const STDERR_TAIL_LINES: usize = 5;

/// Full ffmpeg argument list for a job.
pub fn build_args(job: &EngineJob) -> Vec<String> {
    let mut args: Vec<String> = ["-nostdin", "-progress", "pipe:1", "-nostats"]
        .into_iter()
        .map(String::from)
        .collect();
    args.extend(job.pre_options.iter().cloned());
    args.push("-i".to_string());
    args.push(job.input.to_string_lossy().into_owned());
    args.extend(job.flags.iter().cloned());
    args.push("-y".to_string());
    args.push(job.output.to_string_lossy().into_owned());
    args
}

/// A running ffmpeg conversion.
pub struct FfmpegRun {
    child: Option<Child>,
    timecodes: Receiver<f64>,
    stderr: Arc<Mutex<Vec<u8>>>,
    readers: Vec<thread::JoinHandle<()>>,
    timeout: Option<Duration>,
    finished: bool,
}

impl FfmpegRun {
    /// Spawn ffmpeg for `job`.
    pub fn spawn(ffmpeg: &Path, job: &EngineJob) -> Result<Self> {
        let args = build_args(job);
        tracing::debug!("Spawning {}: {:?}", ffmpeg.display(), args);

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found("ffmpeg")
                } else {
                    Error::engine("ffmpeg", format!("failed to spawn: {e}"))
                }
            })?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(out), Some(err)) => (out, err),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::engine("ffmpeg", "failed to capture output pipes"));
            }
        };

        let (tx, rx) = mpsc::channel();
        let progress_reader = thread::spawn(move || {
            let mut parser = ProgressParser::new();
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if let Some(timecode) = parser.feed(&line) {
                    if tx.send(timecode).is_err() {
                        break;
                    }
                }
            }
        });

        let stderr_buffer = Arc::new(Mutex::new(Vec::new()));
        let stderr_reader = collect_stderr(stderr, Arc::clone(&stderr_buffer));

        Ok(Self {
            child: Some(child),
            timecodes: rx,
            stderr: stderr_buffer,
            readers: vec![progress_reader, stderr_reader],
            timeout: job.timeout,
            finished: false,
        })
    }

    /// Last lines ffmpeg wrote to stderr.
    pub fn stderr_tail(&self) -> String {
        let bytes = self.stderr.lock();
        let text = String::from_utf8_lossy(&bytes);
        let mut tail: Vec<&str> = text
            .lines()
            .rev()
            .filter(|l| !l.trim().is_empty())
            .take(STDERR_TAIL_LINES)
            .collect();
        tail.reverse();
        tail.join("; ")
    }

    fn next_timecode(&self) -> std::result::Result<f64, RecvTimeoutError> {
        match self.timeout {
            Some(timeout) => self.timecodes.recv_timeout(timeout),
            None => self
                .timecodes
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        }
    }

    fn join_readers(&mut self) {
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
    }

    /// Wait for the process after its progress pipe closed.
    fn finish(&mut self) -> Result<()> {
        self.join_readers();
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait()?;
        if status.success() {
            tracing::info!("ffmpeg completed successfully");
            Ok(())
        } else {
            let tail = self.stderr_tail();
            tracing::warn!("ffmpeg failed ({}): {}", status, tail);
            Err(Error::engine("ffmpeg", format!("exited with {status}: {tail}")))
        }
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if matches!(child.try_wait(), Ok(None)) {
                tracing::debug!("Terminating ffmpeg process {}", child.id());
                let _ = child.kill();
            }
            let _ = child.wait();
        }
        self.join_readers();
    }
}

impl Iterator for FfmpegRun {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_timecode() {
            Ok(timecode) => Some(Ok(timecode)),
            Err(RecvTimeoutError::Timeout) => {
                self.finished = true;
                self.kill();
                let timeout = self.timeout.unwrap_or_default();
                tracing::warn!("ffmpeg made no progress for {:?}, killed", timeout);
                Some(Err(Error::EngineTimeout(timeout)))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.finished = true;
                self.finish().err().map(Err)
            }
        }
    }
}

impl Drop for FfmpegRun {
    fn drop(&mut self) {
        self.kill();
    }
}

fn collect_stderr<R: Read + Send + 'static>(
    reader: R,
    buffer: Arc<Mutex<Vec<u8>>>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::with_capacity(256);
        while reader.read_until(b'\n', &mut line).unwrap_or(0) > 0 {
            let mut guard = buffer.lock();
            guard.extend_from_slice(&line);
            if guard.len() > MAX_STDERR_BYTES {
                let excess = guard.len() - MAX_STDERR_BYTES;
                guard.drain(..excess);
            }
            drop(guard);
            line.clear();
        }
    })
}

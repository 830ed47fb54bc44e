//! Demonstration recorder.
//!
//! Buffers steps while an episode is being driven and writes the finished
//! demonstration to a directory (a temporary one when none is given).

use std::path::{Path, PathBuf};

use ndarray::Array1;
use tempfile::TempDir;

use super::Demo;
use crate::env::{Environment, StepOutcome};
use crate::error::DemoFileError;

/// Records demonstrations from a live environment.
pub struct DemoRecorder {
    demo_dir: PathBuf,
    _temp_dir: Option<TempDir>,
    demo: Option<Demo>,
    recording: bool,
}

impl DemoRecorder {
    /// Create a recorder writing into `demo_dir`, or into a temporary
    /// directory that lives as long as the recorder when `None`.
    pub fn new(demo_dir: Option<PathBuf>) -> Result<Self, std::io::Error> {
        let (demo_dir, temp_dir) = match demo_dir {
            Some(dir) => (dir, None),
            None => {
                let temp = TempDir::new()?;
                (temp.path().to_path_buf(), Some(temp))
            }
        };
        Ok(Self {
            demo_dir,
            _temp_dir: temp_dir,
            demo: None,
            recording: false,
        })
    }

    /// Start recording an episode of `env`. No-op while already recording.
    pub fn record(&mut self, env: &dyn Environment, lightweight: bool) {
        if self.recording {
            return;
        }
        self.recording = true;
        self.demo = Some(if lightweight {
            Demo::lightweight_from_env(env)
        } else {
            Demo::from_env(env)
        });
    }

    /// Stop recording. The buffered demonstration stays available.
    pub fn stop(&mut self) {
        self.recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Append a step while recording; dropped otherwise.
    pub fn add_timestep(&mut self, outcome: StepOutcome, action: Array1<f64>) {
        if !self.recording {
            return;
        }
        if let Some(demo) = self.demo.as_mut() {
            demo.record_outcome(outcome, action);
        }
    }

    /// The demonstration recorded so far.
    pub fn demo(&self) -> Option<&Demo> {
        self.demo.as_ref()
    }

    pub fn demo_dir(&self) -> &Path {
        &self.demo_dir
    }

    /// Write the buffered demonstration and clear the recorder. Returns
    /// `None` when nothing was recorded.
    pub fn save_demo(&mut self, filename: Option<&str>) -> Result<Option<PathBuf>, DemoFileError> {
        let Some(demo) = self.demo.take() else {
            return Ok(None);
        };
        let filename = filename
            .map(str::to_string)
            .unwrap_or_else(|| demo.metadata().filename());
        let path = demo.save(self.demo_dir.join(filename))?;
        self.recording = false;
        Ok(Some(path))
    }
}

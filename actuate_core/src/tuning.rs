//! File-backed one-pedal tuning store.
//!
//! Reads the `[one_pedal]` table of a TOML file whenever its modification
//! time changes. Parse and range errors are reported to the caller; the
//! controller keeps its current tuning in that case.

use crate::config::OnePedalTuning;
use actuate_traits::{BoxError, TuningSource};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug)]
pub struct TuningFile {
    path: PathBuf,
    seen: Option<SystemTime>,
}

impl TuningFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<OnePedalTuning, BoxError> {
        let text = std::fs::read_to_string(&self.path)?;
        let cfg = actuate_config::load_toml(&text)?;
        cfg.one_pedal.validate().map_err(|e| e.to_string())?;
        Ok(OnePedalTuning::try_from(&cfg.one_pedal)?)
    }
}

impl TuningSource<OnePedalTuning> for TuningFile {
    fn poll(&mut self) -> Result<Option<OnePedalTuning>, BoxError> {
        let modified = std::fs::metadata(&self.path)?.modified()?;
        if self.seen == Some(modified) {
            return Ok(None);
        }
        self.seen = Some(modified);
        tracing::debug!(path = %self.path.display(), "tuning file changed");
        self.read().map(Some)
    }
}

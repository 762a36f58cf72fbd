use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechCapability {
    Available { program: PathBuf },
    Unavailable { reason: String },
}

impl SpeechCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

pub trait SpeechDetector {
    fn detect(&self) -> SpeechCapability;
}

/// Treats speech input as available when the configured recognizer program
/// can be found on the search path.
#[derive(Debug, Clone)]
pub struct PathSpeechDetector {
    program: Option<String>,
    search_path: Option<OsString>,
}

impl PathSpeechDetector {
    pub fn new(program: Option<String>) -> Self {
        Self {
            program,
            search_path: env::var_os("PATH"),
        }
    }

    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }
}

impl SpeechDetector for PathSpeechDetector {
    fn detect(&self) -> SpeechCapability {
        let Some(program) = self.program.as_deref().map(str::trim).filter(|p| !p.is_empty())
        else {
            return SpeechCapability::Unavailable {
                reason: "no speech recognizer configured".to_string(),
            };
        };

        let found = match (&self.search_path, env::current_dir()) {
            (Some(paths), Ok(cwd)) => which::which_in(program, Some(paths), cwd),
            _ => which::which(program),
        };

        match found {
            Ok(program) => {
                debug!(program = %program.display(), "speech recognizer found");
                SpeechCapability::Available { program }
            }
            Err(err) => {
                debug!(program, %err, "speech recognizer not found");
                SpeechCapability::Unavailable {
                    reason: format!("{program} not found on PATH"),
                }
            }
        }
    }
}

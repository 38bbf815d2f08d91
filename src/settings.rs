use clap::ValueEnum;
use thiserror::Error;

/// Cells on every function's tape.
pub const DATA_LENGTH: usize = 10_240;
/// Deepest allowed nesting of calls and loops.
pub const MAX_DEPTH: usize = 512;

/// What happens when the head moves past either end of the tape.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum HeadPolicy {
    /// Fail the running frame.
    #[default]
    Reject,
    /// Continue from the opposite end.
    Wrap,
}

/// Value stored by `,` once input is exhausted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum EofBehavior {
    /// 255, the C `EOF` marker truncated to a byte.
    #[default]
    Max,
    Zero,
    /// Leave the cell as it was.
    Keep,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("tape length must be at least 1")]
    EmptyTape,
    #[error("max depth must be at least 1")]
    ZeroDepth,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tape_length: usize,
    pub max_depth: usize,
    pub head: HeadPolicy,
    pub eof: EofBehavior,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tape_length: DATA_LENGTH,
            max_depth: MAX_DEPTH,
            head: HeadPolicy::default(),
            eof: EofBehavior::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tape_length == 0 {
            return Err(SettingsError::EmptyTape);
        }
        if self.max_depth == 0 {
            return Err(SettingsError::ZeroDepth);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::settings::{EofBehavior, HeadPolicy, Settings, SettingsError, DATA_LENGTH};

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.tape_length, DATA_LENGTH);
        assert_eq!((settings.head, settings.eof), (HeadPolicy::Reject, EofBehavior::Max));
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn rejects_empty_limits() {
        assert_eq!(Settings { tape_length: 0, ..Settings::default() }.validate(), Err(SettingsError::EmptyTape));
        assert_eq!(Settings { max_depth: 0, ..Settings::default() }.validate(), Err(SettingsError::ZeroDepth));
        assert_eq!(Settings { tape_length: 0, max_depth: 0, ..Settings::default() }.validate(), Err(SettingsError::EmptyTape));
    }
}

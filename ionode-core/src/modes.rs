//! Mode traits
//!
//! Each backend registers one initialization routine per pin mode. The
//! table is checked when the backend is built, so a missing routine is a
//! construction error instead of a runtime surprise.

use crate::config::PinMode;
use crate::error::IoError;
use crate::registry::PinId;

/// Initialization routine for one mode
pub type ModeInit<B> = fn(&mut B, PinId) -> Result<(), IoError>;

/// Behavior record of one mode
pub struct ModeTrait<B> {
    pub mode: PinMode,
    pub init: ModeInit<B>,
}

impl<B> ModeTrait<B> {
    pub const fn new(mode: PinMode, init: ModeInit<B>) -> Self {
        Self { mode, init }
    }
}

/// Complete mode → routine mapping
pub struct ModeTraits<B> {
    handlers: [Option<ModeInit<B>>; PinMode::COUNT],
}

impl<B> ModeTraits<B> {
    /// Build the table, failing on the first mode without a routine
    pub fn build(entries: &[ModeTrait<B>]) -> Result<Self, IoError> {
        let mut handlers: [Option<ModeInit<B>>; PinMode::COUNT] = [None; PinMode::COUNT];
        for entry in entries {
            handlers[entry.mode.index()] = Some(entry.init);
        }

        if let Some(mode) = PinMode::ALL
            .into_iter()
            .find(|mode| handlers[mode.index()].is_none())
        {
            return Err(IoError::MissingModeHandler(mode));
        }

        Ok(Self { handlers })
    }

    /// Routine for a mode
    pub fn get(&self, mode: PinMode) -> Result<ModeInit<B>, IoError> {
        self.handlers[mode.index()].ok_or(IoError::MissingModeHandler(mode))
    }
}

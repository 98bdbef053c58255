use serde::{Deserialize, Serialize};

use crate::color::Channels;
use crate::error::Result;

/// Per-call decode settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Output channel layout; `None` keeps the image's native layout.
    pub channels: Option<Channels>,
    /// Return rows bottom-to-top.
    pub flip_vertically: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from a raw desired-channel count, 0 meaning native.
    pub fn from_desired(count: i64, flip_vertically: bool) -> Result<Self> {
        Ok(Self {
            channels: Channels::desired(count)?,
            flip_vertically,
        })
    }

    pub fn with_channels(mut self, channels: impl Into<Option<Channels>>) -> Self {
        self.channels = channels.into();
        self
    }

    pub fn with_flip(mut self, flip_vertically: bool) -> Self {
        self.flip_vertically = flip_vertically;
        self
    }
}

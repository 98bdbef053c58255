use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter};

use crate::error::{Error, Result};

/// Interleaved channel layout of a pixel. Layouts with an even count carry
/// alpha in the last position.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    EnumCount,
    EnumIter,
    strum::Display,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channels {
    Gray = 1,
    GrayAlpha = 2,
    Rgb = 3,
    Rgba = 4,
}

impl Channels {
    pub fn count(self) -> usize {
        self as usize
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Channels::GrayAlpha | Channels::Rgba)
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    /// Interpret a raw desired-channel request: 0 keeps the native layout.
    pub fn desired(count: i64) -> Result<Option<Self>> {
        if count == 0 {
            return Ok(None);
        }
        u8::try_from(count)
            .ok()
            .and_then(|c| Self::try_from(c).ok())
            .map(Some)
            .ok_or(Error::InvalidChannels(count))
    }
}

/// Transfer function tag carried by QOI headers.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TryFromPrimitive, strum::Display,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColorSpace {
    /// sRGB with linear alpha
    Srgb = 0,
    Linear = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desired_counts() {
        assert_eq!(Channels::desired(0).unwrap(), None);
        assert_eq!(Channels::desired(1).unwrap(), Some(Channels::Gray));
        assert_eq!(Channels::desired(4).unwrap(), Some(Channels::Rgba));
        assert!(matches!(
            Channels::desired(5),
            Err(Error::InvalidChannels(5))
        ));
        assert!(matches!(
            Channels::desired(-1),
            Err(Error::InvalidChannels(-1))
        ));
    }

    #[test]
    fn alpha_is_last_for_even_layouts() {
        let with_alpha: Vec<_> = Channels::iter().filter(|c| c.has_alpha()).collect();
        assert_eq!(with_alpha, vec![Channels::GrayAlpha, Channels::Rgba]);
        assert!(with_alpha.iter().all(|c| c.count() % 2 == 0));
        assert_eq!(Channels::COUNT, 4);
    }

    #[test]
    fn color_space_bytes() {
        assert_eq!(ColorSpace::try_from(0u8).unwrap(), ColorSpace::Srgb);
        assert_eq!(ColorSpace::try_from(1u8).unwrap(), ColorSpace::Linear);
        assert!(ColorSpace::try_from(2u8).is_err());
    }
}

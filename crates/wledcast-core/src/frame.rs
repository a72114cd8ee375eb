//! DMX512 frames and the WLED channel conventions built on top of them.

use crate::protocols::sacn::error::EncodingError;
use crate::protocols::sacn::layout::DMX_MAX_SLOTS;

/// Channels per LED in WLED's RGBW multi-LED mode.
pub const CHANNELS_PER_LED: usize = 4;
/// LEDs addressable within one universe in RGBW mode.
pub const LEDS_PER_UNIVERSE: usize = DMX_MAX_SLOTS / CHANNELS_PER_LED;

/// One universe of channel values; index 0 is DMX channel 1.
///
/// # Examples
/// ```
/// use wledcast_core::DmxFrame;
///
/// let frame = DmxFrame::preset(255, 5);
/// assert_eq!(frame.get(1), Some(255));
/// assert_eq!(frame.get(2), Some(5));
/// assert_eq!(frame.as_slice().len(), 512);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxFrame {
    slots: [u8; DMX_MAX_SLOTS],
}

impl Default for DmxFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl DmxFrame {
    /// All channels at zero.
    pub fn new() -> Self {
        Self {
            slots: [0u8; DMX_MAX_SLOTS],
        }
    }

    /// Copy a raw buffer; it must hold exactly 512 values.
    pub fn from_slice(values: &[u8]) -> Result<Self, EncodingError> {
        let slots = values
            .try_into()
            .map_err(|_| EncodingError::InvalidFrameLength {
                length: values.len(),
            })?;
        Ok(Self { slots })
    }

    /// Set a 1-based DMX channel.
    pub fn set(&mut self, channel: usize, value: u8) -> Result<(), EncodingError> {
        let slot = channel
            .checked_sub(1)
            .and_then(|index| self.slots.get_mut(index))
            .ok_or(EncodingError::InvalidChannel { channel })?;
        *slot = value;
        Ok(())
    }

    /// Read a 1-based DMX channel.
    pub fn get(&self, channel: usize) -> Option<u8> {
        channel
            .checked_sub(1)
            .and_then(|index| self.slots.get(index))
            .copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.slots
    }

    /// WLED preset mode: channel 1 is master brightness, channel 2 the
    /// preset id.
    pub fn preset(brightness: u8, preset: u8) -> Self {
        let mut frame = Self::new();
        frame.slots[0] = brightness;
        frame.slots[1] = preset;
        frame
    }

    /// Preset-mode power: on keeps the current preset (0) at `brightness`,
    /// off drops brightness to zero.
    pub fn power(on: bool, brightness: u8) -> Self {
        if on {
            Self::preset(brightness, 0)
        } else {
            Self::preset(0, 0)
        }
    }

    /// RGBW LED buffer; white stays 0 and LEDs beyond one universe are
    /// ignored.
    pub fn leds(colors: &[[u8; 3]]) -> Self {
        let mut frame = Self::new();
        for (chunk, color) in frame
            .slots
            .chunks_exact_mut(CHANNELS_PER_LED)
            .zip(colors.iter().take(LEDS_PER_UNIVERSE))
        {
            chunk[..3].copy_from_slice(color);
        }
        frame
    }

    /// The same colour on the first `led_count` LEDs, scaled by
    /// `brightness`.
    pub fn solid_color(rgb: [u8; 3], brightness: u8, led_count: usize) -> Self {
        let scaled = rgb.map(|c| scale(c, brightness));
        let count = led_count.min(LEDS_PER_UNIVERSE);
        Self::leds(&vec![scaled; count])
    }

    pub fn blackout() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for DmxFrame {
    fn as_ref(&self) -> &[u8] {
        &self.slots
    }
}

fn scale(value: u8, brightness: u8) -> u8 {
    ((value as u16 * brightness as u16) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::{DmxFrame, LEDS_PER_UNIVERSE};
    use crate::protocols::sacn::error::EncodingError;

    #[test]
    fn from_slice_requires_512_values() {
        let err = DmxFrame::from_slice(&[0u8; 511]).unwrap_err();
        assert_eq!(err, EncodingError::InvalidFrameLength { length: 511 });
        assert!(DmxFrame::from_slice(&[1u8; 512]).is_ok());
    }

    #[test]
    fn channels_are_one_based() {
        let mut frame = DmxFrame::new();
        frame.set(1, 10).unwrap();
        frame.set(512, 20).unwrap();
        assert_eq!(frame.as_slice()[0], 10);
        assert_eq!(frame.as_slice()[511], 20);
        assert_eq!(
            frame.set(0, 1).unwrap_err(),
            EncodingError::InvalidChannel { channel: 0 }
        );
        assert_eq!(
            frame.set(513, 1).unwrap_err(),
            EncodingError::InvalidChannel { channel: 513 }
        );
    }

    #[test]
    fn power_off_zeroes_brightness() {
        assert_eq!(DmxFrame::power(false, 200), DmxFrame::preset(0, 0));
        assert_eq!(DmxFrame::power(true, 200).get(1), Some(200));
    }

    #[test]
    fn leds_use_rgbw_layout() {
        let frame = DmxFrame::leds(&[[1, 2, 3], [4, 5, 6]]);
        assert_eq!(&frame.as_slice()[..8], &[1, 2, 3, 0, 4, 5, 6, 0]);
        assert!(frame.as_slice()[8..].iter().all(|v| *v == 0));
    }

    #[test]
    fn solid_color_scales_and_caps_led_count() {
        let frame = DmxFrame::solid_color([255, 128, 0], 128, 1000);
        assert_eq!(&frame.as_slice()[..4], &[128, 64, 0, 0]);
        let last = (LEDS_PER_UNIVERSE - 1) * 4;
        assert_eq!(&frame.as_slice()[last..last + 4], &[128, 64, 0, 0]);
    }

    #[test]
    fn blackout_is_all_zero() {
        assert!(DmxFrame::blackout().as_slice().iter().all(|v| *v == 0));
    }
}

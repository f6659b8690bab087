//! Co-processor program images as emitted by the ULP toolchain.
//!
//! An image starts with a 12-byte header: magic `"ulp\0"`, then the text
//! offset, text size, data size and bss size as little-endian `u16`s. Text and
//! data are copied to the start of RTC slow memory; bss is zero-filled after
//! them.

use core::{fmt, time::Duration};

pub const SAMPLER_IMAGE_MAGIC: u32 = 0x0070_6C75;
pub const SAMPLER_HEADER_LEN: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerImageError {
    /// No image was built into the firmware.
    Missing,
    Truncated,
    BadMagic,
    Misaligned,
    /// Program plus bss would overlap the mailbox.
    TooLarge { words: usize, capacity: usize },
}

impl SamplerImageError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Truncated => "truncated",
            Self::BadMagic => "bad_magic",
            Self::Misaligned => "misaligned",
            Self::TooLarge { .. } => "too_large",
        }
    }
}

impl fmt::Display for SamplerImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { words, capacity } => {
                write!(f, "too_large words={} capacity={}", words, capacity)
            }
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerImage<'a> {
    body: &'a [u8],
    bss_words: usize,
}

impl<'a> SamplerImage<'a> {
    /// Validates `bytes` against a load region of `capacity_words` words.
    pub fn parse(bytes: &'a [u8], capacity_words: usize) -> Result<Self, SamplerImageError> {
        if bytes.is_empty() {
            return Err(SamplerImageError::Missing);
        }
        if bytes.len() < SAMPLER_HEADER_LEN {
            return Err(SamplerImageError::Truncated);
        }
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != SAMPLER_IMAGE_MAGIC {
            return Err(SamplerImageError::BadMagic);
        }
        let half = |at: usize| usize::from(u16::from_le_bytes([bytes[at], bytes[at + 1]]));
        let text_offset = half(4);
        let text_size = half(6);
        let data_size = half(8);
        let bss_size = half(10);

        if text_offset < SAMPLER_HEADER_LEN || (text_size | data_size | bss_size) % 4 != 0 {
            return Err(SamplerImageError::Misaligned);
        }
        let body_end = text_offset + text_size + data_size;
        let body = bytes
            .get(text_offset..body_end)
            .ok_or(SamplerImageError::Truncated)?;

        let image = Self {
            body,
            bss_words: bss_size / 4,
        };
        if image.total_words() > capacity_words {
            return Err(SamplerImageError::TooLarge {
                words: image.total_words(),
                capacity: capacity_words,
            });
        }
        Ok(image)
    }

    /// Text and data, in load order.
    pub fn words(&self) -> impl Iterator<Item = u32> + 'a {
        self.body
            .chunks_exact(4)
            .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
    }

    pub fn body_words(&self) -> usize {
        self.body.len() / 4
    }

    pub fn bss_words(&self) -> usize {
        self.bss_words
    }

    pub fn total_words(&self) -> usize {
        self.body_words() + self.bss_words
    }
}

/// Co-processor wake period expressed in RTC slow-clock cycles, saturating at
/// the register width and never below one cycle.
pub fn sleep_cycles(period: Duration, slow_clock_hz: u32) -> u32 {
    let cycles = period.as_micros() * u128::from(slow_clock_hz) / 1_000_000;
    cycles.clamp(1, u128::from(u32::MAX)) as u32
}

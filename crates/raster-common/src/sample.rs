//! Sample formats supported by the raster container.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScenarioError;

/// Storage type of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    UInt8,
    UInt16,
    Int16,
    #[default]
    Float32,
}

impl SampleFormat {
    /// Every supported format, narrowest first.
    pub const ALL: [SampleFormat; 4] = [
        SampleFormat::UInt8,
        SampleFormat::UInt16,
        SampleFormat::Int16,
        SampleFormat::Float32,
    ];

    /// Bytes per sample.
    pub fn byte_width(&self) -> usize {
        match self {
            SampleFormat::UInt8 => 1,
            SampleFormat::UInt16 | SampleFormat::Int16 => 2,
            SampleFormat::Float32 => 4,
        }
    }

    /// Bits per sample.
    pub fn bits(&self) -> u16 {
        (self.byte_width() * 8) as u16
    }

    /// TIFF SampleFormat tag value (1 = unsigned, 2 = signed, 3 = IEEE float).
    pub fn tiff_code(&self) -> u16 {
        match self {
            SampleFormat::UInt8 | SampleFormat::UInt16 => 1,
            SampleFormat::Int16 => 2,
            SampleFormat::Float32 => 3,
        }
    }

    /// Resolve a (BitsPerSample, SampleFormat) tag pair.
    pub fn from_tiff(bits: u16, code: u16) -> Result<Self, ScenarioError> {
        match (bits, code) {
            (8, 1) => Ok(SampleFormat::UInt8),
            (16, 1) => Ok(SampleFormat::UInt16),
            (16, 2) => Ok(SampleFormat::Int16),
            (32, 3) => Ok(SampleFormat::Float32),
            _ => Err(ScenarioError::unsupported(format!(
                "{}-bit samples with sample format {}",
                bits, code
            ))),
        }
    }

    /// True for the integer formats.
    pub fn is_integer(&self) -> bool {
        !matches!(self, SampleFormat::Float32)
    }

    /// Inclusive value range of the integer formats.
    pub fn integer_range(&self) -> Option<(f64, f64)> {
        match self {
            SampleFormat::UInt8 => Some((u8::MIN as f64, u8::MAX as f64)),
            SampleFormat::UInt16 => Some((u16::MIN as f64, u16::MAX as f64)),
            SampleFormat::Int16 => Some((i16::MIN as f64, i16::MAX as f64)),
            SampleFormat::Float32 => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleFormat::UInt8 => "uint8",
            SampleFormat::UInt16 => "uint16",
            SampleFormat::Int16 => "int16",
            SampleFormat::Float32 => "float32",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleFormat {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uint8" | "u8" | "byte" => Ok(SampleFormat::UInt8),
            "uint16" | "u16" => Ok(SampleFormat::UInt16),
            "int16" | "i16" => Ok(SampleFormat::Int16),
            "float32" | "f32" => Ok(SampleFormat::Float32),
            _ => Err(ScenarioError::unsupported(format!("sample format '{}'", s))),
        }
    }
}

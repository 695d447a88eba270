//! Conversion between typed sample buffers and `f64` cell values.
//!
//! Encoding applies the precision policy: integer targets accept only
//! integral, in-range values unless lossy conversion is allowed, and the
//! no-data sentinel must always be exactly representable.

use num_traits::{Bounded, NumCast, ToPrimitive};
use raster_common::{Result, SampleFormat, ScenarioError};
use tiff::decoder::DecodingResult;

/// Decoded samples as cell values, checked against the declared format.
pub fn decode(decoded: DecodingResult, format: SampleFormat) -> Result<Vec<f64>> {
    let cells = match (format, decoded) {
        (SampleFormat::UInt8, DecodingResult::U8(v)) => v.into_iter().map(<f64 as From<_>>::from).collect(),
        (SampleFormat::UInt16, DecodingResult::U16(v)) => v.into_iter().map(<f64 as From<_>>::from).collect(),
        (SampleFormat::Int16, DecodingResult::I16(v)) => v.into_iter().map(<f64 as From<_>>::from).collect(),
        (SampleFormat::Float32, DecodingResult::F32(v)) => v.into_iter().map(<f64 as From<_>>::from).collect(),
        (format, _) => {
            return Err(ScenarioError::unsupported(format!(
                "decoded samples do not match the declared {} format",
                format
            )))
        }
    };
    Ok(cells)
}

/// Cells converted to one storage type, ready for the TIFF encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    Int16(Vec<i16>),
    Float32(Vec<f32>),
}

impl Samples {
    pub fn format(&self) -> SampleFormat {
        match self {
            Samples::UInt8(_) => SampleFormat::UInt8,
            Samples::UInt16(_) => SampleFormat::UInt16,
            Samples::Int16(_) => SampleFormat::Int16,
            Samples::Float32(_) => SampleFormat::Float32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::UInt8(v) => v.len(),
            Samples::UInt16(v) => v.len(),
            Samples::Int16(v) => v.len(),
            Samples::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encoding policy for one target sample format.
#[derive(Debug, Clone, Copy)]
pub struct SampleEncoder {
    format: SampleFormat,
    no_data: Option<f64>,
    allow_lossy: bool,
}

impl SampleEncoder {
    /// Fails with `PrecisionLoss` when the sentinel has no exact
    /// representation in `format`, regardless of `allow_lossy`.
    pub fn new(format: SampleFormat, no_data: Option<f64>, allow_lossy: bool) -> Result<Self> {
        if let Some(nd) = no_data {
            if !sentinel_representable(nd, format) {
                return Err(ScenarioError::precision_loss(format!(
                    "no-data value {} is not representable as {}",
                    nd, format
                )));
            }
        }
        Ok(Self {
            format,
            no_data,
            allow_lossy,
        })
    }

    fn is_no_data(&self, value: f64) -> bool {
        match self.no_data {
            Some(nd) if nd.is_nan() => value.is_nan(),
            Some(nd) => value == nd,
            None => false,
        }
    }

    /// Convert every cell to the target type.
    pub fn encode(&self, cells: &[f64]) -> Result<Samples> {
        Ok(match self.format {
            SampleFormat::UInt8 => Samples::UInt8(self.convert_all(cells, |v| v as u8)?),
            SampleFormat::UInt16 => Samples::UInt16(self.convert_all(cells, |v| v as u16)?),
            SampleFormat::Int16 => Samples::Int16(self.convert_all(cells, |v| v as i16)?),
            SampleFormat::Float32 => Samples::Float32(self.convert_all(cells, |v| v as f32)?),
        })
    }

    fn convert_all<T>(&self, cells: &[f64], cast: impl Fn(f64) -> T) -> Result<Vec<T>> {
        cells
            .iter()
            .enumerate()
            .map(|(index, &value)| self.checked(index, value).map(&cast))
            .collect()
    }

    /// The value to store for one cell, already inside the target range.
    fn checked(&self, index: usize, value: f64) -> Result<f64> {
        if self.is_no_data(value) {
            // Representability was checked up front.
            return Ok(value);
        }

        let converted = self.convert(value).map_err(|reason| {
            ScenarioError::precision_loss(format!(
                "cell {} value {} cannot be stored as {}: {}",
                index, value, self.format, reason
            ))
        })?;

        if self.is_no_data(converted) {
            return Err(ScenarioError::precision_loss(format!(
                "cell {} value {} would become the no-data value {} as {}",
                index, value, converted, self.format
            )));
        }

        Ok(converted)
    }

    /// Target-typed value, as f64, for a valid (non-sentinel) cell.
    fn convert(&self, value: f64) -> std::result::Result<f64, &'static str> {
        match self.format {
            SampleFormat::UInt8 => to_integer::<u8>(value, self.allow_lossy),
            SampleFormat::UInt16 => to_integer::<u16>(value, self.allow_lossy),
            SampleFormat::Int16 => to_integer::<i16>(value, self.allow_lossy),
            SampleFormat::Float32 => to_float32(value, self.allow_lossy),
        }
    }
}

fn to_integer<T>(value: f64, allow_lossy: bool) -> std::result::Result<f64, &'static str>
where
    T: NumCast + Bounded + ToPrimitive,
{
    if value.is_nan() {
        return Err("NaN has no integer representation");
    }

    if !allow_lossy {
        if value.fract() != 0.0 {
            return Err("value is not integral");
        }
        let cast: Option<T> = NumCast::from(value);
        return cast
            .and_then(|v| v.to_f64())
            .ok_or("value is out of range");
    }

    let min = T::min_value().to_f64().ok_or("type range unavailable")?;
    let max = T::max_value().to_f64().ok_or("type range unavailable")?;
    // f64::round rounds half away from zero.
    Ok(value.round().clamp(min, max))
}

fn to_float32(value: f64, allow_lossy: bool) -> std::result::Result<f64, &'static str> {
    if !value.is_finite() {
        return Ok(value);
    }
    let narrowed = value as f32;
    if narrowed.is_infinite() {
        if !allow_lossy {
            return Err("value is out of float32 range");
        }
        return Ok(if value > 0.0 { f32::MAX as f64 } else { f32::MIN as f64 });
    }
    Ok(narrowed as f64)
}

/// True when `value` survives a round trip through `format` unchanged.
pub fn sentinel_representable(value: f64, format: SampleFormat) -> bool {
    match format {
        SampleFormat::Float32 => value.is_nan() || (value as f32) as f64 == value,
        _ => to_integer_exact(value, format),
    }
}

fn to_integer_exact(value: f64, format: SampleFormat) -> bool {
    match format.integer_range() {
        Some((min, max)) => value.is_finite() && value.fract() == 0.0 && value >= min && value <= max,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(format: SampleFormat, no_data: Option<f64>, lossy: bool, cells: &[f64]) -> Result<Vec<f64>> {
        let samples = SampleEncoder::new(format, no_data, lossy)?.encode(cells)?;
        assert_eq!(samples.format(), format);
        let decoded = match samples {
            Samples::UInt8(v) => DecodingResult::U8(v),
            Samples::UInt16(v) => DecodingResult::U16(v),
            Samples::Int16(v) => DecodingResult::I16(v),
            Samples::Float32(v) => DecodingResult::F32(v),
        };
        decode(decoded, format)
    }

    #[test]
    fn test_integral_values_pass() {
        let cells = [0.0, 1.0, 255.0];
        assert_eq!(encode(SampleFormat::UInt8, None, false, &cells).unwrap(), cells);

        let cells = [-32768.0, 0.0, 32767.0];
        assert_eq!(encode(SampleFormat::Int16, None, false, &cells).unwrap(), cells);
    }

    #[test]
    fn test_fraction_is_precision_loss() {
        let err = encode(SampleFormat::UInt16, None, false, &[1.5]).unwrap_err();
        assert_eq!(err.kind(), "PrecisionLoss");
    }

    #[test]
    fn test_out_of_range_is_precision_loss() {
        let err = encode(SampleFormat::UInt8, None, false, &[256.0]).unwrap_err();
        assert_eq!(err.kind(), "PrecisionLoss");
        let err = encode(SampleFormat::UInt16, None, false, &[-1.0]).unwrap_err();
        assert_eq!(err.kind(), "PrecisionLoss");
    }

    #[test]
    fn test_lossy_rounds_half_away_and_saturates() {
        let out = encode(SampleFormat::Int16, None, true, &[2.5, -2.5, 1e9, -1e9, 0.4]).unwrap();
        assert_eq!(out, vec![3.0, -3.0, 32767.0, -32768.0, 0.0]);
    }

    #[test]
    fn test_nan_cell_rejected_even_when_lossy() {
        let err = encode(SampleFormat::UInt8, None, true, &[f64::NAN]).unwrap_err();
        assert_eq!(err.kind(), "PrecisionLoss");
    }

    #[test]
    fn test_sentinel_must_be_representable() {
        let err = encode(SampleFormat::UInt8, Some(-9999.0), true, &[1.0]).unwrap_err();
        assert_eq!(err.kind(), "PrecisionLoss");
        let err = encode(SampleFormat::Int16, Some(f64::NAN), true, &[1.0]).unwrap_err();
        assert_eq!(err.kind(), "PrecisionLoss");
        let err = encode(SampleFormat::Float32, Some(0.1), false, &[1.0]).unwrap_err();
        assert_eq!(err.kind(), "PrecisionLoss");
    }

    #[test]
    fn test_sentinel_cells_pass_through() {
        let out = encode(SampleFormat::Int16, Some(-9999.0), false, &[-9999.0, 4.0]).unwrap();
        assert_eq!(out, vec![-9999.0, 4.0]);

        let out = encode(SampleFormat::Float32, Some(f64::NAN), false, &[f64::NAN, 4.0]).unwrap();
        assert!(out[0].is_nan());
        assert_eq!(out[1], 4.0);
    }

    #[test]
    fn test_lossy_collision_with_sentinel() {
        // 254.6 rounds onto the sentinel 255
        let err = encode(SampleFormat::UInt8, Some(255.0), true, &[254.6]).unwrap_err();
        assert_eq!(err.kind(), "PrecisionLoss");
    }

    #[test]
    fn test_float32_rounds_to_nearest() {
        let out = encode(SampleFormat::Float32, None, false, &[0.1]).unwrap();
        assert_eq!(out[0], 0.1f32 as f64);

        let err = encode(SampleFormat::Float32, None, false, &[1e300]).unwrap_err();
        assert_eq!(err.kind(), "PrecisionLoss");
        let out = encode(SampleFormat::Float32, None, true, &[1e300]).unwrap();
        assert_eq!(out[0], f32::MAX as f64);
    }

    #[test]
    fn test_decode_rejects_mismatched_buffer() {
        let err = decode(DecodingResult::U32(vec![1, 2]), SampleFormat::UInt16).unwrap_err();
        assert_eq!(err.kind(), "UnsupportedEncoding");

        let cells = decode(DecodingResult::I16(vec![-2, 2]), SampleFormat::Int16).unwrap();
        assert_eq!(cells, vec![-2.0, 2.0]);
    }
}

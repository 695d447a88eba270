//! Serializing a [`RasterGrid`] to GeoTIFF bytes.

use std::fmt;
use std::io::{Cursor, Seek, Write};
use std::str::FromStr;

use bytes::Bytes;
use raster_common::{RasterGrid, Result, SampleFormat, ScenarioError};
use serde::{Deserialize, Serialize};
use tiff::encoder::colortype::{ColorType, Gray16, Gray32Float, Gray8, GrayI16};
use tiff::encoder::{Compression as TiffCompression, DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::TiffResult;
use tracing::debug;

use crate::samples::{SampleEncoder, Samples};
use crate::tags::{self, geokey};
use crate::tiff_error;

/// Strip compression written by the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    PackBits,
}

impl Compression {
    pub fn tiff_code(&self) -> u16 {
        match self {
            Compression::None => tags::compression::NONE,
            Compression::PackBits => tags::compression::PACKBITS,
        }
    }

    pub fn from_tiff_code(code: u32) -> Option<Self> {
        match code {
            c if c == tags::compression::NONE as u32 => Some(Compression::None),
            c if c == tags::compression::PACKBITS as u32 => Some(Compression::PackBits),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::PackBits => "packbits",
        }
    }

    fn to_tiff(self) -> TiffCompression {
        match self {
            Compression::None => TiffCompression::Uncompressed,
            Compression::PackBits => TiffCompression::Packbits,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "raw" => Ok(Compression::None),
            "packbits" => Ok(Compression::PackBits),
            other => Err(format!("unknown compression '{}' (expected none or packbits)", other)),
        }
    }
}

/// Encoding choices beyond the grid's own sample format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Target storage type; the grid's own format when `None`.
    pub sample_format: Option<SampleFormat>,
    pub compression: Compression,
    /// Round and saturate instead of failing with `PrecisionLoss`.
    pub allow_lossy: bool,
}

/// Writes single-strip GeoTIFFs in the host byte order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEncoder {
    options: EncodeOptions,
}

impl RasterEncoder {
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    pub fn encode(&self, grid: &RasterGrid) -> Result<Bytes> {
        let format = self.options.sample_format.unwrap_or(grid.sample_format());
        let samples = SampleEncoder::new(format, grid.no_data(), self.options.allow_lossy)?.encode(grid.cells())?;
        let geo = GeoTags::for_grid(grid)?;
        let (width, height) = (dimension(grid.width())?, dimension(grid.height())?);

        let mut out = Cursor::new(Vec::new());
        let mut encoder = TiffEncoder::new(&mut out)
            .map_err(tiff_error)?
            .with_compression(self.options.compression.to_tiff());

        match &samples {
            Samples::UInt8(data) => write_image::<Gray8, _, _>(&mut encoder, width, height, &geo, data),
            Samples::UInt16(data) => write_image::<Gray16, _, _>(&mut encoder, width, height, &geo, data),
            Samples::Int16(data) => write_image::<GrayI16, _, _>(&mut encoder, width, height, &geo, data),
            Samples::Float32(data) => write_image::<Gray32Float, _, _>(&mut encoder, width, height, &geo, data),
        }
        .map_err(tiff_error)?;
        drop(encoder);

        let bytes = Bytes::from(out.into_inner());

        debug!(
            width = grid.width(),
            height = grid.height(),
            sample_format = %samples.format(),
            compression = %self.options.compression,
            bytes = bytes.len(),
            "Encoded raster"
        );

        Ok(bytes)
    }
}

/// One image in a single strip, with the geo tags added to its directory.
fn write_image<C, W, K>(
    encoder: &mut TiffEncoder<W, K>,
    width: u32,
    height: u32,
    geo: &GeoTags,
    data: &[C::Inner],
) -> TiffResult<()>
where
    C: ColorType,
    [C::Inner]: TiffValue,
    W: Write + Seek,
    K: TiffKind,
{
    let mut image = encoder.new_image::<C>(width, height)?;
    image.rows_per_strip(height)?;
    geo.write(image.encoder())?;
    image.write_data(data)
}

fn dimension(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ScenarioError::unsupported(format!("dimension {} exceeds TIFF limits", value)))
}

/// Geo-referencing, CRS and no-data tags for one grid, validated before any
/// bytes are written.
#[derive(Debug, Clone, PartialEq)]
struct GeoTags {
    transformation: [f64; 16],
    scale_and_tiepoint: Option<([f64; 3], [f64; 6])>,
    key_directory: Vec<u16>,
    citation: String,
    no_data: Option<String>,
}

impl GeoTags {
    fn for_grid(grid: &RasterGrid) -> Result<Self> {
        let [c0, c1, c2, c3, c4, c5] = grid.transform().coefficients();

        #[rustfmt::skip]
        let transformation = [
            c1, c2, 0.0, c0,
            c4, c5, 0.0, c3,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];

        let scale_and_tiepoint = grid
            .transform()
            .is_rectilinear()
            .then_some(([c1, -c5, 0.0], [0.0, 0.0, 0.0, c0, c3, 0.0]));

        let crs = grid.crs();
        if crs.contains('|') || !crs.is_ascii() || crs.contains('\0') {
            return Err(ScenarioError::unsupported(format!(
                "CRS identifier '{}' cannot be stored as a GeoTIFF citation",
                crs
            )));
        }
        let citation = format!("{}|", crs);
        let citation_len = u16::try_from(citation.len())
            .map_err(|_| ScenarioError::unsupported("CRS identifier is too long"))?;

        let mut keys: Vec<[u16; 4]> = Vec::new();
        let epsg = epsg_code(crs);
        if let Some((model_type, _, _)) = epsg {
            keys.push([geokey::GT_MODEL_TYPE, 0, 1, model_type]);
        }
        keys.push([geokey::GT_RASTER_TYPE, 0, 1, geokey::RASTER_PIXEL_IS_AREA]);
        keys.push([geokey::GT_CITATION, tags::GEO_ASCII_PARAMS, citation_len, 0]);
        if let Some((_, key, code)) = epsg {
            keys.push([key, 0, 1, code]);
        }

        let mut key_directory = vec![1, 1, 0, keys.len() as u16];
        key_directory.extend(keys.iter().flatten());

        Ok(Self {
            transformation,
            scale_and_tiepoint,
            key_directory,
            citation,
            no_data: grid.no_data().map(|nd| nd.to_string()),
        })
    }

    fn write<W: Write + Seek, K: TiffKind>(&self, dir: &mut DirectoryEncoder<W, K>) -> TiffResult<()> {
        dir.write_tag(tags::tag(tags::MODEL_TRANSFORMATION), self.transformation.as_slice())?;
        if let Some((scale, tiepoint)) = &self.scale_and_tiepoint {
            dir.write_tag(tags::tag(tags::MODEL_PIXEL_SCALE), scale.as_slice())?;
            dir.write_tag(tags::tag(tags::MODEL_TIEPOINT), tiepoint.as_slice())?;
        }
        dir.write_tag(tags::tag(tags::GEO_KEY_DIRECTORY), self.key_directory.as_slice())?;
        dir.write_tag(tags::tag(tags::GEO_ASCII_PARAMS), self.citation.as_str())?;
        if let Some(no_data) = &self.no_data {
            dir.write_tag(tags::tag(tags::GDAL_NODATA), no_data.as_str())?;
        }
        Ok(())
    }
}

/// `(model type, code key, code)` for `EPSG:<n>` identifiers whose code fits
/// a GeoKey value. Codes 4000..5000 are treated as geographic.
fn epsg_code(crs: &str) -> Option<(u16, u16, u16)> {
    let code: u16 = crs.strip_prefix("EPSG:")?.parse().ok()?;
    if code == 0 || code == geokey::USER_DEFINED {
        return None;
    }
    if (4000..5000).contains(&code) {
        Some((geokey::MODEL_TYPE_GEOGRAPHIC, geokey::GEOGRAPHIC_TYPE, code))
    } else {
        Some((geokey::MODEL_TYPE_PROJECTED, geokey::PROJECTED_CS_TYPE, code))
    }
}

//! Decoding raster bytes into a [`RasterGrid`].

use std::io::Cursor;

use raster_common::{AffineTransform, RasterGrid, Result, SampleFormat, ScenarioError};
use tiff::decoder::{Decoder, Limits};
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::tags::{self, geokey};
use crate::{samples, tiff_error, Compression};

/// A PackBits run of two bytes expands to at most 128.
const PACKBITS_MAX_EXPANSION: usize = 64;

type TiffReader<'a> = Decoder<Cursor<&'a [u8]>>;

/// Header metadata of a raster file, read without decoding the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterHeader {
    pub width: usize,
    pub height: usize,
    pub sample_format: SampleFormat,
    pub compression: Compression,
    pub transform: AffineTransform,
    pub no_data: Option<f64>,
    pub crs: String,
    pub strip_count: usize,
}

impl RasterHeader {
    /// Uncompressed payload size in bytes.
    pub fn payload_len(&self) -> usize {
        self.width
            .saturating_mul(self.height)
            .saturating_mul(self.sample_format.byte_width())
    }
}

/// Decodes the supported GeoTIFF subset.
///
/// Loading is all or nothing: either a fully validated grid is returned or
/// an error, never a partially populated grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterLoader;

impl RasterLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse and validate header metadata only.
    pub fn read_header(&self, data: &[u8]) -> Result<RasterHeader> {
        let mut decoder = open(data)?;
        parse_header(&mut decoder)
    }

    /// Decode a complete raster.
    pub fn load(&self, data: &[u8]) -> Result<RasterGrid> {
        let mut decoder = open(data)?;
        let header = parse_header(&mut decoder)?;
        check_strip_layout(&mut decoder, &header, data.len())?;

        // Nothing the header declares may allocate more than the file can encode.
        let mut limits = Limits::default();
        limits.decoding_buffer_size = data.len().saturating_mul(PACKBITS_MAX_EXPANSION);
        let mut decoder = decoder.with_limits(limits);

        let decoded = decoder.read_image().map_err(tiff_error)?;
        let cells = samples::decode(decoded, header.sample_format)?;
        if cells.len() != header.width * header.height {
            return Err(ScenarioError::malformed(format!(
                "decoded {} samples, header declares {}x{}",
                cells.len(),
                header.width,
                header.height
            )));
        }

        let grid = RasterGrid::new(
            header.width,
            header.height,
            cells,
            header.transform,
            header.no_data,
            header.crs,
        )?
        .with_sample_format(header.sample_format);

        debug!(
            width = grid.width(),
            height = grid.height(),
            sample_format = %grid.sample_format(),
            crs = grid.crs(),
            no_data_cells = grid.no_data_count(),
            "Loaded raster"
        );

        Ok(grid)
    }
}

fn open(data: &[u8]) -> Result<TiffReader<'_>> {
    Decoder::new(Cursor::new(data)).map_err(tiff_error)
}

fn find_u32(decoder: &mut TiffReader<'_>, tag: Tag) -> Result<Option<u32>> {
    match decoder.find_tag(tag).map_err(tiff_error)? {
        Some(value) => value.into_u32().map(Some).map_err(tiff_error),
        None => Ok(None),
    }
}

fn find_u64s(decoder: &mut TiffReader<'_>, tag: Tag) -> Result<Option<Vec<u64>>> {
    match decoder.find_tag(tag).map_err(tiff_error)? {
        Some(value) => value.into_u64_vec().map(Some).map_err(tiff_error),
        None => Ok(None),
    }
}

fn find_f64s(decoder: &mut TiffReader<'_>, code: u16) -> Result<Option<Vec<f64>>> {
    match decoder.find_tag(tags::tag(code)).map_err(tiff_error)? {
        Some(value) => value.into_f64_vec().map(Some).map_err(tiff_error),
        None => Ok(None),
    }
}

fn find_ascii(decoder: &mut TiffReader<'_>, code: u16) -> Result<Option<String>> {
    match decoder.find_tag(tags::tag(code)).map_err(tiff_error)? {
        Some(value) => value.into_string().map(Some).map_err(tiff_error),
        None => Ok(None),
    }
}

fn parse_header(decoder: &mut TiffReader<'_>) -> Result<RasterHeader> {
    let (width, height) = decoder.dimensions().map_err(tiff_error)?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return Err(ScenarioError::malformed(format!(
            "image dimensions must be positive, got {}x{}",
            width, height
        )));
    }

    for tile_tag in [Tag::TileWidth, Tag::TileLength, Tag::TileOffsets] {
        if decoder.find_tag(tile_tag).map_err(tiff_error)?.is_some() {
            return Err(ScenarioError::unsupported("tiled layouts are not supported"));
        }
    }

    if width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .is_none()
    {
        return Err(ScenarioError::malformed(format!(
            "image dimensions {}x{} overflow",
            width, height
        )));
    }

    let samples_per_pixel = find_u32(decoder, Tag::SamplesPerPixel)?.unwrap_or(1);
    if samples_per_pixel != 1 {
        return Err(ScenarioError::unsupported(format!(
            "{} bands per pixel (only single-band rasters are supported)",
            samples_per_pixel
        )));
    }

    if let Some(planar) = find_u32(decoder, Tag::PlanarConfiguration)? {
        if planar != 1 {
            return Err(ScenarioError::unsupported(format!(
                "planar configuration {}",
                planar
            )));
        }
    }

    // Only BlackIsZero samples are read back as stored.
    if let Some(photometric) = find_u32(decoder, Tag::PhotometricInterpretation)? {
        if photometric != 1 {
            return Err(ScenarioError::unsupported(format!(
                "photometric interpretation {}",
                photometric
            )));
        }
    }

    let bits = find_u32(decoder, Tag::BitsPerSample)?.unwrap_or(1);
    let format_code = find_u32(decoder, Tag::SampleFormat)?.unwrap_or(1);
    let sample_format = SampleFormat::from_tiff(
        u16::try_from(bits).unwrap_or(u16::MAX),
        u16::try_from(format_code).unwrap_or(u16::MAX),
    )?;

    let code = find_u32(decoder, Tag::Compression)?.unwrap_or(1);
    let compression = Compression::from_tiff_code(code)
        .ok_or_else(|| ScenarioError::unsupported(format!("compression scheme {}", code)))?;

    let geokeys = GeoKeys::parse(decoder)?;
    let transform = parse_transform(decoder, geokeys.pixel_is_point)?;
    let no_data = parse_no_data(decoder)?;
    let crs = geokeys
        .crs
        .ok_or_else(|| ScenarioError::malformed("raster declares no CRS"))?;

    let strip_count = find_u64s(decoder, Tag::StripOffsets)?.map_or(0, |offsets| offsets.len());

    let header = RasterHeader {
        width,
        height,
        sample_format,
        compression,
        transform,
        no_data,
        crs,
        strip_count,
    };

    debug!(
        width = header.width,
        height = header.height,
        sample_format = %header.sample_format,
        compression = ?header.compression,
        crs = %header.crs,
        "Decoded raster header"
    );

    Ok(header)
}

/// The strip table must agree with RowsPerStrip, lie inside the file and be
/// able to hold the declared payload.
fn check_strip_layout(decoder: &mut TiffReader<'_>, header: &RasterHeader, file_len: usize) -> Result<()> {
    let offsets = find_u64s(decoder, Tag::StripOffsets)?
        .ok_or_else(|| ScenarioError::malformed("missing required tag StripOffsets"))?;
    let counts = find_u64s(decoder, Tag::StripByteCounts)?
        .ok_or_else(|| ScenarioError::malformed("missing required tag StripByteCounts"))?;
    if offsets.len() != counts.len() {
        return Err(ScenarioError::malformed(format!(
            "{} strip offsets but {} strip byte counts",
            offsets.len(),
            counts.len()
        )));
    }

    let rows_per_strip = find_u32(decoder, Tag::RowsPerStrip)?.map_or(header.height, |rows| rows as usize);
    if rows_per_strip == 0 {
        return Err(ScenarioError::malformed("RowsPerStrip must be positive"));
    }
    let expected = header.height.div_ceil(rows_per_strip.min(header.height));
    if expected != offsets.len() {
        return Err(ScenarioError::malformed(format!(
            "{} rows at {} rows per strip need {} strips, file has {}",
            header.height,
            rows_per_strip,
            expected,
            offsets.len()
        )));
    }

    for (i, (&offset, &count)) in offsets.iter().zip(&counts).enumerate() {
        let inside = offset
            .checked_add(count)
            .is_some_and(|end| end <= file_len as u64);
        if !inside {
            return Err(ScenarioError::malformed(format!(
                "strip {} ({} bytes at offset {}) lies outside the {}-byte file",
                i, count, offset, file_len
            )));
        }
    }

    let stored = counts.iter().fold(0u64, |total, &count| total.saturating_add(count));
    let expected_len = header.payload_len() as u64;
    let consistent = match header.compression {
        Compression::None => stored == expected_len,
        Compression::PackBits => expected_len <= stored.saturating_mul(PACKBITS_MAX_EXPANSION as u64),
    };
    if !consistent {
        return Err(ScenarioError::malformed(format!(
            "{} stored strip bytes cannot hold {}x{} {} samples ({} bytes)",
            stored, header.width, header.height, header.sample_format, expected_len
        )));
    }

    Ok(())
}

/// Pixel-to-model transform from ModelTransformation, or from
/// ModelPixelScale plus ModelTiepoint.
fn parse_transform(decoder: &mut TiffReader<'_>, pixel_is_point: bool) -> Result<AffineTransform> {
    let coeffs = if let Some(m) = find_f64s(decoder, tags::MODEL_TRANSFORMATION)? {
        if m.len() != 16 {
            return Err(ScenarioError::malformed("ModelTransformation must hold 16 values"));
        }
        // Row-major 4x4; only the 2D part is used.
        [m[3], m[0], m[1], m[7], m[4], m[5]]
    } else if let (Some(scale), Some(tie)) = (
        find_f64s(decoder, tags::MODEL_PIXEL_SCALE)?,
        find_f64s(decoder, tags::MODEL_TIEPOINT)?,
    ) {
        if scale.len() < 2 {
            return Err(ScenarioError::malformed("ModelPixelScale must hold at least 2 values"));
        }
        if tie.len() < 6 {
            return Err(ScenarioError::malformed("ModelTiepoint must hold at least 6 values"));
        }
        if tie.len() > 6 {
            warn!(tiepoints = tie.len() / 6, "Using the first of several tiepoints");
        }
        let (sx, sy) = (scale[0], scale[1]);
        let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
        [x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy]
    } else {
        return Err(ScenarioError::malformed(
            "raster has no geo-referencing (ModelTransformation or PixelScale + Tiepoint)",
        ));
    };

    let coeffs = if pixel_is_point {
        // Model coordinates refer to pixel centers; shift to the corner.
        let [c0, c1, c2, c3, c4, c5] = coeffs;
        [c0 - 0.5 * (c1 + c2), c1, c2, c3 - 0.5 * (c4 + c5), c4, c5]
    } else {
        coeffs
    };

    AffineTransform::new(coeffs)
}

fn parse_no_data(decoder: &mut TiffReader<'_>) -> Result<Option<f64>> {
    let Some(text) = find_ascii(decoder, tags::GDAL_NODATA)? else {
        return Ok(None);
    };
    let text = text.trim_matches('\0').trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| ScenarioError::malformed(format!("GDAL_NODATA value '{}' is not a number", text)))
}

/// The GeoKeys this loader understands.
#[derive(Debug, Default)]
struct GeoKeys {
    crs: Option<String>,
    pixel_is_point: bool,
}

impl GeoKeys {
    fn parse(decoder: &mut TiffReader<'_>) -> Result<Self> {
        let Some(value) = decoder
            .find_tag(tags::tag(tags::GEO_KEY_DIRECTORY))
            .map_err(tiff_error)?
        else {
            return Ok(Self::default());
        };
        let dir = value
            .into_u32_vec()
            .map_err(tiff_error)?
            .into_iter()
            .map(u16::try_from)
            .collect::<std::result::Result<Vec<u16>, _>>()
            .map_err(|_| ScenarioError::malformed("GeoKeyDirectory must be SHORT values"))?;
        if dir.len() < 4 {
            return Err(ScenarioError::malformed("GeoKeyDirectory header is truncated"));
        }

        let key_count = dir[3] as usize;
        if dir.len() < 4 + key_count * 4 {
            return Err(ScenarioError::malformed(format!(
                "GeoKeyDirectory declares {} keys but holds {} values",
                key_count,
                dir.len()
            )));
        }

        let ascii = find_ascii(decoder, tags::GEO_ASCII_PARAMS)?;

        let mut keys = Self::default();
        let mut citation = None;
        let mut epsg = None;

        for key in dir[4..4 + key_count * 4].chunks_exact(4) {
            let (id, location, count, offset) = (key[0], key[1], key[2] as usize, key[3] as usize);
            match (id, location) {
                (geokey::GT_RASTER_TYPE, 0) => {
                    keys.pixel_is_point = offset as u16 == geokey::RASTER_PIXEL_IS_POINT;
                }
                (geokey::GT_CITATION, tags::GEO_ASCII_PARAMS) => {
                    let text = ascii
                        .as_deref()
                        .and_then(|s| s.get(offset..offset + count))
                        .ok_or_else(|| {
                            ScenarioError::malformed("GTCitation points outside GeoAsciiParams")
                        })?;
                    let text = text.trim_end_matches(['|', '\0']).trim();
                    if !text.is_empty() {
                        citation = Some(text.to_string());
                    }
                }
                (geokey::PROJECTED_CS_TYPE | geokey::GEOGRAPHIC_TYPE, 0) => {
                    let code = offset as u16;
                    if code != geokey::USER_DEFINED && code != 0 {
                        // A projected code wins over the underlying geographic one.
                        if id == geokey::PROJECTED_CS_TYPE || epsg.is_none() {
                            epsg = Some(format!("EPSG:{}", code));
                        }
                    }
                }
                _ => {}
            }
        }

        keys.crs = citation.or(epsg);
        Ok(keys)
    }
}

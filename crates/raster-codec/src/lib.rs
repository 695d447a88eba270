//! GeoTIFF-subset raster codec.
//!
//! Reads and writes single-band TIFF files carrying GeoTIFF
//! geo-referencing, the GDAL no-data tag and a CRS identifier. Supported
//! samples are `uint8`, `uint16`, `int16` and `float32`, stored in strips
//! that are either uncompressed or PackBits-compressed. Container decoding
//! and encoding is done by the `tiff` crate; this crate owns the
//! geo-referencing, no-data and precision rules on top of it.
//!
//! ```ignore
//! let grid = raster_codec::load(&bytes)?;
//! let out = raster_codec::encode(&grid)?;
//! assert_eq!(raster_codec::load(&out)?, grid);
//! ```

pub mod encoder;
pub mod loader;
pub mod samples;
pub mod tags;

pub use encoder::{Compression, EncodeOptions, RasterEncoder};
pub use loader::{RasterHeader, RasterLoader};

use bytes::Bytes;
use raster_common::{RasterGrid, Result, ScenarioError};
use tiff::TiffError;

/// Decode raster bytes into a grid.
pub fn load(data: &[u8]) -> Result<RasterGrid> {
    RasterLoader::new().load(data)
}

/// Read header metadata without decoding the payload.
pub fn read_header(data: &[u8]) -> Result<RasterHeader> {
    RasterLoader::new().read_header(data)
}

/// Encode a grid in its own sample format, uncompressed.
pub fn encode(grid: &RasterGrid) -> Result<Bytes> {
    RasterEncoder::default().encode(grid)
}

/// Encode a grid with explicit options.
pub fn encode_with(grid: &RasterGrid, options: &EncodeOptions) -> Result<Bytes> {
    RasterEncoder::new(*options).encode(grid)
}

/// Map a container-level failure onto the codec's error kinds.
pub(crate) fn tiff_error(err: TiffError) -> ScenarioError {
    match err {
        TiffError::UnsupportedError(e) => ScenarioError::unsupported(e.to_string()),
        TiffError::LimitsExceeded => {
            ScenarioError::malformed("declared image size exceeds what the file can hold")
        }
        other => ScenarioError::malformed(other.to_string()),
    }
}

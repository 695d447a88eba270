//! GeoTIFF tag numbers and GeoKey identifiers.
//!
//! Baseline TIFF tags come from [`tiff::tags::Tag`]; the GeoTIFF and GDAL
//! ones are addressed by number through [`tag`].

use tiff::tags::Tag;

pub const MODEL_PIXEL_SCALE: u16 = 33550;
pub const MODEL_TIEPOINT: u16 = 33922;
pub const MODEL_TRANSFORMATION: u16 = 34264;
pub const GEO_KEY_DIRECTORY: u16 = 34735;
pub const GEO_DOUBLE_PARAMS: u16 = 34736;
pub const GEO_ASCII_PARAMS: u16 = 34737;

// GDAL private tag
pub const GDAL_NODATA: u16 = 42113;

/// The [`Tag`] for a numeric tag code, named when the tiff crate knows it.
pub fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Compression scheme codes.
pub mod compression {
    pub const NONE: u16 = 1;
    pub const PACKBITS: u16 = 32773;
}

/// GeoKey identifiers used inside the GeoKeyDirectory.
pub mod geokey {
    pub const GT_MODEL_TYPE: u16 = 1024;
    pub const GT_RASTER_TYPE: u16 = 1025;
    pub const GT_CITATION: u16 = 1026;
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const PROJECTED_CS_TYPE: u16 = 3072;

    pub const MODEL_TYPE_PROJECTED: u16 = 1;
    pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;

    pub const RASTER_PIXEL_IS_AREA: u16 = 1;
    pub const RASTER_PIXEL_IS_POINT: u16 = 2;

    /// Code meaning "user-defined" for the EPSG code keys.
    pub const USER_DEFINED: u16 = 32767;
}

//! Tilemask Sources - Adapters that feed the dataset builder
//!
//! Tiles come from any XYZ tile server over HTTP; building footprints come
//! from one GeoJSON file per locality.

pub mod geojson;
pub mod http;

pub use self::geojson::GeoJsonPolygonSource;
pub use self::http::{decode_tile, expand_url, HttpFetcherOptions, HttpTileFetcher};

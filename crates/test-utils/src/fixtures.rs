//! Common test fixtures: spatial reference definitions and map extents.

/// Spatial reference definitions in the forms the tools accept.
pub mod srs {
    /// Albers equal-area conic centred on Africa. The trailing bare
    /// `no_defs` token is deliberate: definitions copied from scripts
    /// often miss the `+`.
    pub const AEA_AFRICA: &str = "+proj=aea +lat_1=20 +lat_2=-23 +lat_0=0 +lon_0=25 \
        +x_0=0 +y_0=0 +ellps=WGS84 +datum=WGS84 +units=m no_defs";

    /// WGS84 geographic as a PROJ4 string.
    pub const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";

    /// WGS84 / UTM zone 33N as WKT1 with nested authorities.
    pub const UTM33N_WKT: &str = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",15],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","32633"]]"#;
}

/// Map extents as (min_x, min_y, max_x, max_y).
pub mod extent {
    /// Lon/lat view used for the Africa maps.
    pub const AFRICA_VIEW: (f64, f64, f64, f64) = (-20.0, -28.0, 52.0, 13.0);

    /// Global lon/lat extent.
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Small projected extent (metres) around the Albers origin.
    pub const AEA_ORIGIN_10KM: (f64, f64, f64, f64) = (-5000.0, -5000.0, 5000.0, 5000.0);
}

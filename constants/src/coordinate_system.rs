/// Geographic CRS all unprojected inputs are assumed to use
pub const WGS84_EPSG: u32 = 4326;

/// EPSG prefix of WGS84 / UTM north zones (326xx)
pub const UTM_NORTH_PREFIX: u32 = 326;

/// EPSG prefix of WGS84 / UTM south zones (327xx)
pub const UTM_SOUTH_PREFIX: u32 = 327;

/// Longitudinal width of a UTM zone in degrees
pub const UTM_ZONE_WIDTH_DEG: f64 = 6.0;

/// Highest zone number reachable by the zone formula (lon = 180 lands in 61)
pub const UTM_MAX_ZONE: u32 = 61;

/// Central meridian scale factor
pub const UTM_SCALE_FACTOR: f64 = 0.9996;

pub const UTM_FALSE_EASTING: f64 = 500_000.0;

/// Applied to southern hemisphere northings
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// WGS84 ellipsoid semi-major axis (m)
pub const WGS84_SEMI_MAJOR: f64 = 6_378_137.0;

/// WGS84 ellipsoid inverse flattening
pub const WGS84_INV_FLATTENING: f64 = 298.257_223_563;

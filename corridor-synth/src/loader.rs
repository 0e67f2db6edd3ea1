//! Vector input reading and normalisation into the working frame.
//!
//! [`FeatureSource`] turns a file into a [`FeatureSet`]; [`normalize_inputs`]
//! picks the working frame from the AOI, reprojects everything into it and
//! reduces the inputs to one AOI multipolygon, a flat list of line strings and
//! optional tower points. Geometries that are unusable for their role are
//! dropped and counted rather than failing the run.

use crate::crs::{SourceCrs, UtmZone, utm_epsg_for};
use crate::error::{Result, SynthError};
use crate::geometry::PlanarOps;
use crate::projection::Projector;
use geo::{
    Centroid, Coord, CoordsIter, Geometry, GeometryCollection, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Geometries read from one input, with the CRS they are expressed in.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub geometries: Vec<Geometry<f64>>,
    pub crs: SourceCrs,
    /// Null, empty or non-finite geometries skipped while reading.
    pub dropped: usize,
}

/// Reads a vector file into a feature set.
pub trait FeatureSource: Send + Sync {
    fn read(&self, path: &Path) -> Result<FeatureSet>;
}

/// GeoJSON reader: FeatureCollection, Feature or a bare geometry.
/// Coordinates are WGS84 unless a legacy `crs` member says otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonSource;

impl FeatureSource for GeoJsonSource {
    fn read(&self, path: &Path) -> Result<FeatureSet> {
        let text = fs::read_to_string(path)?;
        let set = self.parse_str(&text, &path.display().to_string())?;
        log::debug!(
            "Read {} geometr(ies) from {} in {}",
            set.geometries.len(),
            path.display(),
            set.crs
        );
        Ok(set)
    }
}

impl GeoJsonSource {
    pub fn parse_str(&self, text: &str, source_name: &str) -> Result<FeatureSet> {
        let root: Value = serde_json::from_str(text)?;
        let crs = match root.get("crs") {
            Some(member) => parse_crs_member(member, source_name)?,
            None => SourceCrs::Wgs84,
        };

        let mut geometries = Vec::new();
        let mut dropped = 0;
        let mut keep = |geometry: Option<Geometry<f64>>| match geometry.and_then(clean_geometry) {
            Some(g) => geometries.push(g),
            None => dropped += 1,
        };

        match member_str(&root, "type") {
            Some("FeatureCollection") => {
                let features = root
                    .get("features")
                    .and_then(Value::as_array)
                    .ok_or_else(|| SynthError::malformed(source_name, "missing features array"))?;
                for feature in features {
                    keep(parse_feature(feature, source_name)?);
                }
            }
            Some("Feature") => keep(parse_feature(&root, source_name)?),
            Some(_) => keep(Some(parse_geometry(&root, source_name)?)),
            None => return Err(SynthError::malformed(source_name, "missing type member")),
        }

        if dropped > 0 {
            log::warn!(
                "{}: dropped {} null, empty or invalid geometr(ies)",
                source_name,
                dropped
            );
        }
        Ok(FeatureSet {
            geometries,
            crs,
            dropped,
        })
    }
}

fn member_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn parse_crs_member(member: &Value, source_name: &str) -> Result<SourceCrs> {
    let name = member
        .get("properties")
        .and_then(|p| member_str(p, "name"))
        .ok_or_else(|| SynthError::malformed(source_name, "crs member without a name"))?;
    SourceCrs::from_name(name)
}

fn parse_feature(feature: &Value, source_name: &str) -> Result<Option<Geometry<f64>>> {
    if member_str(feature, "type") != Some("Feature") {
        return Err(SynthError::malformed(source_name, "expected a Feature"));
    }
    match feature.get("geometry") {
        None | Some(Value::Null) => Ok(None),
        Some(geometry) => parse_geometry(geometry, source_name).map(Some),
    }
}

fn parse_geometry(value: &Value, source_name: &str) -> Result<Geometry<f64>> {
    let kind = member_str(value, "type")
        .ok_or_else(|| SynthError::malformed(source_name, "geometry without a type"))?;

    if kind == "GeometryCollection" {
        let members = value
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or_else(|| SynthError::malformed(source_name, "collection without geometries"))?;
        let parts = members
            .iter()
            .map(|g| parse_geometry(g, source_name))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Geometry::GeometryCollection(GeometryCollection::new_from(
            parts,
        )));
    }

    let coords = value
        .get("coordinates")
        .ok_or_else(|| SynthError::malformed(source_name, format!("{kind} without coordinates")))?;
    let geometry = match kind {
        "Point" => Geometry::Point(Point::from(position(coords, source_name)?)),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::new(
            positions(coords, source_name)?
                .into_iter()
                .map(Point::from)
                .collect(),
        )),
        "LineString" => Geometry::LineString(LineString::new(positions(coords, source_name)?)),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(
            nested(coords, source_name)?
                .iter()
                .map(|line| positions(line, source_name).map(LineString::new))
                .collect::<Result<Vec<_>>>()?,
        )),
        "Polygon" => Geometry::Polygon(polygon(coords, source_name)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            nested(coords, source_name)?
                .iter()
                .map(|rings| polygon(rings, source_name))
                .collect::<Result<Vec<_>>>()?,
        )),
        other => {
            return Err(SynthError::malformed(
                source_name,
                format!("unknown geometry type {other}"),
            ));
        }
    };
    Ok(geometry)
}

fn nested<'a>(value: &'a Value, source_name: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| SynthError::malformed(source_name, "coordinates must be an array"))
}

fn position(value: &Value, source_name: &str) -> Result<Coord<f64>> {
    let ordinates = nested(value, source_name)?;
    match (
        ordinates.first().and_then(Value::as_f64),
        ordinates.get(1).and_then(Value::as_f64),
    ) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(SynthError::malformed(
            source_name,
            "position needs two numeric ordinates",
        )),
    }
}

fn positions(value: &Value, source_name: &str) -> Result<Vec<Coord<f64>>> {
    nested(value, source_name)?
        .iter()
        .map(|p| position(p, source_name))
        .collect()
}

fn polygon(value: &Value, source_name: &str) -> Result<Polygon<f64>> {
    let mut rings = nested(value, source_name)?
        .iter()
        .map(|ring| positions(ring, source_name).map(LineString::new));
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => LineString::new(Vec::new()),
    };
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Strip degenerate parts; `None` when nothing usable is left.
fn clean_geometry(geometry: Geometry<f64>) -> Option<Geometry<f64>> {
    if geometry.coords_iter().any(|c| !(c.x.is_finite() && c.y.is_finite())) {
        return None;
    }
    match geometry {
        Geometry::LineString(line) => usable_line(&line).then_some(Geometry::LineString(line)),
        Geometry::MultiLineString(lines) => {
            let kept: Vec<_> = lines.0.into_iter().filter(usable_line).collect();
            (!kept.is_empty()).then(|| Geometry::MultiLineString(MultiLineString::new(kept)))
        }
        Geometry::Polygon(polygon) => {
            usable_polygon(&polygon).then_some(Geometry::Polygon(polygon))
        }
        Geometry::MultiPolygon(polygons) => {
            let kept: Vec<_> = polygons.0.into_iter().filter(usable_polygon).collect();
            (!kept.is_empty()).then(|| Geometry::MultiPolygon(MultiPolygon::new(kept)))
        }
        Geometry::MultiPoint(points) => {
            (!points.0.is_empty()).then_some(Geometry::MultiPoint(points))
        }
        Geometry::GeometryCollection(collection) => {
            let kept: Vec<_> = collection.0.into_iter().filter_map(clean_geometry).collect();
            (!kept.is_empty())
                .then(|| Geometry::GeometryCollection(GeometryCollection::new_from(kept)))
        }
        other => Some(other),
    }
}

fn usable_line(line: &LineString<f64>) -> bool {
    line.0.len() >= 2
}

fn usable_polygon(polygon: &Polygon<f64>) -> bool {
    // Closed ring with at least three distinct vertices.
    polygon.exterior().0.len() >= 4
}

/// Kept and dropped geometry counts for one input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputDiagnostics {
    /// Parts handed on to the corridor core.
    pub kept: usize,
    /// Null, empty or non-finite geometries.
    pub dropped_invalid: usize,
    /// Geometries of a shape the input role cannot use.
    pub dropped_unsupported: usize,
}

impl InputDiagnostics {
    fn new(set: &FeatureSet) -> Self {
        Self {
            dropped_invalid: set.dropped,
            ..Self::default()
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped_invalid + self.dropped_unsupported
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadDiagnostics {
    pub aoi: InputDiagnostics,
    pub lines: InputDiagnostics,
    pub towers: Option<InputDiagnostics>,
}

impl LoadDiagnostics {
    pub fn total_dropped(&self) -> usize {
        self.aoi.dropped()
            + self.lines.dropped()
            + self.towers.as_ref().map_or(0, InputDiagnostics::dropped)
    }
}

/// Everything the corridor core consumes, in one metric frame.
#[derive(Debug, Clone)]
pub struct NormalizedInputs {
    pub epsg: u32,
    pub aoi: MultiPolygon<f64>,
    pub lines: Vec<LineString<f64>>,
    pub towers: Option<Vec<Point<f64>>>,
    pub diagnostics: LoadDiagnostics,
}

/// Raw feature sets for the three inputs.
#[derive(Debug, Clone)]
pub struct RawInputs {
    pub aoi: FeatureSet,
    pub lines: FeatureSet,
    pub towers: Option<FeatureSet>,
}

/// Select the working frame and bring every input into it.
///
/// With `local_frame` set, coordinates are taken as already being metric in
/// that EPSG frame and are used unchanged. Otherwise the frame is the UTM
/// zone of the AOI centroid in WGS84.
pub fn normalize_inputs(
    raw: RawInputs,
    local_frame: Option<u32>,
    projector: &dyn Projector,
    ops: &dyn PlanarOps,
) -> Result<NormalizedInputs> {
    let RawInputs { aoi, lines, towers } = raw;
    let mut diagnostics = LoadDiagnostics {
        aoi: InputDiagnostics::new(&aoi),
        lines: InputDiagnostics::new(&lines),
        towers: towers.as_ref().map(InputDiagnostics::new),
    };

    let aoi_parts = polygon_parts(aoi.geometries, &mut diagnostics.aoi);
    let (epsg, frame) = match local_frame {
        Some(epsg) => {
            log::info!("Using local working frame EPSG:{}", epsg);
            (epsg, SourceCrs::Local(epsg))
        }
        None => {
            let epsg = working_frame_epsg(&aoi_parts, aoi.crs, projector, ops)?;
            log::info!("Selected working frame EPSG:{} from AOI centroid", epsg);
            (epsg, SourceCrs::Utm(UtmZone::from_epsg(epsg)?))
        }
    };
    let into_frame = |geometry: Geometry<f64>, from: SourceCrs| -> Result<Geometry<f64>> {
        match frame {
            SourceCrs::Local(_) => Ok(geometry),
            _ => projector.project_geometry(&geometry, from, frame),
        }
    };

    let projected_aoi = aoi_parts
        .into_iter()
        .map(|polygon| {
            into_frame(Geometry::Polygon(polygon), aoi.crs).map(|g| {
                MultiPolygon::new(polygon_parts(vec![g], &mut InputDiagnostics::default()))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let aoi_shape = ops.union_all(projected_aoi);
    if aoi_shape.0.is_empty() {
        return Err(SynthError::EmptyAoi);
    }

    let line_geometries = lines
        .geometries
        .into_iter()
        .map(|g| into_frame(g, lines.crs))
        .collect::<Result<Vec<_>>>()?;
    let line_parts = line_parts(line_geometries, &mut diagnostics.lines);

    let tower_points = match towers {
        Some(set) => {
            let geometries = set
                .geometries
                .into_iter()
                .map(|g| into_frame(g, set.crs))
                .collect::<Result<Vec<_>>>()?;
            let stats = diagnostics.towers.get_or_insert_with(InputDiagnostics::default);
            Some(point_parts(geometries, stats))
        }
        None => None,
    };

    report_drops("AOI", &diagnostics.aoi);
    report_drops("line", &diagnostics.lines);
    if let Some(stats) = &diagnostics.towers {
        report_drops("tower", stats);
    }

    Ok(NormalizedInputs {
        epsg,
        aoi: aoi_shape,
        lines: line_parts,
        towers: tower_points,
        diagnostics,
    })
}

/// UTM EPSG code for the centroid of the unioned AOI in WGS84.
fn working_frame_epsg(
    parts: &[Polygon<f64>],
    crs: SourceCrs,
    projector: &dyn Projector,
    ops: &dyn PlanarOps,
) -> Result<u32> {
    let geographic = parts
        .iter()
        .map(|polygon| {
            projector
                .project_geometry(&Geometry::Polygon(polygon.clone()), crs, SourceCrs::Wgs84)
                .map(|g| {
                    MultiPolygon::new(polygon_parts(vec![g], &mut InputDiagnostics::default()))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    let centroid = ops
        .union_all(geographic)
        .centroid()
        .ok_or(SynthError::EmptyAoi)?;
    Ok(utm_epsg_for(centroid.x(), centroid.y()))
}

fn report_drops(role: &str, stats: &InputDiagnostics) {
    if stats.dropped_unsupported > 0 {
        log::warn!(
            "Dropped {} {} geometr(ies) of unsupported shape",
            stats.dropped_unsupported,
            role
        );
    }
}

/// Polygonal parts of the geometries; anything else is counted as unsupported.
fn polygon_parts(
    geometries: Vec<Geometry<f64>>,
    stats: &mut InputDiagnostics,
) -> Vec<Polygon<f64>> {
    fn collect(geometry: Geometry<f64>, parts: &mut Vec<Polygon<f64>>, unsupported: &mut usize) {
        match geometry {
            Geometry::Polygon(p) => parts.push(p),
            Geometry::MultiPolygon(mp) => parts.extend(mp.0),
            Geometry::Rect(r) => parts.push(r.to_polygon()),
            Geometry::Triangle(t) => parts.push(t.to_polygon()),
            Geometry::GeometryCollection(gc) => {
                gc.0.into_iter().for_each(|g| collect(g, parts, unsupported))
            }
            _ => *unsupported += 1,
        }
    }

    let mut parts = Vec::new();
    geometries
        .into_iter()
        .for_each(|g| collect(g, &mut parts, &mut stats.dropped_unsupported));
    stats.kept += parts.len();
    parts
}

/// Simple line strings exploded from single and multi lines.
fn line_parts(
    geometries: Vec<Geometry<f64>>,
    stats: &mut InputDiagnostics,
) -> Vec<LineString<f64>> {
    fn collect(geometry: Geometry<f64>, parts: &mut Vec<LineString<f64>>, unsupported: &mut usize) {
        match geometry {
            Geometry::LineString(ls) => parts.push(ls),
            Geometry::MultiLineString(mls) => parts.extend(mls.0),
            Geometry::Line(line) => parts.push(LineString::from(line)),
            Geometry::GeometryCollection(gc) => {
                gc.0.into_iter().for_each(|g| collect(g, parts, unsupported))
            }
            _ => *unsupported += 1,
        }
    }

    let mut parts = Vec::new();
    geometries
        .into_iter()
        .for_each(|g| collect(g, &mut parts, &mut stats.dropped_unsupported));
    stats.kept += parts.len();
    parts
}

fn point_parts(geometries: Vec<Geometry<f64>>, stats: &mut InputDiagnostics) -> Vec<Point<f64>> {
    fn collect(geometry: Geometry<f64>, parts: &mut Vec<Point<f64>>, unsupported: &mut usize) {
        match geometry {
            Geometry::Point(p) => parts.push(p),
            Geometry::MultiPoint(mp) => parts.extend(mp.0),
            Geometry::GeometryCollection(gc) => {
                gc.0.into_iter().for_each(|g| collect(g, parts, unsupported))
            }
            _ => *unsupported += 1,
        }
    }

    let mut parts = Vec::new();
    geometries
        .into_iter()
        .for_each(|g| collect(g, &mut parts, &mut stats.dropped_unsupported));
    stats.kept += parts.len();
    parts
}

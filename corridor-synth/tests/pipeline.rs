use approx::assert_abs_diff_eq;
use constants::class::{ASSEMBLY_ORDER, GROUND, TOWER, VEGETATION, WIRE};
use corridor_synth::compress::{CommandOutput, CommandRunner, CompressionOutcome};
use corridor_synth::geometry::GeoPlanarOps;
use corridor_synth::laz::{create_reader, read_epsg};
use corridor_synth::loader::{LoadDiagnostics, NormalizedInputs};
use corridor_synth::{
    CancelToken, CorridorSynthesizer, InputPaths, PointRecord, SynthesisParams, synthesize,
};
use geo::{MultiPolygon, line_string, polygon};
use indicatif::ProgressBar;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn scratch(test: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("corridor_synth_pipeline_tests")
        .join(test);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn reference_params() -> SynthesisParams {
    SynthesisParams {
        width: 10.0,
        ground_step: 50.0,
        veg_density: 0.0,
        height: 28.0,
        sag: 15.0,
        phase_offset: 0.0,
        seed: 1,
    }
}

fn square_geojson(min: f64, max: f64) -> String {
    format!(
        r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{}},
        "geometry":{{"type":"Polygon","coordinates":[[[{min},{min}],[{max},{min}],[{max},{max}],[{min},{max}],[{min},{min}]]]}}}}]}}"#
    )
}

fn line_geojson(x0: f64, y0: f64, x1: f64, y1: f64) -> String {
    format!(
        r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{}},
        "geometry":{{"type":"LineString","coordinates":[[{x0},{y0}],[{x1},{y1}]]}}}}]}}"#
    )
}

fn write_inputs(dir: &Path, aoi: &str, lines: &str) -> InputPaths {
    let aoi_path = dir.join("aoi.geojson");
    let lines_path = dir.join("lines.geojson");
    fs::write(&aoi_path, aoi).unwrap();
    fs::write(&lines_path, lines).unwrap();
    InputPaths {
        aoi: aoi_path,
        lines: lines_path,
        towers: None,
    }
}

struct NoCompressor;

impl CommandRunner for NoCompressor {
    fn is_available(&self, _program: &str) -> bool {
        false
    }

    fn run(&self, program: &str, _args: &[String]) -> io::Result<CommandOutput> {
        Err(io::Error::new(io::ErrorKind::NotFound, program.to_string()))
    }
}

fn of_class(points: &[PointRecord], class: u8) -> Vec<PointRecord> {
    points
        .iter()
        .copied()
        .filter(|p| p.classification == class)
        .collect()
}

fn class_ranks(points: &[PointRecord]) -> Vec<usize> {
    points
        .iter()
        .filter_map(|p| ASSEMBLY_ORDER.iter().position(|&id| id == p.classification))
        .collect()
}

#[test]
fn reference_corridor_end_to_end() {
    let inputs = NormalizedInputs {
        epsg: 32631,
        aoi: MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)
        ]]),
        lines: vec![line_string![(x: 0.0, y: 50.0), (x: 100.0, y: 50.0)]],
        towers: None,
        diagnostics: LoadDiagnostics::default(),
    };
    let synthesis = synthesize(
        &inputs,
        &reference_params(),
        Arc::new(GeoPlanarOps::default()),
        &CancelToken::new(),
        &ProgressBar::hidden(),
    );
    let points = synthesis.cloud.points();

    let ground: Vec<(f64, f64)> = of_class(points, GROUND)
        .iter()
        .map(|p| (p.x, p.y))
        .collect();
    assert_eq!(ground, vec![(0.0, 40.0), (50.0, 40.0), (100.0, 40.0)]);
    assert!(of_class(points, GROUND).iter().all(|p| p.z == 0.0));

    assert!(of_class(points, VEGETATION).is_empty());
    assert!(of_class(points, TOWER).is_empty());

    let wire = of_class(points, WIRE);
    assert_eq!(wire.len(), 11);
    for (i, p) in wire.iter().enumerate() {
        assert_abs_diff_eq!(p.x, 10.0 * i as f64, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 50.0, epsilon = 1e-9);
    }
    assert_eq!(wire[0].z, 28.0);
    assert_abs_diff_eq!(wire[10].z, 28.0, epsilon = 1e-9);
    assert_abs_diff_eq!(wire[5].z, 13.0, epsilon = 1e-9);

    let ranks = class_ranks(points);
    assert_eq!(ranks.len(), points.len());
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    assert_abs_diff_eq!(synthesis.corridor_area, 2000.0, epsilon = 1e-6);
}

#[test]
fn files_in_local_frame_round_trip_through_las_and_report() {
    let dir = scratch("local_frame");
    let paths = write_inputs(
        &dir,
        &square_geojson(0.0, 100.0),
        &line_geojson(0.0, 50.0, 100.0, 50.0),
    );
    let out = dir.join("corridor.las");

    let report = CorridorSynthesizer::new(reference_params())
        .with_local_frame(Some(32650))
        .with_progress(false)
        .run(&paths, &out)
        .unwrap();

    assert_eq!(report.epsg, 32650);
    assert_eq!(report.point_count, 14);
    assert_eq!(report.classes[&GROUND].points, 3);
    assert_eq!(report.classes[&WIRE].points, 11);
    assert!(report.warnings.is_empty());

    let reader = create_reader(&out).unwrap();
    assert_eq!(reader.header().number_of_points(), 14);
    assert_eq!(read_epsg(&reader), Some(32650));

    let report_json = fs::read_to_string(dir.join("corridor_report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report_json).unwrap();
    assert_eq!(value["point_count"], 14);
    assert_eq!(value["params"]["ground_step"], 50.0);
}

#[test]
fn geographic_inputs_land_in_the_centroid_utm_zone() {
    let dir = scratch("wgs84");
    let paths = write_inputs(
        &dir,
        &square_geojson(2.999, 3.001),
        &line_geojson(2.998, 3.0, 3.002, 3.0),
    );
    let out = dir.join("corridor.las");
    let params = SynthesisParams {
        width: 10.0,
        ground_step: 20.0,
        veg_density: 0.01,
        seed: 5,
        ..SynthesisParams::default()
    };

    let report = CorridorSynthesizer::new(params)
        .with_progress(false)
        .with_report(false)
        .run(&paths, &out)
        .unwrap();

    assert_eq!(report.epsg, 32631);
    assert!(report.classes[&GROUND].points > 0);
    assert!(report.classes[&WIRE].points > 0);
    assert_eq!(
        report.classes[&VEGETATION].points,
        report.vegetation.delivered
    );
    // About 222 m of line clipped to a 20 m wide band.
    assert!(report.corridor_area > 4000.0 && report.corridor_area < 4600.0);

    let bounds = report.bounds.unwrap();
    assert!(bounds.min_x > 499_000.0 && bounds.max_x < 501_000.0);
    assert!(bounds.min_y > 331_000.0 && bounds.max_y < 333_000.0);
    assert!(!dir.join("corridor_report.json").exists());
}

#[test]
fn disjoint_aoi_writes_an_empty_cloud() {
    let dir = scratch("disjoint");
    let paths = write_inputs(
        &dir,
        &square_geojson(0.0, 100.0),
        &line_geojson(500.0, 500.0, 600.0, 500.0),
    );
    let out = dir.join("empty.las");

    let report = CorridorSynthesizer::new(reference_params())
        .with_local_frame(Some(32631))
        .with_progress(false)
        .run(&paths, &out)
        .unwrap();

    assert_eq!(report.point_count, 0);
    assert_eq!(report.corridor_area, 0.0);
    assert!(report.bounds.is_none());
    assert!(report.warnings.iter().any(|w| w.contains("No points")));
    assert_eq!(
        create_reader(&out).unwrap().header().number_of_points(),
        0
    );
}

#[test]
fn laz_request_without_compressor_keeps_las() {
    let dir = scratch("laz_fallback");
    let mut paths = write_inputs(
        &dir,
        &square_geojson(0.0, 100.0),
        &line_geojson(0.0, 50.0, 100.0, 50.0),
    );
    paths.towers = Some(dir.join("missing_towers.geojson"));
    let out = dir.join("corridor.laz");

    let report = CorridorSynthesizer::new(reference_params())
        .with_local_frame(Some(32631))
        .with_command_runner(Box::new(NoCompressor))
        .with_progress(false)
        .run(&paths, &out)
        .unwrap();

    let output = report.output.as_ref().unwrap();
    assert_eq!(output.path, dir.join("corridor.las"));
    assert!(matches!(
        output.compression,
        CompressionOutcome::FellBack { .. }
    ));
    assert!(!out.exists());
    assert_eq!(
        create_reader(&output.path)
            .unwrap()
            .header()
            .number_of_points(),
        14
    );
    assert!(report.warnings.iter().any(|w| w.contains("Tower file")));
    assert!(report.warnings.iter().any(|w| w.contains("compression")));
}

#[test]
fn unknown_crs_in_input_is_fatal() {
    let dir = scratch("bad_crs");
    let aoi = r#"{"type":"FeatureCollection",
        "crs":{"type":"name","properties":{"name":"EPSG:3857"}},
        "features":[]}"#;
    let paths = write_inputs(&dir, aoi, &line_geojson(0.0, 0.0, 1.0, 1.0));

    let result = CorridorSynthesizer::new(reference_params())
        .with_progress(false)
        .run(&paths, &dir.join("never.las"));
    assert!(matches!(
        result,
        Err(corridor_synth::SynthError::UnsupportedCrs(_))
    ));
}

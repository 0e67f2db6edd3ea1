/// LAS reading and writing for synthesized point clouds
use crate::error::Result;
use crate::point_cloud::PointCloud;
use constants::synthesis::LAS_SCALE;
use indicatif::ProgressBar;
use las::point::{Classification, Format};
use las::{Builder, Color, Point, Reader, Transform, Vector, Vlr, Writer};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

const GEOKEY_USER_ID: &str = "LASF_Projection";
const GEOKEY_DIRECTORY_RECORD: u16 = 34735;
const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;
const MODEL_TYPE_PROJECTED: u16 = 1;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;

/// Create LAS file reader for point cloud access.
/// Handles both .las and .laz compressed formats.
pub fn create_reader(file_path: &Path) -> Result<Reader> {
    let file = File::open(file_path)?;
    let buf_reader = BufReader::new(file);
    Ok(Reader::new(buf_reader)?)
}

/// Write the cloud as LAS 1.2, point format 3, tagged with its EPSG code.
/// Parent directories are created. An empty cloud still gives a valid file.
pub fn write_point_cloud(cloud: &PointCloud, path: &Path, progress: &ProgressBar) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut builder = Builder::from((1, 2));
    builder.point_format = Format::new(3)?;
    let transform = Transform {
        scale: LAS_SCALE,
        offset: 0.0,
    };
    builder.transforms = Vector {
        x: transform,
        y: transform,
        z: transform,
    };
    builder.generating_software = env!("CARGO_PKG_NAME").to_string();
    builder.vlrs.push(geokey_directory(cloud.epsg()));
    let header = builder.into_header()?;

    progress.set_length(cloud.len() as u64);
    progress.set_message("Writing LAS");

    let mut writer = Writer::from_path(path, header)?;
    for record in cloud.points() {
        writer.write_point(Point {
            x: record.x,
            y: record.y,
            z: record.z,
            classification: Classification::new(record.classification)?,
            gps_time: Some(0.0),
            color: Some(Color::new(0, 0, 0)),
            ..Default::default()
        })?;
        progress.inc(1);
    }
    writer.close()?;
    progress.finish_with_message("LAS written");

    log::info!(
        "Wrote {} points (EPSG:{}) to {}",
        cloud.len(),
        cloud.epsg(),
        path.display()
    );
    Ok(cloud.len() as u64)
}

/// GeoTIFF key directory naming the projected CRS.
fn geokey_directory(epsg: u32) -> Vlr {
    let code = u16::try_from(epsg).unwrap_or_else(|_| {
        log::warn!("EPSG:{} does not fit a GeoTIFF key; tagging as user-defined", epsg);
        USER_DEFINED
    });
    #[rustfmt::skip]
    let keys: [u16; 16] = [
        1, 1, 0, 3,
        GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_PROJECTED,
        GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA,
        PROJECTED_CS_TYPE_KEY, 0, 1, code,
    ];
    Vlr {
        user_id: GEOKEY_USER_ID.to_string(),
        record_id: GEOKEY_DIRECTORY_RECORD,
        description: "GeoTiff GeoKeyDirectoryTag".to_string(),
        data: keys.iter().flat_map(|k| k.to_le_bytes()).collect(),
    }
}

/// EPSG code from a GeoKeyDirectory VLR, if the file carries one.
pub fn read_epsg(reader: &Reader) -> Option<u16> {
    let vlr = reader
        .header()
        .vlrs()
        .iter()
        .find(|v| v.user_id == GEOKEY_USER_ID && v.record_id == GEOKEY_DIRECTORY_RECORD)?;
    let words: Vec<u16> = vlr
        .data
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();
    words
        .get(4..)?
        .chunks_exact(4)
        .find(|key| key[0] == PROJECTED_CS_TYPE_KEY)
        .map(|key| key[3])
}

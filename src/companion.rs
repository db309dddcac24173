use gdal::vector::LayerAccess;
use gdal::Dataset;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::DataType;

const DATA_EXTENSIONS: [&str; 2] = [".shp", ".tif"];

/// Shapefiles and rasters under the data directory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct CompanionIndex {
    files: HashMap<String, PathBuf>,
}

impl CompanionIndex {
    /// Scans `root` recursively, skipping directories named in `exclude`.
    pub fn scan(root: &Path, exclude: &[String]) -> Result<Self> {
        let mut index = Self::default();
        index.scan_dir(root, exclude)?;
        debug!("Indexed {} data files under {:?}", index.len(), root);
        Ok(index)
    }

    fn scan_dir(&mut self, dir: &Path, exclude: &[String]) -> Result<()> {
        let mut entries = fs::read_dir(dir)?.collect::<std::result::Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if path.is_dir() {
                if exclude.iter().any(|skip| *skip == name) {
                    debug!("Skipping excluded directory: {:?}", path);
                    continue;
                }
                self.scan_dir(&path, exclude)?;
            } else if DATA_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
                self.insert(name, path);
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let name = name.into();
        let path = path.into();
        if let Some(existing) = self.files.get(&name) {
            warn!(
                "Duplicate data file name {}: keeping {:?}, ignoring {:?}",
                name, existing, path
            );
            return;
        }
        self.files.insert(name, path);
    }

    pub fn resolve(&self, data_file_name: &str) -> Result<&Path> {
        self.files
            .get(data_file_name)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::CompanionNotFound(data_file_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Reads the geometry of the first feature of a vector dataset.
pub trait GeometryReader: Send + Sync {
    fn first_feature_wkt(&self, path: &Path) -> Result<String>;
}

/// [`GeometryReader`] backed by GDAL/OGR.
#[derive(Debug, Default, Clone, Copy)]
pub struct OgrReader;

impl OgrReader {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryReader for OgrReader {
    fn first_feature_wkt(&self, path: &Path) -> Result<String> {
        let dataset = Dataset::open(path)?;
        let mut layer = dataset.layer(0)?;
        let feature = layer
            .features()
            .next()
            .ok_or_else(|| Error::EmptyLayer(path.to_path_buf()))?;
        let geometry = feature
            .geometry()
            .ok_or_else(|| Error::MissingGeometry(path.to_path_buf()))?;
        Ok(geometry.wkt()?)
    }
}

/// Classifies a companion file as raster or vector.
///
/// Rasters are recognised by extension alone; shapefiles are opened and the
/// WKT type of their first feature becomes the geometry label.
pub fn infer_data_type<G>(companion: &Path, reader: &G) -> Result<DataType>
where
    G: GeometryReader + ?Sized,
{
    match companion.extension().and_then(|s| s.to_str()) {
        Some("tif") => Ok(DataType::raster()),
        Some("shp") => {
            let wkt = reader.first_feature_wkt(companion)?;
            let label = geometry_label(&wkt)
                .ok_or_else(|| Error::MissingGeometry(companion.to_path_buf()))?;
            Ok(DataType::vector(label))
        }
        _ => Err(Error::UnsupportedDataType(
            companion.to_string_lossy().into_owned(),
        )),
    }
}

/// `LINESTRING (...)` -> `Line`, `POLYGON (...)` -> `Polygon`.
pub fn geometry_label(wkt: &str) -> Option<String> {
    let token = wkt.split(' ').next().unwrap_or_default();
    let mut chars = token.chars();
    let first = chars.next()?;

    let label: String = first
        .to_uppercase()
        .chain(chars.flat_map(char::to_lowercase))
        .collect();
    if label == "Linestring" {
        return Some("Line".to_string());
    }
    Some(label)
}

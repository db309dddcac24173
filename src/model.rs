use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const WMS_REFERENCE: &str = "http://www.opengis.net/def/serviceType/ogc/wms";
pub const WFS_REFERENCE: &str = "http://www.opengis.net/def/serviceType/ogc/wfs";
pub const ISO19139_REFERENCE: &str = "http://www.isotc211.org/schemas/2005/gmd/";

/// One GeoBlacklight 1.0 document.
///
/// Fields are declared in schema order, which is also the order they are
/// serialized in. Absent values stay as empty strings or empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GblRecord {
    pub dc_identifier_s: String,
    pub dc_title_s: String,
    pub dc_description_s: String,
    pub dc_rights_s: String,
    pub dct_provenance_s: String,
    pub dct_references_s: References,
    pub layer_id_s: String,
    pub layer_slug_s: String,
    /// Point, Line, Polygon, or Raster
    pub layer_geom_type_s: String,
    pub layer_modified_dt: String,
    pub dc_format_s: String,
    pub dc_language_s: String,
    /// "Dataset" or "Image"
    pub dc_type_s: String,
    pub dc_publisher_s: String,
    pub dc_creator_sm: Vec<String>,
    pub dc_subject_sm: Vec<String>,
    pub dct_issued_s: String,
    pub dct_temporal_sm: Vec<String>,
    pub dct_spatial_sm: Vec<String>,
    pub solr_geom: String,
    pub solr_year_i: String,
    pub geoblacklight_version: String,
}

/// `dct_references_s`: link type URI to URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct References {
    #[serde(rename = "http://www.opengis.net/def/serviceType/ogc/wms")]
    pub wms: String,
    #[serde(rename = "http://www.opengis.net/def/serviceType/ogc/wfs")]
    pub wfs: String,
    #[serde(rename = "http://www.isotc211.org/schemas/2005/gmd/")]
    pub iso19139: String,
}

/// Geometry/image type and resource type of the companion data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    pub geometry: String,
    pub resource: String,
}

impl DataType {
    pub fn raster() -> Self {
        Self {
            geometry: "Raster".to_string(),
            resource: "Image".to_string(),
        }
    }

    pub fn vector(geometry: impl Into<String>) -> Self {
        Self {
            geometry: geometry.into(),
            resource: "Dataset".to_string(),
        }
    }
}

/// Names derived from a `<basename>.<datatype>.xml` metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFile {
    /// e.g. `roads2020.shp.xml`
    pub file_name: String,
    /// e.g. `roads2020`
    pub basename: String,
    /// e.g. `roads2020.shp`
    pub data_file_name: String,
}

impl MetadataFile {
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let data_file_name = file_name
            .strip_suffix(".xml")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::InvalidFileName(file_name.to_string()))?;
        let basename = data_file_name
            .split('.')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::InvalidFileName(file_name.to_string()))?;

        Ok(Self {
            file_name: file_name.to_string(),
            basename: basename.to_string(),
            data_file_name: data_file_name.to_string(),
        })
    }

    /// `<basename>.<datatype>.json`
    pub fn output_file_name(&self) -> String {
        format!("{}.json", self.data_file_name)
    }
}

use crate::vocabulary::TopicVocabulary;

pub const GMD: &str = "http://www.isotc211.org/2005/gmd";
pub const GML: &str = "http://www.opengis.net/gml";
pub const GCO: &str = "http://www.isotc211.org/2005/gco";
pub const GTS: &str = "http://www.isotc211.org/2005/gts";

/// Institution-wide values stamped onto every record.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// `Public` or `Restricted`
    pub rights: String,
    /// Name of the holding institution
    pub institution: String,
    pub geoblacklight_version: String,
    /// GeoServer workspace the layers are published under
    pub layer_id_prefix: String,
    /// Location the ISO metadata documents are served from
    pub metadata_link_base: String,
    pub wms_url: String,
    pub wfs_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            rights: "Public".to_string(),
            institution: "UArizona".to_string(),
            geoblacklight_version: "1.0".to_string(),
            layer_id_prefix: "UniversityLibrary".to_string(),
            metadata_link_base: "https://geo.library.arizona.edu/metadata".to_string(),
            wms_url: "https://geo.library.arizona.edu/geoserver/wms".to_string(),
            wfs_url: "https://geo.library.arizona.edu/geoserver/wfs".to_string(),
        }
    }
}

/// Prefix to namespace URI bindings used by element paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespaces {
    bindings: Vec<(String, String)>,
}

impl Namespaces {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn iso19139() -> Self {
        Self::new()
            .bind("gmd", GMD)
            .bind("gml", GML)
            .bind("gco", GCO)
            .bind("gts", GTS)
    }

    pub fn bind(mut self, prefix: &str, uri: &str) -> Self {
        self.bindings.retain(|(p, _)| p != prefix);
        self.bindings.push((prefix.to_string(), uri.to_string()));
        self
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self::iso19139()
    }
}

/// Everything a [`crate::Mapper`] needs, injected once at construction.
#[derive(Debug, Clone, Default)]
pub struct MapperConfig {
    pub catalog: CatalogConfig,
    pub namespaces: Namespaces,
    pub vocabulary: TopicVocabulary,
}

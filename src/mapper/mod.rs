//! ISO 19139 to GeoBlacklight field mapping.
//!
//! Every value is located by a fixed [`ElementPath`] from the document root.
//! Descriptive fields tolerate missing elements and come out empty; the data
//! type and the temporal coverage are required and fail the record instead.

pub mod temporal;

use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

use crate::companion::{infer_data_type, CompanionIndex, GeometryReader};
use crate::config::{CatalogConfig, MapperConfig, Namespaces};
use crate::error::{Error, Result};
use crate::model::{GblRecord, MetadataFile, References};
use crate::parser::{Document, Element, ElementPath};
use crate::vocabulary::TopicVocabulary;

pub use temporal::{TemporalCoverage, TemporalExtent, TemporalShape};

const DATA_IDENTIFICATION: [&str; 2] = ["gmd:identificationInfo", "gmd:MD_DataIdentification"];
const CITATION: [&str; 4] = [
    "gmd:identificationInfo",
    "gmd:MD_DataIdentification",
    "gmd:citation",
    "gmd:CI_Citation",
];
const EXTENT: [&str; 4] = [
    "gmd:identificationInfo",
    "gmd:MD_DataIdentification",
    "gmd:extent",
    "gmd:EX_Extent",
];

/// Result of a single-value lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The path matched no element.
    Missing,
    /// The element exists but has no text.
    Empty,
    Text(&'a str),
}

impl<'a> Lookup<'a> {
    pub fn value(self) -> Option<&'a str> {
        match self {
            Lookup::Text(text) => Some(text),
            Lookup::Missing | Lookup::Empty => None,
        }
    }

    pub fn into_field(self) -> String {
        self.value().unwrap_or_default().to_string()
    }

    fn or_else(self, f: impl FnOnce() -> Lookup<'a>) -> Lookup<'a> {
        match self {
            Lookup::Text(_) => self,
            Lookup::Missing | Lookup::Empty => f(),
        }
    }
}

/// Text of the first element reached by `path`.
pub fn single_value<'a>(root: Element<'a>, path: &ElementPath) -> Lookup<'a> {
    match root.find(path) {
        None => Lookup::Missing,
        Some(element) => match clean(element.text()) {
            Some(text) => Lookup::Text(text),
            None => Lookup::Empty,
        },
    }
}

/// Texts of every element reached by `path`. Elements without text are skipped.
pub fn multiple_values<'a>(root: Element<'a>, path: &ElementPath) -> Vec<&'a str> {
    root.find_all(path)
        .into_iter()
        .filter_map(|element| clean(element.text()))
        .collect()
}

/// Value of a code list element: its text, or `codeListValue` when the text is empty.
pub fn code_value<'a>(element: Element<'a>) -> Option<&'a str> {
    clean(element.text()).or_else(|| clean(element.attribute("codeListValue")))
}

fn clean(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordType {
    Theme,
    Place,
}

impl KeywordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordType::Theme => "theme",
            KeywordType::Place => "place",
        }
    }
}

#[derive(Debug, Clone)]
struct RecordPaths {
    identifier: ElementPath,
    title: ElementPath,
    description: ElementPath,
    modified: [ElementPath; 2],
    format: [ElementPath; 2],
    language_code: ElementPath,
    language_text: ElementPath,
    keyword_types: ElementPath,
    keyword: ElementPath,
    role_codes: ElementPath,
    organisation_name: ElementPath,
    topics: ElementPath,
    citation_dates: ElementPath,
    citation_date_value: ElementPath,
    citation_date_type: ElementPath,
    /// west, east, north, south
    bounds: [ElementPath; 4],
    temporal: Vec<TemporalShape>,
}

impl RecordPaths {
    fn new(ns: &Namespaces) -> Result<Self> {
        let path = |steps: &[&str]| ElementPath::parse(ns, steps);

        let bbox = [
            &EXTENT[..],
            &["gmd:geographicElement", "gmd:EX_GeographicBoundingBox"][..],
        ]
        .concat();
        let bound = |name: &str| join_path(ns, &bbox, &[name, "gco:Decimal"]);

        let temporal_extent = [
            &EXTENT[..],
            &["gmd:temporalElement", "gmd:EX_TemporalExtent", "gmd:extent"][..],
        ]
        .concat();
        let spatial_temporal_extent = [
            &EXTENT[..],
            &["gmd:temporalElement", "gmd:EX_SpatialTemporalExtent", "gmd:extent"][..],
        ]
        .concat();

        Ok(Self {
            identifier: path(&["gmd:dataSetURI", "gco:CharacterString"][..])?,
            title: join_path(ns, &CITATION, &["gmd:title", "gco:CharacterString"])?,
            description: join_path(
                ns,
                &DATA_IDENTIFICATION,
                &["gmd:abstract", "gco:CharacterString"],
            )?,
            modified: [
                path(&["gmd:dateStamp", "gco:Date"][..])?,
                path(&["gmd:dateStamp", "gco:DateTime"][..])?,
            ],
            format: [
                path(
                    &[
                        "gmd:distributionInfo",
                        "gmd:MD_Distribution",
                        "gmd:distributor",
                        "gmd:MD_Distributor",
                        "gmd:distributorFormat",
                        "gmd:MD_Format",
                        "gmd:name",
                        "gco:CharacterString",
                    ][..],
                )?,
                path(
                    &[
                        "gmd:distributionInfo",
                        "gmd:MD_Distribution",
                        "gmd:distributionFormat",
                        "gmd:MD_Format",
                        "gmd:name",
                        "gco:CharacterString",
                    ][..],
                )?,
            ],
            language_code: path(&["gmd:language", "gmd:LanguageCode"][..])?,
            language_text: path(&["gmd:language", "gco:CharacterString"][..])?,
            keyword_types: join_path(
                ns,
                &DATA_IDENTIFICATION,
                &[
                    "gmd:descriptiveKeywords",
                    "gmd:MD_Keywords",
                    "gmd:type",
                    "gmd:MD_KeywordTypeCode",
                ],
            )?,
            keyword: path(&["gmd:keyword"][..])?,
            role_codes: join_path(
                ns,
                &CITATION,
                &[
                    "gmd:citedResponsibleParty",
                    "gmd:CI_ResponsibleParty",
                    "gmd:role",
                    "gmd:CI_RoleCode",
                ],
            )?,
            organisation_name: path(&["gmd:organisationName", "gco:CharacterString"][..])?,
            topics: join_path(
                ns,
                &DATA_IDENTIFICATION,
                &["gmd:topicCategory", "gmd:MD_TopicCategoryCode"],
            )?,
            citation_dates: join_path(ns, &CITATION, &["gmd:date", "gmd:CI_Date"])?,
            citation_date_value: path(&["gmd:date", "gco:Date"][..])?,
            citation_date_type: path(&["gmd:dateType", "gmd:CI_DateTypeCode"][..])?,
            bounds: [
                bound("gmd:westBoundLongitude")?,
                bound("gmd:eastBoundLongitude")?,
                bound("gmd:northBoundLatitude")?,
                bound("gmd:southBoundLatitude")?,
            ],
            temporal: vec![
                TemporalShape::Period {
                    begin: join_path(
                        ns,
                        &temporal_extent,
                        &["gml:TimePeriod", "gml:beginPosition"],
                    )?,
                    end: join_path(
                        ns,
                        &temporal_extent,
                        &["gml:TimePeriod", "gml:endPosition"],
                    )?,
                },
                TemporalShape::Instant {
                    position: join_path(
                        ns,
                        &spatial_temporal_extent,
                        &["gml:TimeInstant", "gml:timePosition"],
                    )?,
                },
                TemporalShape::Instant {
                    position: join_path(
                        ns,
                        &temporal_extent,
                        &["gml:TimeInstant", "gml:timePosition"],
                    )?,
                },
            ],
        })
    }
}

fn join_path(ns: &Namespaces, prefix: &[&str], steps: &[&str]) -> Result<ElementPath> {
    ElementPath::parse(ns, &[prefix, steps].concat())
}

/// Builds [`GblRecord`]s from parsed ISO 19139 documents.
#[derive(Debug, Clone)]
pub struct Mapper {
    catalog: CatalogConfig,
    vocabulary: TopicVocabulary,
    paths: RecordPaths,
    slug_separator: Regex,
}

impl Mapper {
    pub fn new(config: MapperConfig) -> Result<Self> {
        Ok(Self {
            paths: RecordPaths::new(&config.namespaces)?,
            catalog: config.catalog,
            vocabulary: config.vocabulary,
            slug_separator: Regex::new(r"\W+|_")?,
        })
    }

    /// Maps one document. The companion data file is looked up in
    /// `companions` and classified with `geometry`.
    pub fn map_record<G>(
        &self,
        doc: &Document,
        file: &MetadataFile,
        companions: &CompanionIndex,
        geometry: &G,
    ) -> Result<GblRecord>
    where
        G: GeometryReader + ?Sized,
    {
        let root = doc.root();
        let paths = &self.paths;
        let catalog = &self.catalog;

        let companion = companions.resolve(&file.data_file_name)?;
        let data_type = infer_data_type(companion, geometry)?;
        let coverage = self.temporal_coverage(root)?;

        let mut subjects = self.keywords(root, KeywordType::Theme);
        subjects.extend(self.topic_categories(root));

        let record = GblRecord {
            dc_identifier_s: single_value(root, &paths.identifier).into_field(),
            dc_title_s: single_value(root, &paths.title).into_field(),
            dc_description_s: single_value(root, &paths.description).into_field(),
            dc_rights_s: catalog.rights.clone(),
            dct_provenance_s: catalog.institution.clone(),
            dct_references_s: References {
                wms: catalog.wms_url.clone(),
                wfs: catalog.wfs_url.clone(),
                iso19139: format!(
                    "{}/{}",
                    catalog.metadata_link_base.trim_end_matches('/'),
                    file.file_name
                ),
            },
            layer_id_s: format!("{}:{}", catalog.layer_id_prefix, file.basename),
            layer_slug_s: self.slug(&file.basename),
            layer_geom_type_s: data_type.geometry,
            layer_modified_dt: single_value(root, &paths.modified[0])
                .or_else(|| single_value(root, &paths.modified[1]))
                .into_field(),
            dc_format_s: single_value(root, &paths.format[0])
                .or_else(|| single_value(root, &paths.format[1]))
                .into_field(),
            dc_language_s: self.language(root),
            dc_type_s: data_type.resource,
            dc_publisher_s: self.organisation(root, "publisher").unwrap_or_default(),
            dc_creator_sm: self.organisation(root, "originator").into_iter().collect(),
            dc_subject_sm: subjects,
            dct_issued_s: self.issued(root),
            dct_temporal_sm: vec![coverage.summary],
            dct_spatial_sm: self.keywords(root, KeywordType::Place),
            solr_geom: self.envelope(root),
            solr_year_i: coverage.year,
            geoblacklight_version: catalog.geoblacklight_version.clone(),
        };

        debug!("Mapped {} -> {}", file.file_name, record.layer_slug_s);
        Ok(record)
    }

    /// Keywords of every `MD_Keywords` block of the given type, split on
    /// commas and deduplicated.
    pub fn keywords(&self, root: Element<'_>, kind: KeywordType) -> Vec<String> {
        let mut found = BTreeSet::new();

        for type_code in root.find_all(&self.paths.keyword_types) {
            if code_value(type_code) != Some(kind.as_str()) {
                continue;
            }
            // MD_KeywordTypeCode -> gmd:type -> MD_Keywords
            let Some(block) = type_code.parent().and_then(|el| el.parent()) else {
                continue;
            };

            for keyword in block.find_all(&self.paths.keyword) {
                let Some(text) = keyword.children().next().and_then(|el| el.text()) else {
                    continue;
                };
                for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    found.insert(token.to_string());
                }
            }
        }

        found.into_iter().collect()
    }

    /// Organisation name of the first cited responsible party with `role`.
    pub fn organisation(&self, root: Element<'_>, role: &str) -> Option<String> {
        let role_code = root
            .find_all(&self.paths.role_codes)
            .into_iter()
            .find(|code| code_value(*code) == Some(role))?;
        // CI_RoleCode -> gmd:role -> CI_ResponsibleParty
        let party = role_code.parent()?.parent()?;
        single_value(party, &self.paths.organisation_name)
            .value()
            .map(str::to_string)
    }

    pub fn topic_categories(&self, root: Element<'_>) -> Vec<String> {
        let codes = multiple_values(root, &self.paths.topics)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.vocabulary.map_topics(codes)
    }

    pub fn temporal_coverage(&self, root: Element<'_>) -> Result<TemporalCoverage> {
        temporal::first_extent(&self.paths.temporal, root)
            .ok_or(Error::MissingTemporalCoverage)?
            .coverage()
    }

    /// `<institution>-<word>-<word>...`, lowercased.
    pub fn slug(&self, basename: &str) -> String {
        let mut slug = self.catalog.institution.to_lowercase();
        for word in self
            .slug_separator
            .split(basename)
            .filter(|word| !word.is_empty())
        {
            slug.push('-');
            slug.push_str(&word.to_lowercase());
        }
        slug
    }

    fn language(&self, root: Element<'_>) -> String {
        root.find(&self.paths.language_code)
            .and_then(code_value)
            .or_else(|| single_value(root, &self.paths.language_text).value())
            .unwrap_or_default()
            .to_string()
    }

    /// Publication date of the citation, else its first date.
    fn issued(&self, root: Element<'_>) -> String {
        let dates = root.find_all(&self.paths.citation_dates);
        let publication = dates.iter().find(|date| {
            date.find(&self.paths.citation_date_type)
                .and_then(code_value)
                == Some("publication")
        });

        publication
            .or(dates.first())
            .map(|date| single_value(*date, &self.paths.citation_date_value).into_field())
            .unwrap_or_default()
    }

    /// `ENVELOPE(W, E, N, S)` when all four bounds are numeric.
    fn envelope(&self, root: Element<'_>) -> String {
        let bounds: Option<Vec<&str>> = self
            .paths
            .bounds
            .iter()
            .map(|path| single_value(root, path).value())
            .collect();

        match bounds {
            Some(b) if b.iter().all(|v| v.parse::<f64>().is_ok()) => {
                format!("ENVELOPE({}, {}, {}, {})", b[0], b[1], b[2], b[3])
            }
            _ => {
                debug!("Bounding box incomplete, leaving solr_geom empty");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use std::path::Path;

    const HEADER: &str = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"
        xmlns:gco="http://www.isotc211.org/2005/gco"
        xmlns:gml="http://www.opengis.net/gml">"#;

    fn doc(body: &str) -> Document {
        let xml = format!("{}{}</gmd:MD_Metadata>", HEADER, body);
        parse_document(xml.as_bytes()).unwrap()
    }

    fn mapper() -> Mapper {
        Mapper::new(MapperConfig::default()).unwrap()
    }

    fn keyword_block(kind: &str, keywords: &[&str]) -> String {
        let keywords: String = keywords
            .iter()
            .map(|k| format!("<gmd:keyword><gco:CharacterString>{}</gco:CharacterString></gmd:keyword>", k))
            .collect();
        format!(
            "<gmd:descriptiveKeywords><gmd:MD_Keywords>{}<gmd:type><gmd:MD_KeywordTypeCode>{}</gmd:MD_KeywordTypeCode></gmd:type></gmd:MD_Keywords></gmd:descriptiveKeywords>",
            keywords, kind
        )
    }

    fn identification(inner: &str) -> String {
        format!(
            "<gmd:identificationInfo><gmd:MD_DataIdentification>{}</gmd:MD_DataIdentification></gmd:identificationInfo>",
            inner
        )
    }

    fn party(role: &str, name: &str) -> String {
        format!(
            "<gmd:citedResponsibleParty><gmd:CI_ResponsibleParty><gmd:organisationName><gco:CharacterString>{}</gco:CharacterString></gmd:organisationName><gmd:role><gmd:CI_RoleCode codeList=\"x\" codeListValue=\"{}\"/></gmd:role></gmd:CI_ResponsibleParty></gmd:citedResponsibleParty>",
            name, role
        )
    }

    #[test]
    fn test_single_value_distinguishes_missing_and_empty() {
        let d = doc("<gmd:dataSetURI><gco:CharacterString> </gco:CharacterString></gmd:dataSetURI>");
        let m = mapper();
        assert_eq!(single_value(d.root(), &m.paths.identifier), Lookup::Empty);
        assert_eq!(single_value(d.root(), &m.paths.title), Lookup::Missing);
        assert_eq!(Lookup::Missing.into_field(), "");

        let d = doc("<gmd:dataSetURI><gco:CharacterString>urn:x</gco:CharacterString></gmd:dataSetURI>");
        assert_eq!(single_value(d.root(), &m.paths.identifier), Lookup::Text("urn:x"));
    }

    #[test]
    fn test_keywords_by_type() {
        let body = identification(&[
            keyword_block("theme", &["roads", "streets"]),
            keyword_block("place", &["Pima County", "Arizona"]),
            keyword_block("theme", &["roads"]),
        ]
        .concat());
        let d = doc(&body);
        let m = mapper();

        assert_eq!(m.keywords(d.root(), KeywordType::Theme), vec!["roads", "streets"]);
        assert_eq!(
            m.keywords(d.root(), KeywordType::Place),
            vec!["Arizona", "Pima County"]
        );
    }

    #[test]
    fn test_keywords_split_on_commas_and_skip_empty() {
        let body = identification(&[
            keyword_block("theme", &["roads, highways,", "roads"]),
            "<gmd:descriptiveKeywords><gmd:MD_Keywords><gmd:keyword><gco:CharacterString/></gmd:keyword><gmd:keyword/><gmd:type><gmd:MD_KeywordTypeCode codeListValue=\"theme\"/></gmd:type></gmd:MD_Keywords></gmd:descriptiveKeywords>".to_string(),
        ]
        .concat());
        let d = doc(&body);
        assert_eq!(
            mapper().keywords(d.root(), KeywordType::Theme),
            vec!["highways", "roads"]
        );
    }

    #[test]
    fn test_organisation_first_match() {
        let citation = format!(
            "<gmd:citation><gmd:CI_Citation>{}{}{}</gmd:CI_Citation></gmd:citation>",
            party("originator", "Pima County DOT"),
            party("publisher", "Pima County GIS"),
            party("publisher", "Someone Else"),
        );
        let d = doc(&identification(&citation));
        let m = mapper();
        assert_eq!(m.organisation(d.root(), "publisher").as_deref(), Some("Pima County GIS"));
        assert_eq!(m.organisation(d.root(), "originator").as_deref(), Some("Pima County DOT"));
        assert_eq!(m.organisation(d.root(), "distributor"), None);
    }

    #[test]
    fn test_topic_categories_mapped_in_order() {
        let topics: String = ["transportation", "custom", "transportation"]
            .iter()
            .map(|t| format!("<gmd:topicCategory><gmd:MD_TopicCategoryCode>{}</gmd:MD_TopicCategoryCode></gmd:topicCategory>", t))
            .collect();
        let d = doc(&identification(&topics));
        assert_eq!(
            mapper().topic_categories(d.root()),
            vec!["Transportation", "custom", "Transportation"]
        );
    }

    #[test]
    fn test_slug() {
        let m = mapper();
        assert_eq!(m.slug("roads2020"), "uarizona-roads2020");
        assert_eq!(m.slug("Pima_County Roads-2020"), "uarizona-pima-county-roads-2020");
        assert_eq!(m.slug("__Lakes__"), "uarizona-lakes");

        let slug = m.slug("Tucson (Streets) v2.1");
        assert_eq!(slug, m.slug("Tucson (Streets) v2.1"));
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_temporal_fallback_to_instant() {
        let extent = "<gmd:extent><gmd:EX_Extent><gmd:temporalElement><gmd:EX_SpatialTemporalExtent><gmd:extent><gml:TimeInstant><gml:timePosition>2017-08-01</gml:timePosition></gml:TimeInstant></gmd:extent></gmd:EX_SpatialTemporalExtent></gmd:temporalElement></gmd:EX_Extent></gmd:extent>";
        let d = doc(&identification(extent));
        let coverage = mapper().temporal_coverage(d.root()).unwrap();
        assert_eq!(coverage.year, "2017");
        assert_eq!(coverage.summary, "2017");
    }

    #[test]
    fn test_temporal_missing_is_error() {
        let d = doc(&identification(""));
        assert!(matches!(
            mapper().temporal_coverage(d.root()),
            Err(Error::MissingTemporalCoverage)
        ));
    }

    #[test]
    fn test_issued_prefers_publication_date() {
        let date = |value: &str, kind: &str| {
            format!("<gmd:date><gmd:CI_Date><gmd:date><gco:Date>{}</gco:Date></gmd:date><gmd:dateType><gmd:CI_DateTypeCode codeListValue=\"{}\">{}</gmd:CI_DateTypeCode></gmd:dateType></gmd:CI_Date></gmd:date>", value, kind, kind)
        };
        let citation = format!(
            "<gmd:citation><gmd:CI_Citation>{}{}</gmd:CI_Citation></gmd:citation>",
            date("2019-01-01", "creation"),
            date("2020-06-30", "publication")
        );
        let d = doc(&identification(&citation));
        assert_eq!(mapper().issued(d.root()), "2020-06-30");

        let citation = format!(
            "<gmd:citation><gmd:CI_Citation>{}</gmd:CI_Citation></gmd:citation>",
            date("2019-01-01", "creation")
        );
        let d = doc(&identification(&citation));
        assert_eq!(mapper().issued(d.root()), "2019-01-01");
    }

    #[test]
    fn test_envelope_requires_all_bounds() {
        let bbox = |south: &str| {
            format!("<gmd:extent><gmd:EX_Extent><gmd:geographicElement><gmd:EX_GeographicBoundingBox><gmd:westBoundLongitude><gco:Decimal>-111.2</gco:Decimal></gmd:westBoundLongitude><gmd:eastBoundLongitude><gco:Decimal>-110.7</gco:Decimal></gmd:eastBoundLongitude><gmd:northBoundLatitude><gco:Decimal>32.5</gco:Decimal></gmd:northBoundLatitude>{}</gmd:EX_GeographicBoundingBox></gmd:geographicElement></gmd:EX_Extent></gmd:extent>", south)
        };
        let d = doc(&identification(&bbox(
            "<gmd:southBoundLatitude><gco:Decimal>31.9</gco:Decimal></gmd:southBoundLatitude>",
        )));
        assert_eq!(mapper().envelope(d.root()), "ENVELOPE(-111.2, -110.7, 32.5, 31.9)");

        let d = doc(&identification(&bbox("")));
        assert_eq!(mapper().envelope(d.root()), "");
    }

    #[test]
    fn test_language_from_code_list_value() {
        let d = doc("<gmd:language><gmd:LanguageCode codeList=\"x\" codeListValue=\"eng\"/></gmd:language>");
        assert_eq!(mapper().language(d.root()), "eng");
    }

    #[test]
    fn test_missing_companion_aborts_record() {
        struct NoGeometry;
        impl GeometryReader for NoGeometry {
            fn first_feature_wkt(&self, path: &Path) -> Result<String> {
                Err(Error::EmptyLayer(path.to_path_buf()))
            }
        }

        let d = doc("");
        let file = MetadataFile::from_file_name("roads2020.shp.xml").unwrap();
        let result = mapper().map_record(&d, &file, &CompanionIndex::default(), &NoGeometry);
        assert!(matches!(result, Err(Error::CompanionNotFound(name)) if name == "roads2020.shp"));
    }
}

use crate::error::{Error, Result};
use crate::parser::{Element, ElementPath};

/// Begin/end positions of the dataset's temporal coverage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalExtent {
    pub begin: Option<String>,
    pub end: String,
}

/// Values derived from a [`TemporalExtent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalCoverage {
    /// `solr_year_i`
    pub year: String,
    /// `YYYY` or `YYYY-YYYY`
    pub summary: String,
}

/// One XML shape temporal coverage may be recorded in.
#[derive(Debug, Clone)]
pub enum TemporalShape {
    /// `gml:TimePeriod` with begin and end positions. Both must be present.
    Period { begin: ElementPath, end: ElementPath },
    /// `gml:TimeInstant`, whose position is the end date.
    Instant { position: ElementPath },
}

impl TemporalShape {
    pub fn extract(&self, root: Element<'_>) -> Option<TemporalExtent> {
        match self {
            TemporalShape::Period { begin, end } => {
                let begin = root.find(begin)?;
                let end = root.find(end)?;
                Some(TemporalExtent {
                    begin: clean(begin.text()).map(str::to_string),
                    end: clean(end.text()).unwrap_or_default().to_string(),
                })
            }
            TemporalShape::Instant { position } => {
                let position = root.find(position)?;
                Some(TemporalExtent {
                    begin: None,
                    end: clean(position.text()).unwrap_or_default().to_string(),
                })
            }
        }
    }
}

/// Tries each shape in order; the first one present in the document wins.
pub fn first_extent(shapes: &[TemporalShape], root: Element<'_>) -> Option<TemporalExtent> {
    shapes.iter().find_map(|shape| shape.extract(root))
}

impl TemporalExtent {
    pub fn coverage(&self) -> Result<TemporalCoverage> {
        let end_year = year_of("end date", &self.end)?;
        let summary = match &self.begin {
            Some(begin) => {
                let begin_year = year_of("begin date", begin)?;
                if begin_year == end_year {
                    end_year.to_string()
                } else {
                    format!("{}-{}", begin_year, end_year)
                }
            }
            None => end_year.to_string(),
        };

        Ok(TemporalCoverage {
            year: end_year.to_string(),
            summary,
        })
    }
}

fn year_of<'a>(field: &'static str, date: &'a str) -> Result<&'a str> {
    date.get(..4)
        .filter(|year| year.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::MalformedDate {
            field,
            value: date.to_string(),
        })
}

fn clean(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Namespaces;
    use crate::parser::parse_document;

    fn extent(begin: Option<&str>, end: &str) -> TemporalExtent {
        TemporalExtent {
            begin: begin.map(str::to_string),
            end: end.to_string(),
        }
    }

    #[test]
    fn test_same_year_collapses() {
        let coverage = extent(Some("2020-01-01"), "2020-12-31").coverage().unwrap();
        assert_eq!(coverage.year, "2020");
        assert_eq!(coverage.summary, "2020");
    }

    #[test]
    fn test_year_range() {
        let coverage = extent(Some("1998-06-01"), "2004-05-31").coverage().unwrap();
        assert_eq!(coverage.year, "2004");
        assert_eq!(coverage.summary, "1998-2004");
    }

    #[test]
    fn test_end_only() {
        let coverage = extent(None, "2015-03-01T00:00:00").coverage().unwrap();
        assert_eq!(coverage.year, "2015");
        assert_eq!(coverage.summary, "2015");
    }

    #[test]
    fn test_malformed_dates() {
        assert!(matches!(
            extent(None, "15").coverage(),
            Err(Error::MalformedDate { field: "end date", .. })
        ));
        assert!(matches!(
            extent(None, "").coverage(),
            Err(Error::MalformedDate { .. })
        ));
        assert!(matches!(
            extent(Some("unknown"), "2020").coverage(),
            Err(Error::MalformedDate { field: "begin date", .. })
        ));
    }

    #[test]
    fn test_first_matching_shape_wins() {
        let xml = r#"
        <root xmlns:gml="http://www.opengis.net/gml">
          <instant><gml:timePosition>2011-05-02</gml:timePosition></instant>
          <period>
            <gml:beginPosition>2009-01-01</gml:beginPosition>
            <gml:endPosition>2010-01-01</gml:endPosition>
          </period>
        </root>"#;
        let doc = parse_document(xml.as_bytes()).unwrap();
        let ns = Namespaces::iso19139();
        let period = TemporalShape::Period {
            begin: ElementPath::parse(&ns, &["period", "gml:beginPosition"]).unwrap(),
            end: ElementPath::parse(&ns, &["period", "gml:endPosition"]).unwrap(),
        };
        let missing = TemporalShape::Period {
            begin: ElementPath::parse(&ns, &["missing", "gml:beginPosition"]).unwrap(),
            end: ElementPath::parse(&ns, &["period", "gml:endPosition"]).unwrap(),
        };
        let instant = TemporalShape::Instant {
            position: ElementPath::parse(&ns, &["instant", "gml:timePosition"]).unwrap(),
        };

        let found = first_extent(&[period.clone(), instant.clone()], doc.root()).unwrap();
        assert_eq!(found, extent(Some("2009-01-01"), "2010-01-01"));

        let found = first_extent(&[missing.clone(), instant], doc.root()).unwrap();
        assert_eq!(found, extent(None, "2011-05-02"));

        assert!(first_extent(&[missing], doc.root()).is_none());
    }
}

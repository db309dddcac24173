use std::collections::HashMap;

/// ISO 19115 `MD_TopicCategoryCode` values and their display labels.
pub const ISO_TOPIC_CATEGORIES: [(&str, &str); 19] = [
    ("farming", "Farming"),
    ("biota", "Biota"),
    ("boundaries", "Boundaries"),
    (
        "climatologyMeteorologyAtmosphere",
        "Climatology/Meteorology/Atmosphere",
    ),
    ("economy", "Economy"),
    ("elevation", "Elevation"),
    ("environment", "Environment"),
    ("geoscientificInformation", "Geoscientific Information"),
    ("health", "Health"),
    ("imageryBaseMapsEarthCover", "Imagery/Base Maps/Earth Cover"),
    ("intelligenceMilitary", "Intelligence/Military"),
    ("inlandWaters", "Inland Waters"),
    ("location", "Location"),
    ("oceans", "Oceans"),
    ("planningCadastre", "Planning Cadastre"),
    ("society", "Society"),
    ("structure", "Structure"),
    ("transportation", "Transportation"),
    ("utilitiesCommunications", "Utilities/Communications"),
];

#[derive(Debug, Clone)]
pub struct TopicVocabulary {
    labels: HashMap<String, String>,
}

impl TopicVocabulary {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: entries
                .into_iter()
                .map(|(code, label)| (code.into(), label.into()))
                .collect(),
        }
    }

    pub fn iso_topic_categories() -> Self {
        Self::new(ISO_TOPIC_CATEGORIES)
    }

    pub fn label(&self, code: &str) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Replaces every known code with its label. Unknown codes, order and
    /// duplicates are left as they are.
    pub fn map_topics(&self, mut codes: Vec<String>) -> Vec<String> {
        for code in codes.iter_mut() {
            if let Some(label) = self.label(code) {
                *code = label.to_string();
            }
        }
        codes
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for TopicVocabulary {
    fn default() -> Self {
        Self::iso_topic_categories()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_codes_map_once() {
        let vocabulary = TopicVocabulary::default();
        assert_eq!(vocabulary.len(), 19);

        for (code, label) in ISO_TOPIC_CATEGORIES {
            let mapped = vocabulary.map_topics(strings(&[code]));
            assert_eq!(mapped, vec![label.to_string()], "code {}", code);
            // ラベルを再度渡しても変化しない
            assert_eq!(vocabulary.map_topics(mapped.clone()), mapped);
        }
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let vocabulary = TopicVocabulary::default();
        let mapped = vocabulary.map_topics(strings(&[
            "transportation",
            "roads",
            "farming",
            "transportation",
        ]));
        assert_eq!(
            mapped,
            strings(&["Transportation", "roads", "Farming", "Transportation"])
        );
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        let vocabulary = TopicVocabulary::default();
        assert_eq!(
            vocabulary.map_topics(strings(&["Transportation", "geoscientificinformation"])),
            strings(&["Transportation", "geoscientificinformation"])
        );
        assert!(vocabulary.map_topics(Vec::new()).is_empty());
    }
}

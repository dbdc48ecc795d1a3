use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What the vision model saw in a product photo.
///
/// `keywords` is ordered best-first; the search core uses `keywords[0]` as
/// the query term. A result with no keywords is rejected at the recognizer
/// boundary, so consumers may rely on the list being non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RecognitionResult {
    /// The best keyword, used as the search term in image mode.
    #[must_use]
    pub fn top_keyword(&self) -> Option<&str> {
        self.keywords.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_keyword_is_first() {
        let result = RecognitionResult {
            keywords: vec!["耳機".to_owned(), "藍牙耳機".to_owned()],
            category: None,
            attributes: BTreeMap::new(),
            confidence: None,
            description: None,
        };
        assert_eq!(result.top_keyword(), Some("耳機"));
    }

    #[test]
    fn deserializes_with_only_keywords() {
        let result: RecognitionResult =
            serde_json::from_str(r#"{"keywords": ["laptop"]}"#).unwrap();
        assert_eq!(result.keywords, vec!["laptop"]);
        assert!(result.category.is_none());
        assert!(result.attributes.is_empty());
    }
}

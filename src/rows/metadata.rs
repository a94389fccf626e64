use serde::{Deserialize, Serialize};

/// Result-set level metadata
///
/// Fields the feed does not provide keep their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub total_rows: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub update_seq: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub warning: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bookmark: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_strings_are_omitted() {
        let meta = ResultMetadata {
            offset: 2,
            total_rows: 3,
            ..Default::default()
        };
        let encoded = serde_json::to_value(&meta).unwrap();
        assert_eq!(encoded, json!({"offset": 2, "total_rows": 3}));
    }

    #[test]
    fn test_missing_fields_default() {
        let meta: ResultMetadata = serde_json::from_str(r#"{"bookmark":"b"}"#).unwrap();
        assert_eq!(meta.bookmark, "b");
        assert_eq!(meta.offset, 0);
        assert!(meta.warning.is_empty());
    }
}

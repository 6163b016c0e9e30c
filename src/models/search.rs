use serde::{Deserialize, Serialize};

/// 検索エンドポイントの1ページ分のレスポンス
///
/// 課題は正規化前の生のJSONとして保持する。v3のトークンページング
/// （`nextPageToken` / `isLast`）と旧エンドポイントのレスポンスの両方を
/// 受けられるよう、全フィールドを欠落許容にしている。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<serde_json::Value>,

    #[serde(rename = "isLast")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_last: Option<bool>,

    #[serde(rename = "nextPageToken")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_page_deserialization() {
        let json_data = json!({
            "issues": [
                {"id": "10000", "key": "TEST-1", "fields": {"summary": "First"}},
                {"id": "10001", "key": "TEST-2", "fields": {"summary": "Second"}}
            ],
            "isLast": false,
            "nextPageToken": "CAEaAggD"
        });

        let page: SearchPage = serde_json::from_value(json_data).unwrap();

        assert_eq!(page.issues.len(), 2);
        assert_eq!(page.is_last, Some(false));
        assert_eq!(page.next_page_token, Some("CAEaAggD".to_string()));
    }

    #[test]
    fn test_search_page_legacy_response_shape() {
        // 旧 /rest/api/3/search のレスポンスにはトークン系フィールドがない
        let json_data = json!({
            "startAt": 0,
            "maxResults": 50,
            "total": 1,
            "issues": [
                {"id": "10000", "key": "TEST-1", "fields": {"summary": "Only"}}
            ]
        });

        let page: SearchPage = serde_json::from_value(json_data).unwrap();

        assert_eq!(page.issues.len(), 1);
        assert_eq!(page.is_last, None);
        assert_eq!(page.next_page_token, None);
        assert_eq!(page.total, Some(1));
    }

    #[test]
    fn test_search_page_empty_body() {
        let page: SearchPage = serde_json::from_value(json!({})).unwrap();

        assert!(page.issues.is_empty());
        assert_eq!(page.is_last, None);
        assert_eq!(page.next_page_token, None);
    }
}

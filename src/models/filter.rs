use serde::{Deserialize, Serialize};

/// 監視対象として設定されたフィルターの指定
///
/// `display_name` が未設定の場合、解決時にサーバー側のフィルター名が使われる。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterSpec {
    #[serde(rename = "filter_id")]
    pub id: String,
    #[serde(rename = "filter_name")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl FilterSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// サーバーから解決したフィルター定義（`GET /rest/api/3/filter/{id}` のレスポンス）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// JQLは不透明な文字列として扱い、内容は解釈しない
    #[serde(default)]
    pub jql: String,
    #[serde(rename = "self")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
}

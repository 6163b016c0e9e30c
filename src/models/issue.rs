use serde::{Deserialize, Serialize};

/// APIレスポンスから正規化した課題レコード
///
/// 欠落したフィールドはキーごと落とさずnullとして残す。
/// 下流（JSON出力・センサー属性）がキーの存在を前提にできるようにするため。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedIssue {
    pub id: Option<String>,
    pub key: Option<String>,
    pub summary: Option<String>,
    pub status: NormalizedStatus,
    pub assignee: Option<NormalizedAssignee>,
    pub priority: Option<String>,
    #[serde(rename = "issueType")]
    pub issue_type: Option<String>,
    pub parent: Option<NormalizedParent>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedStatus {
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedAssignee {
    #[serde(rename = "accountId")]
    pub account_id: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "emailAddress")]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedParent {
    pub key: Option<String>,
    pub id: Option<String>,
    pub summary: Option<String>,
}

/// フィルター内で最後に更新された課題のサマリー
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MostRecentTicket {
    pub key: Option<String>,
    pub summary: Option<String>,
    pub updated: Option<String>,
    pub updated_human: Option<String>,
}

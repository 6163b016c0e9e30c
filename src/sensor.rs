use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::coordinator::RefreshCycle;
use crate::models::FilterSpec;

/// 属性に含める課題数の上限。属性ペイロードの肥大化を防ぐ
pub const MAX_ATTRIBUTE_ISSUES: usize = 10;

/// 1フィルター分の受動的な読み取りビュー
///
/// コーディネーターが公開するスナップショットの上に載る。数値状態
/// （課題数）と構造化された属性バンドルを提供し、自分では何も取得しない。
#[derive(Debug, Clone)]
pub struct FilterSensor {
    snapshot: Arc<RwLock<Option<RefreshCycle>>>,
    spec: FilterSpec,
}

impl FilterSensor {
    pub(crate) fn new(snapshot: Arc<RwLock<Option<RefreshCycle>>>, spec: FilterSpec) -> Self {
        Self { snapshot, spec }
    }

    pub fn filter_id(&self) -> &str {
        &self.spec.id
    }

    /// 外部登録用の安定した識別子
    pub fn unique_id(&self) -> String {
        format!("jira_filter_{}", self.spec.id)
    }

    pub fn name(&self) -> String {
        match &self.spec.display_name {
            Some(name) => format!("Jira Filter {}", name),
            None => format!("Jira Filter {}", self.spec.id),
        }
    }

    /// 数値状態。データ未取得・当該フィルター欠落時は0
    pub async fn count(&self) -> usize {
        let snapshot = self.snapshot.read().await;
        snapshot
            .as_ref()
            .and_then(|cycle| cycle.get(&self.spec.id))
            .map(|result| result.total_count)
            .unwrap_or(0)
    }

    /// 構造化された属性バンドル
    ///
    /// 課題リストは先頭10件のコンパクト形に切り詰める。
    /// データ未取得時は空のマップを返す。
    pub async fn attributes(&self) -> Map<String, Value> {
        let snapshot = self.snapshot.read().await;
        let Some(result) = snapshot
            .as_ref()
            .and_then(|cycle| cycle.get(&self.spec.id))
        else {
            return Map::new();
        };

        let mut attributes = Map::new();
        attributes.insert("filter_id".to_string(), json!(result.filter_id));
        attributes.insert("filter_name".to_string(), json!(result.filter_name));
        attributes.insert("jql".to_string(), json!(result.jql));
        attributes.insert("total_count".to_string(), json!(result.total_count));
        attributes.insert("last_updated".to_string(), json!(result.last_updated));

        if !result.issues.is_empty() {
            let limited: Vec<Value> = result
                .issues
                .iter()
                .take(MAX_ATTRIBUTE_ISSUES)
                .map(|issue| {
                    json!({
                        "key": issue.key,
                        "summary": issue.summary,
                        "status": issue.status.name,
                        "priority": issue.priority,
                        "assignee": issue.assignee.as_ref().and_then(|a| a.display_name.clone()),
                        "updated": issue.updated,
                        "created": issue.created,
                    })
                })
                .collect();
            attributes.insert("issues".to_string(), Value::Array(limited));
        }

        if let Some(most_recent) = &result.most_recent_ticket {
            attributes.insert("most_recent_ticket".to_string(), json!(most_recent));
        }

        if let Some(error) = &result.error {
            attributes.insert("error".to_string(), json!(error));
        }

        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::FilterResult;
    use crate::models::{NormalizedIssue, NormalizedStatus};
    use chrono::Utc;

    fn issue(key: &str) -> NormalizedIssue {
        NormalizedIssue {
            id: Some(key.to_string()),
            key: Some(key.to_string()),
            summary: Some(format!("Summary of {}", key)),
            status: NormalizedStatus {
                name: Some("To Do".to_string()),
                category: Some("To Do".to_string()),
            },
            assignee: None,
            priority: Some("Medium".to_string()),
            issue_type: Some("Task".to_string()),
            parent: None,
            labels: vec![],
            created: Some("2024-01-01T00:00:00Z".to_string()),
            updated: Some("2024-01-02T00:00:00Z".to_string()),
        }
    }

    fn cycle_with_issues(filter_id: &str, count: usize) -> RefreshCycle {
        let issues: Vec<NormalizedIssue> =
            (0..count).map(|i| issue(&format!("TEST-{}", i))).collect();
        let stamp = Utc::now();
        RefreshCycle {
            refreshed_at: stamp,
            results: vec![FilterResult {
                filter_id: filter_id.to_string(),
                filter_name: "Open bugs".to_string(),
                jql: "project = TEST".to_string(),
                total_count: issues.len(),
                issues,
                most_recent_ticket: None,
                last_updated: stamp,
                error: None,
            }],
        }
    }

    fn sensor_with(cycle: Option<RefreshCycle>, spec: FilterSpec) -> FilterSensor {
        FilterSensor::new(Arc::new(RwLock::new(cycle)), spec)
    }

    #[tokio::test]
    async fn test_count_without_data() {
        // Given: スナップショット未公開のセンサー
        let sensor = sensor_with(None, FilterSpec::new("100"));

        // Then: 数値状態は0、属性は空
        assert_eq!(sensor.count().await, 0);
        assert!(sensor.attributes().await.is_empty());
    }

    #[tokio::test]
    async fn test_count_reflects_snapshot() {
        let sensor = sensor_with(Some(cycle_with_issues("100", 3)), FilterSpec::new("100"));

        assert_eq!(sensor.count().await, 3);
    }

    #[tokio::test]
    async fn test_attributes_truncate_issue_list() {
        // Given: 25課題を持つスナップショット
        let sensor = sensor_with(Some(cycle_with_issues("100", 25)), FilterSpec::new("100"));

        // When: 属性を取得
        let attributes = sensor.attributes().await;

        // Then: total_countは全件、issuesは10件まで
        assert_eq!(attributes["total_count"], 25);
        assert_eq!(attributes["issues"].as_array().unwrap().len(), MAX_ATTRIBUTE_ISSUES);
    }

    #[tokio::test]
    async fn test_attributes_compact_issue_shape() {
        let sensor = sensor_with(Some(cycle_with_issues("100", 1)), FilterSpec::new("100"));

        let attributes = sensor.attributes().await;

        let first = &attributes["issues"][0];
        assert_eq!(first["key"], "TEST-0");
        assert_eq!(first["status"], "To Do");
        assert_eq!(first["priority"], "Medium");
        // 未割り当てはnullとして現れる
        assert!(first["assignee"].is_null());
    }

    #[tokio::test]
    async fn test_attributes_omit_issues_when_empty() {
        let sensor = sensor_with(Some(cycle_with_issues("100", 0)), FilterSpec::new("100"));

        let attributes = sensor.attributes().await;

        assert_eq!(attributes["total_count"], 0);
        assert!(!attributes.contains_key("issues"));
    }

    #[test]
    fn test_sensor_naming() {
        let named = sensor_with(None, FilterSpec::new("100").display_name("Open bugs"));
        assert_eq!(named.name(), "Jira Filter Open bugs");
        assert_eq!(named.unique_id(), "jira_filter_100");

        let unnamed = sensor_with(None, FilterSpec::new("200"));
        assert_eq!(unnamed.name(), "Jira Filter 200");
    }
}

use serde_json::Value;

use crate::models::{NormalizedAssignee, NormalizedIssue, NormalizedParent, NormalizedStatus};

/// APIが返す生の課題オブジェクトを正規化レコードに変換する
///
/// 入力は任意のJSON値を許容し、決して失敗しない。ネストされた
/// オプショナルなサブオブジェクト（status, assignee, priority,
/// issuetype, parent）はnull・欠落・型違いのいずれでもnull側に倒す。
pub fn normalize_issue(raw: &Value) -> NormalizedIssue {
    let fields = present(raw.get("fields"));
    let status = nested(fields, "status");
    let assignee = nested(fields, "assignee");
    let parent = nested(fields, "parent");

    NormalizedIssue {
        id: text(Some(raw), "id"),
        key: text(Some(raw), "key"),
        summary: text(fields, "summary"),
        status: NormalizedStatus {
            name: text(status, "name"),
            category: text(nested(status, "statusCategory"), "name"),
        },
        assignee: assignee.map(|user| NormalizedAssignee {
            account_id: text(Some(user), "accountId"),
            display_name: text(Some(user), "displayName"),
            email_address: text(Some(user), "emailAddress"),
        }),
        priority: text(nested(fields, "priority"), "name"),
        issue_type: text(nested(fields, "issuetype"), "name"),
        parent: parent.map(|parent| NormalizedParent {
            key: text(Some(parent), "key"),
            id: text(Some(parent), "id"),
            summary: text(nested(Some(parent), "fields"), "summary"),
        }),
        labels: string_list(fields, "labels"),
        created: text(fields, "created"),
        updated: text(fields, "updated"),
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn nested<'a>(value: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    present(value.and_then(|v| v.get(key)))
}

fn text(value: Option<&Value>, key: &str) -> Option<String> {
    value
        .and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn string_list(value: Option<&Value>, key: &str) -> Vec<String> {
    value
        .and_then(|v| v.get(key))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

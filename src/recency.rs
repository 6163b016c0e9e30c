use chrono::{DateTime, Utc};

use crate::models::{MostRecentTicket, NormalizedIssue};

/// タイムスタンプが解釈できない場合に使う表示文字列
pub const UNKNOWN_TIME: &str = "unknown time";

/// 正規化済み課題の中から最も新しく更新されたものを選ぶ
///
/// 相対時刻の基準には呼び出し時点の時計を1回だけ読む。
pub fn most_recent(issues: &[NormalizedIssue]) -> Option<MostRecentTicket> {
    most_recent_at(issues, Utc::now())
}

/// `most_recent` のテスト用バリアント。基準時刻を注入できる。
///
/// `updated` はISO-8601文字列のまま辞書順で比較する。Jiraが同一サイト内で
/// 単一のタイムゾーン表記を返す間だけ正しい。同値の場合はレスポンス順で
/// 先に現れた課題を採用する。
pub fn most_recent_at(issues: &[NormalizedIssue], now: DateTime<Utc>) -> Option<MostRecentTicket> {
    let mut best: Option<&NormalizedIssue> = None;

    for issue in issues {
        match best {
            None => best = Some(issue),
            Some(current) => {
                let candidate = issue.updated.as_deref().unwrap_or("");
                let leader = current.updated.as_deref().unwrap_or("");
                // 厳密な大なり比較で先勝ちのタイブレークになる
                if candidate > leader {
                    best = Some(issue);
                }
            }
        }
    }

    best.map(|issue| MostRecentTicket {
        key: issue.key.clone(),
        summary: issue.summary.clone(),
        updated: issue.updated.clone(),
        updated_human: issue
            .updated
            .as_deref()
            .map(|timestamp| format_human_time(timestamp, now)),
    })
}

/// ISOタイムスタンプを「3 days ago」のような相対表現に変換する
///
/// 解釈できないタイムスタンプは集約全体を失敗させず "unknown time" に落とす。
pub fn format_human_time(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(updated) = parse_timestamp(timestamp) else {
        return UNKNOWN_TIME.to_string();
    };

    let diff = now - updated;
    let days = diff.num_days();

    if days > 0 {
        if days == 1 {
            "1 day ago".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else if days < 30 {
            let weeks = days / 7;
            format!("{} week{} ago", weeks, if weeks != 1 { "s" } else { "" })
        } else {
            let months = days / 30;
            format!("{} month{} ago", months, if months != 1 { "s" } else { "" })
        }
    } else {
        // 1日未満は日内の秒数で刻む
        let seconds = diff.num_seconds();
        if seconds > 3600 {
            let hours = seconds / 3600;
            format!("{} hour{} ago", hours, if hours != 1 { "s" } else { "" })
        } else if seconds > 60 {
            let minutes = seconds / 60;
            format!("{} minute{} ago", minutes, if minutes != 1 { "s" } else { "" })
        } else {
            "just now".to_string()
        }
    }
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    // Jira Cloudは "2024-01-02T03:04:05.000+0000" 形式（コロンなしオフセット）を
    // 返すことがあり、RFC 3339だけでは受けられない
    DateTime::parse_from_rfc3339(timestamp)
        .or_else(|_| DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

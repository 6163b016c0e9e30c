use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::themes::Colorization;
use tabled::settings::{Color, Style};

use crate::coordinator::{FilterResult, RefreshCycle};
use crate::error::Result;

/// バッチ出力のJSONドキュメントを組み立てる
///
/// 単一フィルターは従来互換の配列、複数フィルターはフィルターIDを
/// キーにしたマップになる。
pub fn to_json_document(cycle: &RefreshCycle) -> Result<String> {
    if cycle.results.len() > 1 {
        let mut grouped = serde_json::Map::new();
        for result in &cycle.results {
            grouped.insert(result.filter_id.clone(), serde_json::to_value(result)?);
        }
        Ok(serde_json::to_string(&Value::Object(grouped))?)
    } else {
        Ok(serde_json::to_string(&cycle.results)?)
    }
}

/// 人間向けのテーブル表示を標準出力へ描画する
pub fn print_pretty(cycle: &RefreshCycle) {
    println!("{}", "JIRA FILTER RESULTS".cyan().bold());

    for (index, entry) in cycle.results.iter().enumerate() {
        println!();
        let header = format!("[{}] {} (ID: {})", index + 1, entry.filter_name, entry.filter_id);
        println!("{}", header.as_str().magenta().bold());
        println!("{} {}", "JQL:".bold(), entry.jql);
        println!("{} {}", "Total:".bold(), entry.total_count);

        match &entry.most_recent_ticket {
            Some(ticket) => {
                println!(
                    "{} {} - {}",
                    "Most Recent:".bold(),
                    ticket.key.as_deref().unwrap_or(""),
                    ticket.summary.as_deref().unwrap_or("")
                );
                println!(
                    "{} {}",
                    "Last Updated:".bold(),
                    ticket.updated_human.as_deref().unwrap_or("unknown")
                );
            }
            None => println!("{} No tickets found", "Most Recent:".bold()),
        }

        if let Some(error) = &entry.error {
            println!("{} {}", "Error:".bold().red(), error);
        }

        if entry.issues.is_empty() {
            println!("(no issues)");
            continue;
        }

        println!("{}", issue_table(entry));
    }
}

fn issue_table(entry: &FilterResult) -> String {
    let mut builder = Builder::new();
    builder.push_record(["KEY", "SUMMARY", "STATUS", "ASSIGNEE", "PRIORITY", "UPDATED"]);

    for issue in &entry.issues {
        let status_name = issue.status.name.as_deref().unwrap_or("");
        let priority_name = issue.priority.as_deref().unwrap_or("");
        let assignee_name = issue
            .assignee
            .as_ref()
            .and_then(|a| a.display_name.clone().or_else(|| a.email_address.clone()))
            .unwrap_or_default();

        builder.push_record([
            truncate(issue.key.as_deref().unwrap_or(""), 12),
            truncate(issue.summary.as_deref().unwrap_or(""), 50),
            color_status(&truncate(status_name, 18)),
            truncate(&assignee_name, 22),
            color_priority(&truncate(priority_name, 10)),
            truncate(issue.updated.as_deref().unwrap_or(""), 20),
        ]);
    }

    let mut table = builder.build();
    table
        .with(Colorization::exact([Color::FG_CYAN], Rows::first()))
        .with(Style::rounded())
        .to_string()
}

/// セル値を改行除去のうえ最大長に切り詰める
fn truncate(text: &str, max_len: usize) -> String {
    let cleaned = text.replace('\n', " ").trim().to_string();
    if cleaned.chars().count() > max_len {
        let mut shortened: String = cleaned.chars().take(max_len.saturating_sub(1)).collect();
        shortened.push('…');
        shortened
    } else {
        cleaned
    }
}

fn color_status(name: &str) -> String {
    let lowered = name.to_lowercase();
    if ["done", "closed", "resolved"].iter().any(|k| lowered.contains(k)) {
        name.green().bold().to_string()
    } else if ["in progress", "in review", "qa", "testing"].iter().any(|k| lowered.contains(k)) {
        name.yellow().bold().to_string()
    } else if ["todo", "to do", "open", "backlog"].iter().any(|k| lowered.contains(k)) {
        name.blue().bold().to_string()
    } else if ["blocked", "failed", "error"].iter().any(|k| lowered.contains(k)) {
        name.red().bold().to_string()
    } else {
        name.to_string()
    }
}

fn color_priority(name: &str) -> String {
    let lowered = name.to_lowercase();
    if lowered.contains("highest") {
        name.red().bold().to_string()
    } else if lowered.contains("high") {
        name.red().to_string()
    } else if lowered.contains("medium") || lowered.contains("mid") {
        name.yellow().to_string()
    } else if lowered.contains("lowest") {
        name.blue().dimmed().to_string()
    } else if lowered.contains("low") {
        name.green().to_string()
    } else {
        name.to_string()
    }
}

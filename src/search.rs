use serde_json::Value;
use tracing::{debug, warn};

use crate::client::JiraClient;
use crate::error::{Error, Result};
use crate::models::SearchPage;

/// v3検索APIの1ページあたりの上限件数
pub const SERVER_PAGE_CAP: u32 = 1000;

/// 検索時に取得するフィールドセット
pub const SEARCH_FIELDS: [&str; 12] = [
    "summary",
    "status",
    "assignee",
    "priority",
    "issuetype",
    "updated",
    "created",
    "parent",
    "labels",
    "project",
    "components",
    "issuelinks",
];

/// 検索エンドポイントのバリアント
///
/// Jira Cloudはデプロイ時期によって使えるエンドポイントが異なるため、
/// 固定順のフォールバックとして順番に試す。各バリアントは1ページにつき
/// 最大1回しか試行しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEndpoint {
    /// `GET /rest/api/3/search`（互換性が最も広い旧来形）
    GetSearch,
    /// `POST /rest/api/3/search`
    PostSearch,
    /// `POST /rest/api/3/search/jql`（移行先の新エンドポイント）
    PostSearchJql,
}

impl SearchEndpoint {
    /// フォールバックの試行順序
    pub const FALLBACK_ORDER: [SearchEndpoint; 3] =
        [Self::GetSearch, Self::PostSearch, Self::PostSearchJql];

    fn describe(&self) -> &'static str {
        match self {
            Self::GetSearch => "GET /rest/api/3/search",
            Self::PostSearch => "POST /rest/api/3/search",
            Self::PostSearchJql => "POST /rest/api/3/search/jql",
        }
    }
}

/// JQL検索をページング付きで実行し、生の課題オブジェクトを収集する
#[derive(Debug, Clone)]
pub struct PaginatedSearchExecutor {
    client: JiraClient,
}

impl PaginatedSearchExecutor {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    /// `jql` を実行し、最大 `max_results` 件の生課題を返す
    ///
    /// 継続トークンが尽きるか、サーバーが最終ページを報告するか、
    /// 空ページが返るか、上限に達した時点で打ち切る。ページ途中で全
    /// エンドポイントが失敗した場合は収集済みの課題を破棄してエラーを返す。
    pub async fn search(&self, jql: &str, max_results: u32) -> Result<Vec<Value>> {
        let mut collected: Vec<Value> = Vec::new();
        let mut next_page_token: Option<String> = None;

        while (collected.len() as u32) < max_results {
            let remaining = max_results - collected.len() as u32;
            let page_size = remaining.min(SERVER_PAGE_CAP);

            let page = self
                .fetch_page(jql, page_size, next_page_token.as_deref())
                .await?;

            let page_was_empty = page.issues.is_empty();
            for issue in page.issues {
                if (collected.len() as u32) >= max_results {
                    break;
                }
                collected.push(issue);
            }

            debug!("page complete: {} issues collected", collected.len());

            // isLast欠落は最終ページ扱い（旧エンドポイントはトークンを返さない）
            if page.is_last.unwrap_or(true) || page_was_empty {
                break;
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => next_page_token = Some(token),
                _ => break,
            }
        }

        debug!("total issues fetched: {}", collected.len());
        Ok(collected)
    }

    /// 1ページ分をフォールバック順にエンドポイントを試しながら取得する
    async fn fetch_page(
        &self,
        jql: &str,
        page_size: u32,
        token: Option<&str>,
    ) -> Result<SearchPage> {
        let mut last_error: Option<Error> = None;

        for endpoint in SearchEndpoint::FALLBACK_ORDER {
            match self.request_page(endpoint, jql, page_size, token).await {
                Ok(page) => {
                    debug!("{} returned {} issues", endpoint.describe(), page.issues.len());
                    return Ok(page);
                }
                Err(err) => {
                    warn!("{} failed: {}; trying next endpoint", endpoint.describe(), err);
                    last_error = Some(err);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Unexpected("no search endpoint available".to_string())))
    }

    async fn request_page(
        &self,
        endpoint: SearchEndpoint,
        jql: &str,
        page_size: u32,
        token: Option<&str>,
    ) -> Result<SearchPage> {
        match endpoint {
            SearchEndpoint::GetSearch => {
                let mut query = vec![
                    ("jql".to_string(), jql.to_string()),
                    ("maxResults".to_string(), page_size.to_string()),
                    ("fields".to_string(), SEARCH_FIELDS.join(",")),
                ];
                if let Some(token) = token {
                    query.push(("nextPageToken".to_string(), token.to_string()));
                }
                self.client.get_with_query("/rest/api/3/search", &query).await
            }
            SearchEndpoint::PostSearch | SearchEndpoint::PostSearchJql => {
                let mut body = serde_json::json!({
                    "jql": jql,
                    "maxResults": page_size,
                    "fields": SEARCH_FIELDS,
                });
                if let Some(token) = token {
                    body["nextPageToken"] = token.into();
                }
                let path = match endpoint {
                    SearchEndpoint::PostSearch => "/rest/api/3/search",
                    _ => "/rest/api/3/search/jql",
                };
                self.client.post(path, &body).await
            }
        }
    }
}

use tracing::debug;

use crate::client::JiraClient;
use crate::error::{Error, Result};
use crate::models::QueryDefinition;

/// フィルターIDをサーバー保存の定義（名前とJQL）に解決する
///
/// リトライはしない。失敗はそのサイクルのそのフィルターだけを落とし、
/// 次のサイクルで自然に再試行される。
#[derive(Debug, Clone)]
pub struct FilterResolver {
    client: JiraClient,
}

impl FilterResolver {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    pub async fn resolve(&self, filter_id: &str) -> Result<QueryDefinition> {
        debug!(filter_id, "resolving filter definition");

        let endpoint = format!("/rest/api/3/filter/{}", filter_id);
        match self.client.get::<QueryDefinition>(&endpoint).await {
            Ok(definition) => Ok(definition),
            Err(Error::ApiError { status: 404, .. }) => {
                Err(Error::NotFound(format!("Filter not found: {}", filter_id)))
            }
            Err(err) => Err(err),
        }
    }
}

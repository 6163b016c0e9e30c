use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::JiraClient;
use crate::models::{FilterSpec, MostRecentTicket, NormalizedIssue};
use crate::normalize::normalize_issue;
use crate::recency;
use crate::resolver::FilterResolver;
use crate::search::PaginatedSearchExecutor;
use crate::sensor::FilterSensor;

/// リフレッシュサイクルの設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// フィルターごとの最大取得件数
    pub max_results: u32,
    /// 定期リフレッシュの間隔（分）
    pub interval_minutes: u32,
}

impl RefreshConfig {
    /// デフォルト設定で新しいRefreshConfigを作成
    pub fn new() -> Self {
        Self {
            max_results: 100,
            interval_minutes: 5,
        }
    }

    /// 最大取得件数を設定
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// リフレッシュ間隔を設定（分）
    pub fn interval_minutes(mut self, minutes: u32) -> Self {
        self.interval_minutes = minutes;
        self
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 1フィルター分の集約結果
///
/// `error` が設定されている場合、他のデータフィールドは必ず空になる。
/// シリアライズ時のキー名は下流互換のため固定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResult {
    pub filter_id: String,
    pub filter_name: String,
    pub jql: String,
    pub total_count: usize,
    pub issues: Vec<NormalizedIssue>,
    pub most_recent_ticket: Option<MostRecentTicket>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FilterResult {
    fn empty(
        filter_id: String,
        filter_name: String,
        jql: String,
        stamp: DateTime<Utc>,
        error: Option<String>,
    ) -> Self {
        Self {
            filter_id,
            filter_name,
            jql,
            total_count: 0,
            issues: Vec::new(),
            most_recent_ticket: None,
            last_updated: stamp,
            error,
        }
    }

    /// このフィルターの取得が失敗していたかどうか
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// 1回のリフレッシュで全フィルター分の結果をまとめたもの
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshCycle {
    /// サイクル開始時に1回だけ読んだ時刻。全FilterResultが同じ値を持つ
    pub refreshed_at: DateTime<Utc>,
    /// 要求したフィルターの順に並んだ結果
    pub results: Vec<FilterResult>,
}

impl RefreshCycle {
    pub fn get(&self, filter_id: &str) -> Option<&FilterResult> {
        self.results.iter().find(|result| result.filter_id == filter_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// フィルター解決から集約までを1サイクル分実行する内部ワーカー
#[derive(Clone)]
struct CycleRunner {
    resolver: FilterResolver,
    executor: PaginatedSearchExecutor,
    filters: Arc<Vec<FilterSpec>>,
    max_results: u32,
}

impl CycleRunner {
    async fn run_cycle(&self) -> RefreshCycle {
        let stamp = Utc::now();
        let mut results = Vec::with_capacity(self.filters.len());

        for spec in self.filters.iter() {
            let result = self.run_filter(spec, stamp).await;
            if let Some(error) = &result.error {
                warn!(filter_id = %spec.id, "filter refresh failed: {}", error);
            }
            results.push(result);
        }

        info!("refresh cycle complete: {} filters", results.len());
        RefreshCycle {
            refreshed_at: stamp,
            results,
        }
    }

    /// 1フィルター分の取得。失敗はエラー入りの結果に変換し、呼び出し側には返さない
    async fn run_filter(&self, spec: &FilterSpec, stamp: DateTime<Utc>) -> FilterResult {
        let definition = match self.resolver.resolve(&spec.id).await {
            Ok(definition) => definition,
            Err(err) => {
                return FilterResult::empty(
                    spec.id.clone(),
                    fallback_name(spec, None),
                    String::new(),
                    stamp,
                    Some(err.to_string()),
                );
            }
        };

        let name = fallback_name(spec, Some(&definition.name));

        // JQLが空のフィルターは検索を発行せず「データなし」として成功扱いにする
        if definition.jql.is_empty() {
            debug!(filter_id = %spec.id, "filter has no JQL; skipping search");
            return FilterResult::empty(spec.id.clone(), name, definition.jql, stamp, None);
        }

        let raw_issues = match self.executor.search(&definition.jql, self.max_results).await {
            Ok(raw_issues) => raw_issues,
            Err(err) => {
                return FilterResult::empty(
                    spec.id.clone(),
                    name,
                    definition.jql,
                    stamp,
                    Some(err.to_string()),
                );
            }
        };

        let issues: Vec<NormalizedIssue> = raw_issues.iter().map(normalize_issue).collect();
        let most_recent_ticket = recency::most_recent(&issues);

        FilterResult {
            filter_id: spec.id.clone(),
            filter_name: name,
            jql: definition.jql,
            total_count: issues.len(),
            issues,
            most_recent_ticket,
            last_updated: stamp,
            error: None,
        }
    }
}

/// 設定名 → サーバー側フィルター名 → "filter_{id}" の順で表示名を決める
fn fallback_name(spec: &FilterSpec, server_name: Option<&str>) -> String {
    if let Some(name) = &spec.display_name {
        if !name.is_empty() {
            return name.clone();
        }
    }
    if let Some(name) = server_name {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    format!("filter_{}", spec.id)
}

/// 設定されたフィルター群のリフレッシュサイクルを管理する
///
/// 単発実行（バッチ）と定期実行（常駐）の両方をサポートする。
/// 結果スナップショットはサイクル完了時にまるごと差し替えられ、
/// 読者が更新途中の状態を観測することはない。
pub struct AggregationCoordinator {
    runner: CycleRunner,
    interval: Duration,
    snapshot: Arc<RwLock<Option<RefreshCycle>>>,
    cycle_guard: Arc<Mutex<()>>,
    worker: StdMutex<Option<JoinHandle<()>>>,
}

impl AggregationCoordinator {
    pub fn new(client: JiraClient, filters: Vec<FilterSpec>, config: RefreshConfig) -> Self {
        let runner = CycleRunner {
            resolver: FilterResolver::new(client.clone()),
            executor: PaginatedSearchExecutor::new(client),
            filters: Arc::new(filters),
            max_results: config.max_results,
        };

        Self {
            runner,
            interval: Duration::from_secs(u64::from(config.interval_minutes) * 60),
            snapshot: Arc::new(RwLock::new(None)),
            cycle_guard: Arc::new(Mutex::new(())),
            worker: StdMutex::new(None),
        }
    }

    /// 1サイクルを即時実行し、スナップショットを更新して結果を返す
    ///
    /// 定期実行中のサイクルと重なった場合は先行サイクルの完了を待つ。
    pub async fn refresh_once(&self) -> RefreshCycle {
        let _guard = self.cycle_guard.lock().await;
        let cycle = self.runner.run_cycle().await;
        *self.snapshot.write().await = Some(cycle.clone());
        cycle
    }

    /// 定期スケジュールの外から手動リフレッシュを強制する
    pub async fn trigger_now(&self) -> RefreshCycle {
        info!("manual refresh triggered");
        self.refresh_once().await
    }

    /// 最後に完了したサイクルのスナップショットを返す
    pub async fn snapshot(&self) -> Option<RefreshCycle> {
        self.snapshot.read().await.clone()
    }

    /// 設定された間隔での定期リフレッシュを開始する
    ///
    /// 前のサイクルが進行中のtickは待たずにスキップする（コアレス動作）。
    pub fn start(&self) {
        let mut worker = self.worker.lock().expect("worker lock poisoned");
        if worker.is_some() {
            return;
        }

        let runner = self.runner.clone();
        let snapshot = Arc::clone(&self.snapshot);
        let cycle_guard = Arc::clone(&self.cycle_guard);
        let interval = self.interval;

        *worker = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Ok(_guard) = cycle_guard.try_lock() else {
                    warn!("previous refresh cycle still in flight; skipping tick");
                    continue;
                };
                let cycle = runner.run_cycle().await;
                *snapshot.write().await = Some(cycle);
            }
        }));
    }

    /// 定期リフレッシュを停止する。スナップショットは保持される
    pub fn stop(&self) {
        if let Some(handle) = self.worker.lock().expect("worker lock poisoned").take() {
            handle.abort();
        }
    }

    /// 定期リフレッシュが動作中かどうか
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .expect("worker lock poisoned")
            .is_some()
    }

    /// 設定済みフィルターごとの読み取りビューを作る
    pub fn sensors(&self) -> Vec<FilterSensor> {
        self.runner
            .filters
            .iter()
            .map(|spec| FilterSensor::new(Arc::clone(&self.snapshot), spec.clone()))
            .collect()
    }
}

impl Drop for AggregationCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

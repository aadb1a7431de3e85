//! Usage counters and the Prometheus rendering of them.
//!
//! Counters live in the key-value store so several server processes can
//! share them. Gauges are set from the counters on every scrape.

use std::sync::Arc;

use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};
use tasklane_models::counts::{self, Totals};

use crate::keyvalue::{KeyValue, KvResult};

const LIST_COUNT: &str = "tasklane_list_count";
const USER_COUNT: &str = "tasklane_user_count";
const NAMESPACE_COUNT: &str = "tasklane_namespace_count";
const TASK_COUNT: &str = "tasklane_task_count";
const TEAM_COUNT: &str = "tasklane_team_count";
const ACTIVE_USERS: &str = "tasklane_active_users";

/// Scored set of user ids, scored by when each was last seen (unix seconds).
pub const ACTIVE_USERS_KEY: &str = "activeusers";
/// Users seen within this many seconds count as active.
pub const ACTIVE_WINDOW_SECS: i64 = 30;

const GAUGES: [(&str, &str); 5] = [
    (counts::LIST_COUNT_KEY, LIST_COUNT),
    (counts::USER_COUNT_KEY, USER_COUNT),
    (counts::NAMESPACE_COUNT_KEY, NAMESPACE_COUNT),
    (counts::TASK_COUNT_KEY, TASK_COUNT),
    (counts::TEAM_COUNT_KEY, TEAM_COUNT),
];

#[derive(Clone)]
pub struct Metrics {
    kv: KeyValue,
    recorder: Arc<PrometheusRecorder>,
    enabled: bool,
}

impl Metrics {
    pub fn new(kv: KeyValue, enabled: bool) -> Self {
        Self {
            kv,
            recorder: Arc::new(PrometheusBuilder::new().build_recorder()),
            enabled,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Seed the counters from table totals.
    pub async fn init_counts(&self, totals: Totals) -> KvResult<()> {
        for (key, value) in totals.entries() {
            self.kv.put(key, &value.to_string()).await?;
        }
        tracing::info!(?totals, "metrics counters initialized");
        Ok(())
    }

    pub async fn incr(&self, key: &str) {
        self.adjust(key, 1).await;
    }

    pub async fn decr(&self, key: &str) {
        self.adjust(key, -1).await;
    }

    /// Shift a counter by `by`. Failures are logged; a broken counter never
    /// fails the request that caused it.
    pub async fn adjust(&self, key: &str, by: i64) {
        if !self.enabled || by == 0 {
            return;
        }
        let updated = if by < 0 {
            self.kv.decr_by(key, -by).await
        } else {
            self.kv.incr_by(key, by).await
        };
        if let Err(e) = updated {
            tracing::warn!("failed to update counter {key}: {e}");
        }
    }

    pub async fn count(&self, key: &str) -> KvResult<i64> {
        self.kv.get_count(key).await
    }

    /// Remember that `user_id` made a request at `now` (unix seconds).
    pub async fn record_active(&self, user_id: i64, now: i64) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.touch(user_id, now).await {
            tracing::warn!("failed to record active user {user_id}: {e}");
        }
    }

    async fn touch(&self, user_id: i64, now: i64) -> KvResult<()> {
        self.kv
            .set_score(ACTIVE_USERS_KEY, &user_id.to_string(), now)
            .await?;
        self.kv
            .remove_scores_below(ACTIVE_USERS_KEY, now - ACTIVE_WINDOW_SECS)
            .await
    }

    /// Number of users seen within the active window before `now`.
    pub async fn active_users(&self, now: i64) -> KvResult<i64> {
        self.kv
            .count_scores_from(ACTIVE_USERS_KEY, now - ACTIVE_WINDOW_SECS)
            .await
    }

    /// Prometheus text exposition of every gauge.
    pub async fn render(&self, now: i64) -> KvResult<String> {
        let mut values = Vec::with_capacity(GAUGES.len() + 1);
        for (key, name) in GAUGES {
            values.push((name, self.count(key).await?));
        }
        values.push((ACTIVE_USERS, self.active_users(now).await?));

        metrics::with_local_recorder(self.recorder.as_ref(), || {
            for (name, value) in values {
                gauge!(name).set(value as f64);
            }
        });
        Ok(self.recorder.handle().render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> Metrics {
        Metrics::new(KeyValue::memory(), true)
    }

    #[tokio::test]
    async fn counters_follow_totals_and_adjustments() {
        let m = metrics();
        m.init_counts(Totals {
            lists: 12,
            users: 7,
            namespaces: 8,
            tasks: 8,
            teams: 3,
        })
        .await
        .unwrap();

        m.incr(counts::LIST_COUNT_KEY).await;
        m.decr(counts::TASK_COUNT_KEY).await;
        m.adjust(counts::TASK_COUNT_KEY, -3).await;
        assert_eq!(m.count(counts::LIST_COUNT_KEY).await.unwrap(), 13);
        assert_eq!(m.count(counts::TASK_COUNT_KEY).await.unwrap(), 4);
        assert_eq!(m.count(counts::TEAM_COUNT_KEY).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn disabled_metrics_leave_counters_alone() {
        let m = Metrics::new(KeyValue::memory(), false);
        m.incr(counts::LIST_COUNT_KEY).await;
        m.record_active(1, 100).await;
        assert_eq!(m.count(counts::LIST_COUNT_KEY).await.unwrap(), 0);
        assert_eq!(m.active_users(100).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn active_users_expire_after_window() {
        let m = metrics();
        m.record_active(1, 1_000).await;
        m.record_active(2, 1_020).await;
        m.record_active(1, 1_025).await;
        assert_eq!(m.active_users(1_030).await.unwrap(), 2);
        assert_eq!(m.active_users(1_055).await.unwrap(), 1);
        assert_eq!(m.active_users(1_100).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_all_count_as_active() {
        let m = metrics();
        let handles: Vec<_> = (1..=50)
            .map(|user_id| {
                let m = m.clone();
                tokio::spawn(async move { m.record_active(user_id, 1_000).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(m.active_users(1_000).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn render_exposes_gauges() {
        let m = metrics();
        m.init_counts(Totals {
            lists: 2,
            users: 1,
            ..Totals::default()
        })
        .await
        .unwrap();
        m.record_active(1, 50).await;

        let text = m.render(60).await.unwrap();
        assert!(text.contains("tasklane_list_count 2"), "{text}");
        assert!(text.contains("tasklane_user_count 1"), "{text}");
        assert!(text.contains("tasklane_team_count 0"), "{text}");
        assert!(text.contains("tasklane_active_users 1"), "{text}");
    }
}

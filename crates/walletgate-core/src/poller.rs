//! Transaction queue status polling.
//!
//! Reads the status once immediately, then once per interval until the
//! status is accepted or failed by the caller's [`StatusPolicy`]. Statuses
//! outside both sets keep the wait going; there is no attempt cap. The first
//! terminal record ends the wait and is never re-read.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use walletgate_types::errors::WalletGateError;
use walletgate_types::model::*;
use walletgate_types::traits::ApprovalApi;

/// Default interval between status reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polls the status endpoint for one queue id per call.
///
/// Each call owns its loop, so concurrent waits on different queue ids are
/// independent.
pub struct TransactionStatusPoller {
    api: Arc<dyn ApprovalApi>,
    interval: Duration,
    max_wait: Option<Duration>,
}

impl TransactionStatusPoller {
    pub fn new(api: Arc<dyn ApprovalApi>, interval: Duration) -> Self {
        Self {
            api,
            interval,
            max_wait: None,
        }
    }

    /// Bound every wait by `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Wait until `queue_id` reaches a status in `policy.accept` or `policy.fail`.
    ///
    /// Pass `&StatusPolicy::default()` for the usual "at least broadcast" wait.
    pub async fn wait_for_status(
        &self,
        access_token: &str,
        queue_id: &QueueId,
        policy: &StatusPolicy,
    ) -> Result<TransactionStatusRecord, WalletGateError> {
        self.wait_for_status_with_cancel(access_token, queue_id, policy, &CancellationToken::new())
            .await
    }

    pub async fn wait_for_status_with_cancel(
        &self,
        access_token: &str,
        queue_id: &QueueId,
        policy: &StatusPolicy,
        cancel: &CancellationToken,
    ) -> Result<TransactionStatusRecord, WalletGateError> {
        let poll = self.poll_until_terminal(access_token, queue_id, policy, cancel);
        match self.max_wait {
            Some(limit) => tokio::time::timeout(limit, poll).await.map_err(|_| {
                WalletGateError::Timeout(format!(
                    "queue {queue_id} did not reach {} within {}s",
                    describe(&policy.accept),
                    limit.as_secs()
                ))
            })?,
            None => poll.await,
        }
    }

    async fn poll_until_terminal(
        &self,
        access_token: &str,
        queue_id: &QueueId,
        policy: &StatusPolicy,
        cancel: &CancellationToken,
    ) -> Result<TransactionStatusRecord, WalletGateError> {
        if let Some(record) = self.check(access_token, queue_id, policy).await? {
            return Ok(record);
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(WalletGateError::Cancelled(format!(
                        "status wait for queue {queue_id} cancelled"
                    )));
                }
                _ = ticker.tick() => {}
            }

            if let Some(record) = self.check(access_token, queue_id, policy).await? {
                return Ok(record);
            }
        }
    }

    /// One status read. `Ok(None)` means still pending.
    async fn check(
        &self,
        access_token: &str,
        queue_id: &QueueId,
        policy: &StatusPolicy,
    ) -> Result<Option<TransactionStatusRecord>, WalletGateError> {
        let record = self.api.get_tx_queue_status(access_token, queue_id).await?;
        match policy.classify(&record.status) {
            StatusClass::Accepted => {
                tracing::info!(queue_id = %queue_id, status = %record.status, "status accepted");
                Ok(Some(record))
            }
            StatusClass::Failed => {
                tracing::warn!(queue_id = %queue_id, status = %record.status, "status failed");
                Err(WalletGateError::TransactionFailed(Box::new(record)))
            }
            StatusClass::Pending => {
                tracing::debug!(queue_id = %queue_id, status = %record.status, "status pending");
                Ok(None)
            }
        }
    }
}

fn describe(statuses: &[TxStatus]) -> String {
    statuses
        .iter()
        .map(TxStatus::as_str)
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, MockApi};
    use std::sync::atomic::Ordering;

    fn poller(api: Arc<MockApi>) -> TransactionStatusPoller {
        TransactionStatusPoller::new(api, DEFAULT_POLL_INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_status_resolves_on_first_read() {
        for status in [TxStatus::Broadcasted, TxStatus::Success] {
            let api = Arc::new(MockApi::with_statuses(vec![record("Q1", status.clone())]));
            let start = Instant::now();

            let result = poller(api.clone())
                .wait_for_status("tok", &QueueId::from("Q1"), &StatusPolicy::default())
                .await
                .unwrap();

            assert_eq!(result.status, status);
            assert_eq!(api.status_calls.load(Ordering::SeqCst), 1);
            assert_eq!(start.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_statuses_poll_every_interval() {
        let api = Arc::new(MockApi::with_statuses(vec![
            record("Q1", TxStatus::Queued),
            record("Q1", TxStatus::Pending),
            record("Q1", TxStatus::Broadcasted),
        ]));
        let start = Instant::now();

        let result = poller(api.clone())
            .wait_for_status("tok", &QueueId::from("Q1"), &StatusPolicy::default())
            .await
            .unwrap();

        assert_eq!(result.status, TxStatus::Broadcasted);
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unclassified_statuses_poll_indefinitely() {
        // FAILED and REJECTED are pending under the default policy.
        let mut statuses = vec![record("Q1", TxStatus::Failed), record("Q1", TxStatus::Rejected)];
        statuses.extend((0..20).map(|_| record("Q1", TxStatus::Other("REVERTED".into()))));
        let api = Arc::new(MockApi::with_statuses(statuses));
        let p = poller(api.clone());
        let queue_id = QueueId::from("Q1");
        let policy = StatusPolicy::default();

        let outcome = tokio::time::timeout(
            Duration::from_millis(10_500),
            p.wait_for_status("tok", &queue_id, &policy),
        )
        .await;

        assert!(outcome.is_err(), "wait should still be pending");
        // One immediate read plus one per elapsed second.
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_set_fails_fast() {
        let api = Arc::new(MockApi::with_statuses(vec![
            record("Q1", TxStatus::Queued),
            record("Q1", TxStatus::Rejected),
            record("Q1", TxStatus::Success),
        ]));
        let policy = StatusPolicy::default().failing_on(vec![TxStatus::Rejected]);

        let err = poller(api.clone())
            .wait_for_status("tok", &QueueId::from("Q1"), &policy)
            .await
            .unwrap_err();

        match err {
            WalletGateError::TransactionFailed(rec) => assert_eq!(rec.status, TxStatus::Rejected),
            other => panic!("Expected TransactionFailed, got: {other:?}"),
        }
        // The terminal record ends the wait; SUCCESS is never read.
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finality_policy_skips_broadcasted() {
        let api = Arc::new(MockApi::with_statuses(vec![
            record("Q1", TxStatus::Broadcasted),
            record("Q1", TxStatus::Success).with_hash("0xabc"),
        ]));

        let result = poller(api.clone())
            .wait_for_status("tok", &QueueId::from("Q1"), &StatusPolicy::finality())
            .await
            .unwrap();

        assert_eq!(result.tx_hash.as_deref(), Some("0xabc"));
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_error_propagates_without_retry() {
        let api = Arc::new(MockApi::failing_status("upstream down"));

        let err = poller(api.clone())
            .wait_for_status("tok", &QueueId::from("Q1"), &StatusPolicy::default())
            .await
            .unwrap_err();

        assert_eq!(err.detail(), "upstream down");
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_times_out() {
        let api = Arc::new(MockApi::with_statuses(vec![]));
        let p = poller(api).with_max_wait(Duration::from_secs(5));

        let err = p
            .wait_for_status("tok", &QueueId::from("Q1"), &StatusPolicy::finality())
            .await
            .unwrap_err();
        match err {
            WalletGateError::Timeout(msg) => assert!(msg.contains("SUCCESS"), "got: {msg}"),
            other => panic!("Expected Timeout, got: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_polling() {
        let api = Arc::new(MockApi::with_statuses(vec![]));
        let p = poller(api.clone());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3_500)).await;
            trigger.cancel();
        });

        let err = p
            .wait_for_status_with_cancel("tok", &QueueId::from("Q1"), &StatusPolicy::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletGateError::Cancelled(_)));
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waits_are_independent() {
        let fast = Arc::new(MockApi::with_statuses(vec![record("A", TxStatus::Success)]));
        let slow = Arc::new(MockApi::with_statuses(vec![
            record("B", TxStatus::Queued),
            record("B", TxStatus::Queued),
            record("B", TxStatus::Success),
        ]));
        let pa = poller(fast.clone());
        let pb = poller(slow.clone());
        let (qa, qb) = (QueueId::from("A"), QueueId::from("B"));
        let policy = StatusPolicy::finality();

        let (a, b) = tokio::join!(
            pa.wait_for_status("tok", &qa, &policy),
            pb.wait_for_status("tok", &qb, &policy),
        );

        assert_eq!(a.unwrap().queue_id, qa);
        assert_eq!(b.unwrap().queue_id, qb);
        assert_eq!(fast.status_calls.load(Ordering::SeqCst), 1);
        assert_eq!(slow.status_calls.load(Ordering::SeqCst), 3);
    }
}

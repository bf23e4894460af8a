//! Mock collaborators shared by the core test modules.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use walletgate_channels::InMemorySignalingChannel;
use walletgate_types::errors::WalletGateError;
use walletgate_types::model::*;
use walletgate_types::traits::*;

// ================================================================
// Approval API
// ================================================================

pub(crate) struct MockApi {
    statuses: Mutex<VecDeque<TransactionStatusRecord>>,
    last_status: Mutex<Option<TransactionStatusRecord>>,
    status_error: Option<String>,
    approval_error: Option<String>,
    pub requests: Mutex<Vec<ApprovalRequest>>,
    pub tokens_seen: Mutex<Vec<String>>,
    pub create_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub queue_calls: AtomicUsize,
}

impl MockApi {
    /// Serves `statuses` in order, then repeats the last one. An empty script
    /// reports `PENDING` forever.
    pub fn with_statuses(statuses: Vec<TransactionStatusRecord>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            last_status: Mutex::new(None),
            status_error: None,
            approval_error: None,
            requests: Mutex::new(Vec::new()),
            tokens_seen: Mutex::new(Vec::new()),
            create_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            queue_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_create(message: &str) -> Self {
        let mut api = Self::with_statuses(vec![]);
        api.approval_error = Some(message.to_string());
        api
    }

    pub fn failing_status(message: &str) -> Self {
        let mut api = Self::with_statuses(vec![]);
        api.status_error = Some(message.to_string());
        api
    }

    pub fn total_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
            + self.queue_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ApprovalApi for MockApi {
    async fn create_approval(
        &self,
        access_token: &str,
        request: &ApprovalRequest,
    ) -> Result<ApprovalHandle, WalletGateError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(access_token.to_string());
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.approval_error {
            return Err(WalletGateError::provider(Some(400), message.clone()));
        }
        Ok(ApprovalHandle {
            approval_url: "https://wallet.example/approve/A1".to_string(),
            approval_id: "A1".to_string(),
        })
    }

    async fn create_tx_queue_approval(
        &self,
        access_token: &str,
        approval_token: &str,
    ) -> Result<QueueApproval, WalletGateError> {
        self.queue_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(access_token.to_string());
        Ok(QueueApproval {
            queue_id: QueueId::from(format!("Q-{approval_token}")),
        })
    }

    async fn get_tx_queue_status(
        &self,
        access_token: &str,
        queue_id: &QueueId,
    ) -> Result<TransactionStatusRecord, WalletGateError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(access_token.to_string());
        if let Some(message) = &self.status_error {
            return Err(WalletGateError::provider(Some(500), message.clone()));
        }
        let mut last = self.last_status.lock().unwrap();
        if let Some(next) = self.statuses.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        Ok(last
            .clone()
            .unwrap_or_else(|| TransactionStatusRecord::new(queue_id.clone(), TxStatus::Pending)))
    }
}

// ================================================================
// Approval surface
// ================================================================

pub(crate) struct MockSurface {
    signals: Arc<InMemorySignalingChannel>,
    on_navigate: Option<(SignalKey, String)>,
    fail_open: bool,
    user_closed: AtomicBool,
    pub opened: Mutex<Vec<String>>,
    pub navigated: Mutex<Vec<String>>,
    pub close_calls: AtomicUsize,
}

impl MockSurface {
    /// A surface that never reports anything on its own.
    pub fn silent(signals: Arc<InMemorySignalingChannel>) -> Self {
        Self {
            signals,
            on_navigate: None,
            fail_open: false,
            user_closed: AtomicBool::new(false),
            opened: Mutex::new(Vec::new()),
            navigated: Mutex::new(Vec::new()),
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Writes `key = value` into the signaling channel as soon as it is navigated.
    pub fn reporting(signals: Arc<InMemorySignalingChannel>, key: SignalKey, value: &str) -> Self {
        let mut surface = Self::silent(signals);
        surface.on_navigate = Some((key, value.to_string()));
        surface
    }

    pub fn unavailable(signals: Arc<InMemorySignalingChannel>) -> Self {
        let mut surface = Self::silent(signals);
        surface.fail_open = true;
        surface
    }

    /// Simulate the user closing the window.
    pub fn close_by_user(&self) {
        self.user_closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ApprovalSurface for MockSurface {
    async fn open(&self, url: &str) -> Result<SurfaceHandle, WalletGateError> {
        if self.fail_open {
            return Err(WalletGateError::SurfaceUnavailable(
                "popup blocked".to_string(),
            ));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(SurfaceHandle(1))
    }

    async fn navigate(&self, _handle: SurfaceHandle, url: &str) -> Result<(), WalletGateError> {
        self.navigated.lock().unwrap().push(url.to_string());
        if let Some((key, value)) = &self.on_navigate {
            self.signals.set(*key, value).await?;
        }
        Ok(())
    }

    async fn is_closed(&self, _handle: SurfaceHandle) -> bool {
        self.user_closed.load(Ordering::SeqCst)
    }

    async fn close(&self, _handle: SurfaceHandle) -> Result<(), WalletGateError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn record(queue_id: &str, status: TxStatus) -> TransactionStatusRecord {
    TransactionStatusRecord::new(QueueId::from(queue_id), status)
}

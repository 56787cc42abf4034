//! 转账状态迁移观察者
//!
//! 编排器在每次合法迁移后通知观察者，用于界面进度展示或审计。

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::TransferState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub transfer_id: Uuid,
    pub from: TransferState,
    pub to: TransferState,
    pub at: DateTime<Utc>,
}

pub trait TransferObserver: Send + Sync {
    fn on_transition(&self, event: &TransitionEvent);
}

/// 默认观察者：把迁移写成结构化日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TransferObserver for TracingObserver {
    fn on_transition(&self, event: &TransitionEvent) {
        tracing::debug!(
            transfer_id = %event.transfer_id,
            from = event.from.as_str(),
            to = event.to.as_str(),
            at = %event.at.to_rfc3339(),
            "transfer state changed"
        );
    }
}

/// 收集所有迁移事件，供调用方回放
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TransitionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TransitionEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// 仅返回目标状态序列
    pub fn states(&self) -> Vec<TransferState> {
        self.events().into_iter().map(|e| e.to).collect()
    }
}

impl TransferObserver for RecordingObserver {
    fn on_transition(&self, event: &TransitionEvent) {
        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, OnceLock},
};

use crate::error::TransferErrorCode;

static METRICS: OnceLock<Mutex<MetricsState>> = OnceLock::new();

#[derive(Default)]
struct MetricsState {
    transfers_started: u64,
    protected_requested: u64,
    direct_success: u64,
    fallback_entered: u64,
    envelopes_submitted: u64,
    // 信封字节数累计，用于估算平均大小
    envelope_bytes_sum: u64,
    failures: HashMap<&'static str, u64>,
}

fn state() -> MutexGuard<'static, MetricsState> {
    let lock = METRICS.get_or_init(|| Mutex::new(MetricsState::default()));
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(), // 避免因锁污染导致 panic
    }
}

pub fn count_transfer_started(protected: bool) {
    let mut s = state();
    s.transfers_started += 1;
    if protected {
        s.protected_requested += 1;
    }
}

pub fn count_direct_success() {
    state().direct_success += 1;
}

pub fn count_fallback_entered() {
    state().fallback_entered += 1;
}

pub fn count_envelope_submitted(envelope_len: usize) {
    let mut s = state();
    s.envelopes_submitted += 1;
    s.envelope_bytes_sum += envelope_len as u64;
}

pub fn count_failure(code: TransferErrorCode) {
    *state().failures.entry(code.as_str()).or_insert(0) += 1;
}

/// 计数快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub transfers_started: u64,
    pub direct_success: u64,
    pub fallback_entered: u64,
    pub envelopes_submitted: u64,
}

pub fn snapshot() -> MetricsSnapshot {
    let s = state();
    MetricsSnapshot {
        transfers_started: s.transfers_started,
        direct_success: s.direct_success,
        fallback_entered: s.fallback_entered,
        envelopes_submitted: s.envelopes_submitted,
    }
}

pub fn render_prometheus() -> String {
    let s = state();
    let mut out = String::new();
    out.push_str("# HELP antimev_transfers_total Transfers submitted\n");
    out.push_str("# TYPE antimev_transfers_total counter\n");
    out.push_str(&format!("antimev_transfers_total {}\n", s.transfers_started));
    out.push_str(&format!(
        "antimev_transfers_total{{mode=\"protected\"}} {}\n",
        s.protected_requested
    ));

    out.push_str("# HELP antimev_direct_success_total Transfers settled by the direct send\n");
    out.push_str("# TYPE antimev_direct_success_total counter\n");
    out.push_str(&format!("antimev_direct_success_total {}\n", s.direct_success));

    out.push_str("# HELP antimev_fallback_total Transfers that entered the encrypted fallback\n");
    out.push_str("# TYPE antimev_fallback_total counter\n");
    out.push_str(&format!("antimev_fallback_total {}\n", s.fallback_entered));

    out.push_str("# HELP antimev_envelopes_total Envelopes submitted\n");
    out.push_str("# TYPE antimev_envelopes_total counter\n");
    out.push_str(&format!("antimev_envelopes_total {}\n", s.envelopes_submitted));

    out.push_str("# HELP antimev_envelope_bytes_sum Sum of submitted envelope sizes\n");
    out.push_str("# TYPE antimev_envelope_bytes_sum counter\n");
    out.push_str(&format!("antimev_envelope_bytes_sum {}\n", s.envelope_bytes_sum));

    out.push_str("# HELP antimev_failures_total Failed transfers per error code\n");
    out.push_str("# TYPE antimev_failures_total counter\n");
    let mut failures: Vec<_> = s.failures.iter().collect();
    failures.sort();
    for (code, v) in failures {
        out.push_str(&format!(
            "antimev_failures_total{{code=\"{}\"}} {}\n",
            code, v
        ));
    }

    out
}

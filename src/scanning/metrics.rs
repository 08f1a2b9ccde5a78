//! Scan metrics
//!
//! Process-lifetime counters for both scan paths. The store is an explicit
//! object shared behind an `Arc`; the counters that feed the running
//! average are updated together under one lock.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::error::{ErrorKind, ScanError};
use crate::types::ScanType;

/// Latency histogram with fixed buckets (microseconds)
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<u64>,
    counts: Vec<AtomicU64>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    /// Buckets sized for whole scans: 50ms up to 60s
    pub fn new_scan_latency() -> Self {
        let buckets = vec![
            50_000, 100_000, 250_000, 500_000, 1_000_000, 2_500_000, 5_000_000, 10_000_000,
            30_000_000, 60_000_000,
        ];
        let counts = buckets.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            buckets,
            counts,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.sum.fetch_add(micros, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        if let Some(i) = self.buckets.iter().position(|&boundary| micros <= boundary) {
            self.counts[i].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean_ms(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        self.sum.load(Ordering::Relaxed) as f64 / count as f64 / 1000.0
    }

    fn reset(&self) {
        for c in &self.counts {
            c.store(0, Ordering::Relaxed);
        }
        self.sum.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new_scan_latency()
    }
}

/// Failed scans by error kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBreakdown {
    pub validation: u64,
    pub timeout: u64,
    pub network: u64,
    pub credential: u64,
    pub quota: u64,
    pub parsing: u64,
    pub unknown: u64,
}

impl ErrorBreakdown {
    fn slot(&mut self, kind: ErrorKind) -> &mut u64 {
        match kind {
            ErrorKind::Validation => &mut self.validation,
            ErrorKind::Timeout => &mut self.timeout,
            ErrorKind::Network => &mut self.network,
            ErrorKind::Credential => &mut self.credential,
            ErrorKind::Quota => &mut self.quota,
            ErrorKind::Parsing => &mut self.parsing,
            ErrorKind::Unknown => &mut self.unknown,
        }
    }

    pub fn get(&self, kind: ErrorKind) -> u64 {
        match kind {
            ErrorKind::Validation => self.validation,
            ErrorKind::Timeout => self.timeout,
            ErrorKind::Network => self.network,
            ErrorKind::Credential => self.credential,
            ErrorKind::Quota => self.quota,
            ErrorKind::Parsing => self.parsing,
            ErrorKind::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> u64 {
        self.validation
            + self.timeout
            + self.network
            + self.credential
            + self.quota
            + self.parsing
            + self.unknown
    }
}

/// Scan counts per strategy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScansByType {
    pub standard: u64,
    pub ai: u64,
}

impl ScansByType {
    fn slot(&mut self, scan_type: ScanType) -> &mut u64 {
        match scan_type {
            ScanType::Standard => &mut self.standard,
            ScanType::Ai => &mut self.ai,
        }
    }
}

#[derive(Debug, Default)]
struct MetricsState {
    total_scans: u64,
    successful_scans: u64,
    failed_scans: u64,
    scans_by_type: ScansByType,
    total_files_found: u64,
    errors: ErrorBreakdown,
    last_success_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
}

/// Shared scan metrics store
#[derive(Debug, Default)]
pub struct ScanMetrics {
    state: Mutex<MetricsState>,
    latency: Histogram,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shareable metrics instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Record a completed scan and the number of files it returned
    pub fn record_success(&self, scan_type: ScanType, files_found: usize, elapsed: Duration) {
        {
            let mut state = self.state.lock();
            state.total_scans += 1;
            state.successful_scans += 1;
            *state.scans_by_type.slot(scan_type) += 1;
            state.total_files_found += files_found as u64;
            state.last_success_at = Some(Utc::now());
        }
        self.latency.observe(elapsed);
    }

    /// Record a failed scan under the error's kind
    pub fn record_failure(&self, scan_type: ScanType, error: &ScanError, elapsed: Duration) {
        {
            let mut state = self.state.lock();
            state.total_scans += 1;
            state.failed_scans += 1;
            *state.scans_by_type.slot(scan_type) += 1;
            *state.errors.slot(error.kind()) += 1;
            state.last_failure_at = Some(Utc::now());
        }
        self.latency.observe(elapsed);
    }

    /// Clear every counter
    pub fn reset(&self) {
        *self.state.lock() = MetricsState::default();
        self.latency.reset();
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.lock();
        let average_files_per_scan = if state.successful_scans == 0 {
            0.0
        } else {
            state.total_files_found as f64 / state.successful_scans as f64
        };

        MetricsSnapshot {
            total_scans: state.total_scans,
            successful_scans: state.successful_scans,
            failed_scans: state.failed_scans,
            scans_by_type: state.scans_by_type.clone(),
            total_files_found: state.total_files_found,
            average_files_per_scan,
            errors: state.errors.clone(),
            last_success_at: state.last_success_at,
            last_failure_at: state.last_failure_at,
            mean_latency_ms: self.latency.mean_ms(),
        }
    }

    /// Export in Prometheus exposition format
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = String::with_capacity(2048);

        write_counter(&mut out, "fileharvest_scans_total", "Total number of scans", snapshot.total_scans);
        write_counter(&mut out, "fileharvest_scans_successful_total", "Scans that returned results", snapshot.successful_scans);
        write_counter(&mut out, "fileharvest_scans_failed_total", "Scans that ended in an error", snapshot.failed_scans);

        let _ = writeln!(out, "# HELP fileharvest_scans_by_type_total Scans by strategy");
        let _ = writeln!(out, "# TYPE fileharvest_scans_by_type_total counter");
        let _ = writeln!(out, "fileharvest_scans_by_type_total{{type=\"standard\"}} {}", snapshot.scans_by_type.standard);
        let _ = writeln!(out, "fileharvest_scans_by_type_total{{type=\"ai\"}} {}", snapshot.scans_by_type.ai);
        let _ = writeln!(out);

        write_counter(&mut out, "fileharvest_files_found_total", "Files returned across successful scans", snapshot.total_files_found);

        let _ = writeln!(out, "# HELP fileharvest_scan_errors_total Failed scans by error kind");
        let _ = writeln!(out, "# TYPE fileharvest_scan_errors_total counter");
        for kind in [
            ErrorKind::Validation,
            ErrorKind::Timeout,
            ErrorKind::Network,
            ErrorKind::Credential,
            ErrorKind::Quota,
            ErrorKind::Parsing,
            ErrorKind::Unknown,
        ] {
            let _ = writeln!(
                out,
                "fileharvest_scan_errors_total{{kind=\"{}\"}} {}",
                kind,
                snapshot.errors.get(kind)
            );
        }
        let _ = writeln!(out);

        write_histogram(&mut out, "fileharvest_scan_latency_seconds", "Scan latency in seconds", &self.latency);

        out
    }
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} counter", name);
    let _ = writeln!(out, "{} {}", name, value);
    let _ = writeln!(out);
}

fn write_histogram(out: &mut String, name: &str, help: &str, hist: &Histogram) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} histogram", name);

    // le buckets are cumulative
    let mut cumulative = 0u64;
    for (boundary, count) in hist.buckets.iter().zip(&hist.counts) {
        cumulative += count.load(Ordering::Relaxed);
        let _ = writeln!(
            out,
            "{}_bucket{{le=\"{:.3}\"}} {}",
            name,
            *boundary as f64 / 1_000_000.0,
            cumulative
        );
    }
    let total = hist.count();
    let _ = writeln!(out, "{}_bucket{{le=\"+Inf\"}} {}", name, total);
    let _ = writeln!(
        out,
        "{}_sum {:.6}",
        name,
        hist.sum.load(Ordering::Relaxed) as f64 / 1_000_000.0
    );
    let _ = writeln!(out, "{}_count {}", name, total);
    let _ = writeln!(out);
}

/// Point-in-time view of the metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_scans: u64,
    pub successful_scans: u64,
    pub failed_scans: u64,
    pub scans_by_type: ScansByType,
    pub total_files_found: u64,
    /// Mean files per successful scan
    pub average_files_per_scan: f64,
    pub errors: ErrorBreakdown,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub mean_latency_ms: f64,
}

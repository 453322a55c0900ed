use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// One pipeline stage as seen by the monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSample {
    pub stage: String,
    /// Time spent since the previous stage ended.
    pub duration: Duration,
    pub memory_mb: u64,
    pub memory_delta_mb: i64,
}

/// Totals over every recorded stage of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub total: Duration,
    pub stages: usize,
    pub slowest_stage: String,
    pub peak_memory_mb: u64,
    /// Stage whose memory grew the most, if any grew at all.
    pub largest_growth: Option<(String, i64)>,
}

/// Records how long each stage of an upload takes and how much the resident
/// set grows while it runs. The whole table lives in memory, so ingestion is
/// usually where the growth shows.
pub struct StageMonitor {
    enabled: bool,
    started: Instant,
    last_mark: Instant,
    baseline_mb: u64,
    samples: Vec<StageSample>,
    #[cfg(feature = "cli")]
    memory: Option<(System, Pid)>,
}

impl StageMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        let mut monitor = Self {
            enabled,
            started: now,
            last_mark: now,
            baseline_mb: 0,
            samples: Vec::new(),
            #[cfg(feature = "cli")]
            memory: enabled
                .then(sysinfo::get_current_pid)
                .and_then(|pid| pid.ok())
                .map(|pid| (System::new(), pid)),
        };
        monitor.baseline_mb = monitor.resident_mb();
        monitor
    }

    /// Starts a new run, dropping samples of the previous one.
    pub fn begin(&mut self) {
        if !self.enabled {
            return;
        }
        self.samples.clear();
        self.started = Instant::now();
        self.last_mark = self.started;
        self.baseline_mb = self.resident_mb();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn samples(&self) -> &[StageSample] {
        &self.samples
    }

    #[cfg(feature = "cli")]
    fn resident_mb(&mut self) -> u64 {
        let Some((system, pid)) = self.memory.as_mut() else {
            return 0;
        };
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[*pid]),
            false,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system
            .process(*pid)
            .map(|p| p.memory() / 1024 / 1024)
            .unwrap_or(0)
    }

    #[cfg(not(feature = "cli"))]
    fn resident_mb(&mut self) -> u64 {
        0
    }

    /// Closes the current stage and logs it.
    pub fn record(&mut self, stage: &str) {
        if !self.enabled {
            return;
        }
        let memory_mb = self.resident_mb();
        let now = Instant::now();
        let sample = self.push_sample(stage, now, memory_mb);
        tracing::info!(
            stage = %sample.stage,
            duration = ?sample.duration,
            memory_mb = sample.memory_mb,
            memory_delta_mb = sample.memory_delta_mb,
            "Stage finished"
        );
    }

    fn push_sample(&mut self, stage: &str, now: Instant, memory_mb: u64) -> &StageSample {
        let previous_mb = self
            .samples
            .last()
            .map(|s| s.memory_mb)
            .unwrap_or(self.baseline_mb);
        self.samples.push(StageSample {
            stage: stage.to_string(),
            duration: now.saturating_duration_since(self.last_mark),
            memory_mb,
            memory_delta_mb: memory_mb as i64 - previous_mb as i64,
        });
        self.last_mark = now;
        &self.samples[self.samples.len() - 1]
    }

    pub fn summary(&self) -> Option<StageSummary> {
        let slowest = self.samples.iter().max_by_key(|s| s.duration)?;
        let largest_growth = self
            .samples
            .iter()
            .filter(|s| s.memory_delta_mb > 0)
            .max_by_key(|s| s.memory_delta_mb)
            .map(|s| (s.stage.clone(), s.memory_delta_mb));

        Some(StageSummary {
            total: self.last_mark.saturating_duration_since(self.started),
            stages: self.samples.len(),
            slowest_stage: slowest.stage.clone(),
            peak_memory_mb: self
                .samples
                .iter()
                .map(|s| s.memory_mb)
                .max()
                .unwrap_or(self.baseline_mb)
                .max(self.baseline_mb),
            largest_growth,
        })
    }

    /// Logs the run summary; silent when disabled or nothing was recorded.
    pub fn log_summary(&self) {
        if let Some(summary) = self.summary() {
            tracing::info!(
                total = ?summary.total,
                stages = summary.stages,
                slowest = %summary.slowest_stage,
                peak_mb = summary.peak_memory_mb,
                growth = ?summary.largest_growth,
                "Pipeline finished"
            );
        }
    }
}

impl Default for StageMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor_at(baseline_mb: u64) -> StageMonitor {
        let mut monitor = StageMonitor::new(false);
        monitor.enabled = true;
        monitor.baseline_mb = baseline_mb;
        monitor
    }

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let mut monitor = StageMonitor::new(false);
        monitor.record("ingest");
        assert!(!monitor.is_enabled());
        assert!(monitor.samples().is_empty());
        assert!(monitor.summary().is_none());
    }

    #[test]
    fn test_samples_carry_deltas_from_previous_stage() {
        let mut monitor = monitor_at(40);
        let start = monitor.started;
        monitor.push_sample("ingest", start + Duration::from_millis(30), 70);
        monitor.push_sample("profile", start + Duration::from_millis(35), 68);

        let samples = monitor.samples();
        assert_eq!(samples[0].duration, Duration::from_millis(30));
        assert_eq!(samples[0].memory_delta_mb, 30);
        assert_eq!(samples[1].duration, Duration::from_millis(5));
        assert_eq!(samples[1].memory_delta_mb, -2);
    }

    #[test]
    fn test_summary_names_slowest_and_growth() {
        let mut monitor = monitor_at(40);
        let start = monitor.started;
        monitor.push_sample("ingest", start + Duration::from_millis(10), 90);
        monitor.push_sample("analyze", start + Duration::from_millis(60), 95);
        monitor.push_sample("export", start + Duration::from_millis(70), 80);

        let summary = monitor.summary().unwrap();
        assert_eq!(summary.stages, 3);
        assert_eq!(summary.total, Duration::from_millis(70));
        assert_eq!(summary.slowest_stage, "analyze");
        assert_eq!(summary.peak_memory_mb, 95);
        assert_eq!(summary.largest_growth, Some(("ingest".to_string(), 50)));
    }

    #[test]
    fn test_no_growth_when_memory_only_shrinks() {
        let mut monitor = monitor_at(100);
        let start = monitor.started;
        monitor.push_sample("export", start + Duration::from_millis(1), 90);

        let summary = monitor.summary().unwrap();
        assert_eq!(summary.largest_growth, None);
        assert_eq!(summary.peak_memory_mb, 100);
    }
}

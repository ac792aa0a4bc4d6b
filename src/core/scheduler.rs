use crate::config::toml_config::ScannerConfig;
use crate::domain::model::ScanOutcome;
use crate::utils::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// 連續模式：立即掃描一次，之後每個間隔再掃描，直到收到停止訊號
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    error_backoff: Duration,
    max_runs: Option<usize>,
}

impl Scheduler {
    pub fn new(interval: Duration, error_backoff: Duration) -> Self {
        Self {
            interval,
            error_backoff,
            max_runs: None,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.scan_interval(), config.error_backoff())
    }

    pub fn with_max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = Some(max_runs);
        self
    }

    /// 回傳實際執行的掃描次數
    pub async fn run<J, Fut, S>(&self, mut job: J, shutdown: S) -> usize
    where
        J: FnMut() -> Fut,
        Fut: Future<Output = Result<ScanOutcome>>,
        S: Future<Output = ()>,
    {
        tracing::info!("🚀 Starting continuous mode (every {:?})", self.interval);

        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut runs = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            runs += 1;
            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                outcome = job() => outcome,
            };

            match outcome {
                Ok(ScanOutcome::NoData) => tracing::warn!("Scan #{} returned no data", runs),
                Ok(_) => tracing::debug!("Scan #{} finished", runs),
                Err(e) => {
                    tracing::error!("Scan #{} failed: {} (retrying after {:?})", runs, e, self.error_backoff);
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(self.error_backoff) => {}
                    }
                }
            }

            if self.max_runs.is_some_and(|max| runs >= max) {
                break;
            }
        }

        tracing::info!("🛑 Scanner stopped after {} scans", runs);
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ScanError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_runs_immediately_then_on_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler =
            Scheduler::new(Duration::from_millis(20), Duration::from_millis(5)).with_max_runs(3);

        let started = tokio::time::Instant::now();
        let runs = scheduler
            .run(
                || {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(ScanOutcome::NoData)
                    }
                },
                std::future::pending(),
            )
            .await;

        assert_eq!(runs, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        // 第一次立即執行，之後等待兩個間隔
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_failed_scan_does_not_stop_the_loop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler =
            Scheduler::new(Duration::from_millis(5), Duration::from_millis(5)).with_max_runs(2);

        let runs = scheduler
            .run(
                || {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(ScanError::ProcessingError {
                            message: "boom".to_string(),
                        })
                    }
                },
                std::future::pending(),
            )
            .await;

        assert_eq!(runs, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_before_next_scan() {
        let scheduler = Scheduler::new(Duration::from_secs(3600), Duration::from_secs(300));

        let runs = scheduler
            .run(
                || async { Ok(ScanOutcome::NoData) },
                tokio::time::sleep(Duration::from_millis(50)),
            )
            .await;

        assert_eq!(runs, 1);
    }

    #[tokio::test]
    async fn test_ready_shutdown_skips_every_scan() {
        let scheduler = Scheduler::new(Duration::from_millis(5), Duration::from_millis(5));
        let runs = scheduler
            .run(|| async { Ok(ScanOutcome::NoData) }, std::future::ready(()))
            .await;
        assert_eq!(runs, 0);
    }
}

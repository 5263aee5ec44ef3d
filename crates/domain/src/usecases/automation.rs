//! Automation controller - start/stop/status/execute for scheduled generation

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::{
    model::{
        AutomationStatus, GenerationReport, IntervalMinutes, InvalidInterval, RuntimeSnapshot,
        StatusPatch, TriggerOutcome, TriggerSource,
    },
    policy::{DraftPolicy, PolicyViolation},
    ports::{
        Clock, ContentGenerator, GenerateError, PostRepository, RepositoryError, StatusError,
        StatusStore,
    },
    usecases::generate::{GenerateUseCase, GenerateUseCaseError},
};

/// Configuration for the automation controller
#[derive(Debug, Clone)]
pub struct AutomationConfig {
    /// Persisted lease taken around each generation (None = busy flag only)
    pub lease: Option<LeaseConfig>,
    /// Consecutive failures after which every failure is logged as an alert
    pub failure_alert_threshold: u32,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            lease: None,
            failure_alert_threshold: 3,
        }
    }
}

/// Cross-process generation lease
#[derive(Debug, Clone)]
pub struct LeaseConfig {
    /// Identity of this process
    pub holder: String,
    /// How long a lease stays valid if never released
    pub ttl: Duration,
}

/// Errors from the automation controller
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error(transparent)]
    InvalidInterval(#[from] InvalidInterval),
    #[error("A generation is already in progress")]
    Busy,
    #[error("Generation lease is held by another process")]
    LeaseHeld,
    #[error("Status store error: {0}")]
    Status(#[from] StatusError),
    #[error("Content generation failed: {0}")]
    Generation(GenerateError),
    #[error("Generated draft rejected: {0}")]
    InvalidDraft(PolicyViolation),
    #[error("Failed to save post: {0}")]
    Persistence(RepositoryError),
    #[error("Generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<GenerateUseCaseError> for AutomationError {
    fn from(err: GenerateUseCaseError) -> Self {
        match err {
            GenerateUseCaseError::Generation(e) => Self::Generation(e),
            GenerateUseCaseError::InvalidDraft(e) => Self::InvalidDraft(e),
            GenerateUseCaseError::Persistence(e) => Self::Persistence(e),
        }
    }
}

/// Coordinator for scheduled post generation.
///
/// Create one per process and hand clones to every trigger source. Clones
/// share the timer handle and the busy flag.
pub struct AutomationController<St, G, R, Cl>
where
    St: StatusStore + ?Sized,
    G: ContentGenerator + ?Sized,
    R: PostRepository + ?Sized,
    Cl: Clock + ?Sized,
{
    inner: Arc<Inner<St, G, R, Cl>>,
}

struct Inner<St: ?Sized, G: ?Sized, R: ?Sized, Cl: ?Sized> {
    status_store: Arc<St>,
    generator: Arc<G>,
    repository: Arc<R>,
    clock: Arc<Cl>,
    policy: DraftPolicy,
    config: AutomationConfig,
    timer: Mutex<Option<JoinHandle<()>>>,
    busy: Arc<AtomicBool>,
    consecutive_failures: AtomicU32,
}

impl<St, G, R, Cl> Clone for AutomationController<St, G, R, Cl>
where
    St: StatusStore + ?Sized,
    G: ContentGenerator + ?Sized,
    R: PostRepository + ?Sized,
    Cl: Clock + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<St, G, R, Cl> AutomationController<St, G, R, Cl>
where
    St: StatusStore + ?Sized + 'static,
    G: ContentGenerator + ?Sized + 'static,
    R: PostRepository + ?Sized + 'static,
    Cl: Clock + ?Sized + 'static,
{
    pub fn new(
        status_store: Arc<St>,
        generator: Arc<G>,
        repository: Arc<R>,
        clock: Arc<Cl>,
        policy: DraftPolicy,
        config: AutomationConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                status_store,
                generator,
                repository,
                clock,
                policy,
                config,
                timer: Mutex::new(None),
                busy: Arc::new(AtomicBool::new(false)),
                consecutive_failures: AtomicU32::new(0),
            }),
        }
    }

    /// Persist `is_running = true` and (re-)arm the in-process timer.
    ///
    /// Does not generate immediately; the first tick fires after one interval.
    pub async fn start(
        &self,
        interval: Option<IntervalMinutes>,
    ) -> Result<AutomationStatus, AutomationError> {
        let interval = interval.unwrap_or_default();
        let status = self
            .inner
            .status_store
            .apply(&StatusPatch::started(interval))
            .await?;

        self.arm_timer(interval);

        tracing::info!(interval_minutes = interval.get(), "Automation started");
        Ok(status)
    }

    /// Persist `is_running = false` and cancel the timer. Idempotent.
    ///
    /// A generation already in flight is allowed to finish.
    pub async fn stop(&self) -> Result<AutomationStatus, AutomationError> {
        let status = self
            .inner
            .status_store
            .apply(&StatusPatch::stopped())
            .await?;

        let was_armed = self.disarm_timer();
        tracing::info!(timer_cancelled = was_armed, "Automation stopped");
        Ok(status)
    }

    /// Read the persisted status record
    pub async fn status(&self) -> Result<AutomationStatus, AutomationError> {
        Ok(self.inner.status_store.load_or_default().await?)
    }

    /// Arm the timer from the persisted record after a restart.
    ///
    /// Returns the interval if a timer was armed.
    pub async fn resume(&self) -> Result<Option<IntervalMinutes>, AutomationError> {
        let status = self.status().await?;
        if !status.is_running || self.runtime().timer_armed {
            return Ok(None);
        }

        self.arm_timer(status.interval_minutes);
        tracing::info!(
            interval_minutes = status.interval_minutes.get(),
            "Automation resumed from persisted state"
        );
        Ok(Some(status.interval_minutes))
    }

    /// Cancel the timer without touching the persisted record
    pub fn shutdown(&self) {
        if self.disarm_timer() {
            tracing::debug!("Automation timer cancelled for shutdown");
        }
    }

    pub fn runtime(&self) -> RuntimeSnapshot {
        let timer_armed = self
            .timer_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());

        RuntimeSnapshot {
            timer_armed,
            generating: self.inner.busy.load(Ordering::SeqCst),
            consecutive_failures: self.inner.consecutive_failures.load(Ordering::SeqCst),
        }
    }

    /// Trigger entry point: generate only if the persisted status is running
    pub async fn run_if_enabled(
        &self,
        source: TriggerSource,
    ) -> Result<TriggerOutcome, AutomationError> {
        let status = self.status().await?;
        if !status.is_running {
            tracing::debug!(source = %source, "Automation stopped, skipping generation");
            return Ok(TriggerOutcome::Disabled);
        }

        let report = self.execute_generation(source).await?;
        Ok(TriggerOutcome::Generated(Box::new(report)))
    }

    /// Generate and persist one post, then bump the status counters.
    ///
    /// Only one generation runs at a time per process; an overlapping call
    /// fails fast with [`AutomationError::Busy`]. The work runs in its own
    /// task, so dropping the returned future (a client hanging up) does not
    /// stop a generation that has started: the post is still counted and the
    /// lease still released.
    pub async fn execute_generation(
        &self,
        source: TriggerSource,
    ) -> Result<GenerationReport, AutomationError> {
        let Some(busy) = BusyGuard::acquire(&self.inner.busy) else {
            tracing::info!(source = %source, "Generation already in progress, rejecting trigger");
            return Err(AutomationError::Busy);
        };

        let controller = self.clone();
        let task = tokio::spawn(async move {
            let result = controller.generate_and_record(source).await;
            drop(busy);
            result
        });

        task.await?
    }

    async fn generate_and_record(
        &self,
        source: TriggerSource,
    ) -> Result<GenerationReport, AutomationError> {
        let lease_holder = self.acquire_lease(source).await?;

        tracing::info!(source = %source, "Starting post generation");

        let result = GenerateUseCase::new(
            self.inner.generator.as_ref(),
            self.inner.repository.as_ref(),
            &self.inner.policy,
        )
        .run()
        .await;

        if let Some(holder) = lease_holder {
            if let Err(e) = self.inner.status_store.release_lease(holder).await {
                tracing::warn!(error = %e, "Failed to release generation lease");
            }
        }

        match result {
            Ok(report) => {
                self.inner.consecutive_failures.store(0, Ordering::SeqCst);
                self.record_generation(&report).await;

                tracing::info!(
                    source = %source,
                    post_id = %report.post.id,
                    title = %report.post.title,
                    taxonomy_failures = report.taxonomy_failures.len(),
                    "Post generated"
                );
                Ok(report)
            }
            Err(e) => {
                let failures = self
                    .inner
                    .consecutive_failures
                    .fetch_add(1, Ordering::SeqCst)
                    .saturating_add(1);

                if failures >= self.inner.config.failure_alert_threshold {
                    tracing::error!(
                        source = %source,
                        consecutive_failures = failures,
                        error = %e,
                        "Post generation keeps failing"
                    );
                } else {
                    tracing::error!(source = %source, error = %e, "Post generation failed");
                }
                Err(e.into())
            }
        }
    }

    async fn acquire_lease(&self, source: TriggerSource) -> Result<Option<&str>, AutomationError> {
        let Some(lease) = &self.inner.config.lease else {
            return Ok(None);
        };

        let acquired = self
            .inner
            .status_store
            .try_acquire_lease(&lease.holder, self.inner.clock.now(), lease.ttl)
            .await?;

        if !acquired {
            tracing::info!(source = %source, "Generation lease held elsewhere, skipping");
            return Err(AutomationError::LeaseHeld);
        }
        Ok(Some(lease.holder.as_str()))
    }

    async fn record_generation(&self, report: &GenerationReport) {
        let patch = StatusPatch::generated(self.inner.clock.now());

        // Post is already durable: log instead of failing the generation.
        if let Err(e) = self.inner.status_store.apply(&patch).await {
            tracing::error!(
                post_id = %report.post.id,
                error = %e,
                "Post saved but status counters were not updated"
            );
        }
    }

    async fn scheduled_tick(&self) {
        match self.run_if_enabled(TriggerSource::Timer).await {
            Ok(_) | Err(AutomationError::Busy | AutomationError::LeaseHeld) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Scheduled generation tick failed");
            }
        }
    }

    fn arm_timer(&self, interval: IntervalMinutes) {
        let weak = Arc::downgrade(&self.inner);
        let period = interval.as_duration();

        let handle = tokio::spawn(run_timer(weak, period));

        if let Some(previous) = self.timer_slot().replace(handle) {
            previous.abort();
            tracing::debug!("Replaced existing automation timer");
        }
    }

    fn disarm_timer(&self) -> bool {
        match self.timer_slot().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tick every `period` until aborted or every controller handle is dropped.
///
/// Each tick runs in its own task so cancelling the timer never cancels a
/// generation that is already in flight.
async fn run_timer<St, G, R, Cl>(weak: Weak<Inner<St, G, R, Cl>>, period: Duration)
where
    St: StatusStore + ?Sized + 'static,
    G: ContentGenerator + ?Sized + 'static,
    R: PostRepository + ?Sized + 'static,
    Cl: Clock + ?Sized + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(inner) = weak.upgrade() else {
            break;
        };
        let controller = AutomationController { inner };
        tokio::spawn(async move { controller.scheduled_tick().await });
    }
}

/// Holds the in-process busy flag; released on drop
struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SystemClock;
    use crate::testing::{FakeGenerator, FakeRepository, FakeStatusStore};
    use time::OffsetDateTime;

    type TestController =
        AutomationController<FakeStatusStore, FakeGenerator, FakeRepository, SystemClock>;

    struct Harness {
        controller: TestController,
        store: Arc<FakeStatusStore>,
        generator: Arc<FakeGenerator>,
        repository: Arc<FakeRepository>,
    }

    fn harness_with(
        generator: FakeGenerator,
        repository: FakeRepository,
        config: AutomationConfig,
    ) -> Harness {
        let store = Arc::new(FakeStatusStore::default());
        let generator = Arc::new(generator);
        let repository = Arc::new(repository);
        let controller = AutomationController::new(
            Arc::clone(&store),
            Arc::clone(&generator),
            Arc::clone(&repository),
            Arc::new(SystemClock),
            DraftPolicy::default(),
            config,
        );
        Harness {
            controller,
            store,
            generator,
            repository,
        }
    }

    fn harness() -> Harness {
        harness_with(
            FakeGenerator::new(),
            FakeRepository::default(),
            AutomationConfig::default(),
        )
    }

    fn minutes(value: u32) -> Option<IntervalMinutes> {
        Some(IntervalMinutes::new(value).unwrap())
    }

    #[tokio::test]
    async fn test_start_persists_running_and_interval() {
        let h = harness();

        h.controller.start(minutes(25)).await.unwrap();
        let status = h.controller.status().await.unwrap();

        assert!(status.is_running);
        assert_eq!(status.interval_minutes.get(), 25);
        assert!(h.controller.runtime().timer_armed);
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_start_defaults_interval() {
        let h = harness();

        let status = h.controller.start(None).await.unwrap();

        assert_eq!(status.interval_minutes, IntervalMinutes::DEFAULT);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let h = harness();
        h.controller.start(minutes(5)).await.unwrap();

        let first = h.controller.stop().await.unwrap();
        let second = h.controller.stop().await.unwrap();

        assert!(!first.is_running);
        assert_eq!(first, second);
        assert!(!h.controller.status().await.unwrap().is_running);
        assert!(!h.controller.runtime().timer_armed);
    }

    #[tokio::test]
    async fn test_status_creates_default_record() {
        let h = harness();

        let status = h.controller.status().await.unwrap();

        assert_eq!(status, AutomationStatus::default());
        assert!(h.store.record.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_status_store_failure_propagates() {
        let h = harness();
        h.store.fail.store(true, Ordering::SeqCst);

        assert!(matches!(
            h.controller.start(minutes(5)).await,
            Err(AutomationError::Status(_))
        ));
        assert!(!h.controller.runtime().timer_armed);
        assert!(matches!(
            h.controller.stop().await,
            Err(AutomationError::Status(_))
        ));
        assert!(matches!(
            h.controller.status().await,
            Err(AutomationError::Status(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_increments_counters() {
        let h = harness();
        let before = OffsetDateTime::now_utc();

        h.controller
            .execute_generation(TriggerSource::Action)
            .await
            .unwrap();

        let status = h.controller.status().await.unwrap();
        assert_eq!(status.total_posts, 1);
        assert!(status.last_generated_at.unwrap() >= before);
    }

    #[tokio::test]
    async fn test_save_failure_leaves_counters_and_skips_taxonomy() {
        let h = harness_with(
            FakeGenerator::new(),
            FakeRepository {
                fail_save: true,
                ..Default::default()
            },
            AutomationConfig::default(),
        );

        let result = h.controller.execute_generation(TriggerSource::Timer).await;

        assert!(matches!(result, Err(AutomationError::Persistence(_))));
        assert_eq!(h.repository.taxonomy_calls(), 0);
        let status = h.controller.status().await.unwrap();
        assert_eq!(status.total_posts, 0);
        assert!(status.last_generated_at.is_none());
    }

    #[tokio::test]
    async fn test_taxonomy_failure_still_counts_post() {
        let h = harness_with(
            FakeGenerator::new(),
            FakeRepository {
                fail_tags: true,
                ..Default::default()
            },
            AutomationConfig::default(),
        );

        let report = h
            .controller
            .execute_generation(TriggerSource::Webhook)
            .await
            .unwrap();

        assert_eq!(report.taxonomy_failures.len(), 1);
        assert_eq!(h.controller.status().await.unwrap().total_posts, 1);
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_running_state() {
        let h = harness_with(
            FakeGenerator::failing(),
            FakeRepository::default(),
            AutomationConfig::default(),
        );
        h.controller.start(minutes(5)).await.unwrap();

        for _ in 0..2 {
            let result = h.controller.execute_generation(TriggerSource::Timer).await;
            assert!(matches!(result, Err(AutomationError::Generation(_))));
        }

        let status = h.controller.status().await.unwrap();
        assert!(status.is_running);
        assert_eq!(status.total_posts, 0);
        assert_eq!(h.controller.runtime().consecutive_failures, 2);

        h.generator.fail.store(false, Ordering::SeqCst);
        h.controller
            .execute_generation(TriggerSource::Timer)
            .await
            .unwrap();
        assert_eq!(h.controller.runtime().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_overlapping_execution_is_rejected() {
        let (generator, gate) = FakeGenerator::gated();
        let h = harness_with(
            generator,
            FakeRepository::default(),
            AutomationConfig::default(),
        );

        let first = tokio::spawn({
            let controller = h.controller.clone();
            async move { controller.execute_generation(TriggerSource::Timer).await }
        });

        gate.entered.notified().await;
        assert!(h.controller.runtime().generating);

        let second = h.controller.execute_generation(TriggerSource::Webhook).await;
        assert!(matches!(second, Err(AutomationError::Busy)));

        gate.release.notify_one();
        first.await.unwrap().unwrap();

        assert_eq!(h.generator.calls(), 1);
        assert_eq!(h.repository.saved_count(), 1);
        assert!(!h.controller.runtime().generating);
    }

    #[tokio::test]
    async fn test_concurrent_calls_never_interleave() {
        let mut generator = FakeGenerator::new();
        generator.yield_once = true;
        let h = harness_with(
            generator,
            FakeRepository::default(),
            AutomationConfig::default(),
        );

        let (a, b) = futures::join!(
            h.controller.execute_generation(TriggerSource::Timer),
            h.controller.execute_generation(TriggerSource::Webhook),
        );

        assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
        assert!(
            matches!(a, Err(AutomationError::Busy)) || matches!(b, Err(AutomationError::Busy))
        );
        assert_eq!(h.repository.saved_count(), 1);
        assert_eq!(h.controller.status().await.unwrap().total_posts, 1);
    }

    #[tokio::test]
    async fn test_busy_flag_released_after_error() {
        let h = harness_with(
            FakeGenerator::failing(),
            FakeRepository::default(),
            AutomationConfig::default(),
        );

        let _ = h.controller.execute_generation(TriggerSource::Action).await;

        assert!(!h.controller.runtime().generating);
        h.generator.fail.store(false, Ordering::SeqCst);
        assert!(
            h.controller
                .execute_generation(TriggerSource::Action)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_run_if_enabled_skips_when_stopped() {
        let h = harness();

        let outcome = h
            .controller
            .run_if_enabled(TriggerSource::Webhook)
            .await
            .unwrap();

        assert!(matches!(outcome, TriggerOutcome::Disabled));
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_run_if_enabled_generates_when_running() {
        let h = harness();
        h.controller.start(minutes(30)).await.unwrap();

        let outcome = h
            .controller
            .run_if_enabled(TriggerSource::Webhook)
            .await
            .unwrap();

        assert!(matches!(outcome, TriggerOutcome::Generated(_)));
        assert_eq!(h.repository.saved_count(), 1);
    }

    #[tokio::test]
    async fn test_lease_held_elsewhere_skips_generation() {
        let h = harness_with(
            FakeGenerator::new(),
            FakeRepository::default(),
            AutomationConfig {
                lease: Some(LeaseConfig {
                    holder: "worker-a".to_string(),
                    ttl: Duration::from_secs(300),
                }),
                ..Default::default()
            },
        );
        *h.store.lease.lock().unwrap() = Some((
            "worker-b".to_string(),
            OffsetDateTime::now_utc() + Duration::from_secs(120),
        ));

        let result = h.controller.execute_generation(TriggerSource::Timer).await;

        assert!(matches!(result, Err(AutomationError::LeaseHeld)));
        assert_eq!(h.generator.calls(), 0);
        assert!(!h.controller.runtime().generating);
    }

    #[tokio::test]
    async fn test_lease_released_after_generation() {
        let h = harness_with(
            FakeGenerator::new(),
            FakeRepository::default(),
            AutomationConfig {
                lease: Some(LeaseConfig {
                    holder: "worker-a".to_string(),
                    ttl: Duration::from_secs(300),
                }),
                ..Default::default()
            },
        );

        h.controller
            .execute_generation(TriggerSource::Timer)
            .await
            .unwrap();

        assert!(h.store.lease.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_caller_still_counts_saved_post() {
        let (repository, gate) = FakeRepository::gated_tags();
        let h = harness_with(
            FakeGenerator::new(),
            repository,
            AutomationConfig {
                lease: Some(LeaseConfig {
                    holder: "worker-a".to_string(),
                    ttl: Duration::from_secs(600),
                }),
                ..Default::default()
            },
        );

        {
            let call = h.controller.execute_generation(TriggerSource::Webhook);
            tokio::pin!(call);
            tokio::select! {
                _ = &mut call => panic!("generation finished before tags were released"),
                _ = gate.entered.notified() => {}
            }
        }

        assert_eq!(h.repository.saved_count(), 1);
        assert!(h.controller.runtime().generating);

        gate.release.notify_one();
        tokio::time::timeout(Duration::from_secs(5), async {
            while h.controller.runtime().generating {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("background generation finishes");

        let status = h.controller.status().await.unwrap();
        assert_eq!(status.total_posts, 1);
        assert!(status.last_generated_at.is_some());
        assert!(h.store.lease.lock().unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_generates_every_interval() {
        let h = harness();
        h.controller.start(minutes(1)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.generator.calls(), 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(h.generator.calls(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.generator.calls(), 2);
        assert_eq!(h.controller.status().await.unwrap().total_posts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timer() {
        let h = harness();
        h.controller.start(minutes(1)).await.unwrap();
        h.controller.stop().await.unwrap();

        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_timer() {
        let h = harness();
        h.controller.start(minutes(1)).await.unwrap();
        h.controller.start(minutes(5)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(h.generator.calls(), 0);

        tokio::time::sleep(Duration::from_secs(240)).await;
        assert_eq!(h.generator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_tick_rechecks_persisted_status() {
        let h = harness();
        h.controller.start(minutes(1)).await.unwrap();
        h.store.set_running(false);

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(h.generator.calls(), 0);
        assert!(h.store.loads() >= 1);
        assert!(h.controller.runtime().timer_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_arms_timer_from_persisted_state() {
        let h = harness();
        h.store.set_running(true);
        assert!(!h.controller.runtime().timer_armed);

        let resumed = h.controller.resume().await.unwrap();
        assert_eq!(resumed, Some(IntervalMinutes::DEFAULT));
        assert!(h.controller.runtime().timer_armed);
        assert_eq!(h.controller.resume().await.unwrap(), None);

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert_eq!(h.generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_resume_does_nothing_when_stopped() {
        let h = harness();

        assert_eq!(h.controller.resume().await.unwrap(), None);
        assert!(!h.controller.runtime().timer_armed);
    }

    #[tokio::test]
    async fn test_shutdown_keeps_persisted_state() {
        let h = harness();
        h.controller.start(minutes(5)).await.unwrap();

        h.controller.shutdown();

        assert!(!h.controller.runtime().timer_armed);
        assert!(h.controller.status().await.unwrap().is_running);
    }
}

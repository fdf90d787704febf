//! Polling / watch engine
//!
//! A watch waits on three things at once: the next interval tick, the cancel
//! token, and the absolute timeout. Whichever fires first decides the outcome.
//! The step itself is never raced; cancellation and timeout are only observed
//! between steps.

use crate::api::{Client, Receipt};
use crate::error::{Error, Result};
use crate::resource::{CountedResource, ListResource, Resource, SearchParams};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, sleep_until, Instant, Interval, MissedTickBehavior};

/// Cooperative cancellation signal, shared by clones.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
            deadline: None,
        }
    }

    /// Clone of this token that also counts as cancelled once `deadline` passes.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the token is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        let flagged = async move {
            // The sender lives as long as `self`, so this only returns on `true`.
            let _ = rx.wait_for(|cancelled| *cancelled).await;
        };
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = flagged => {},
                    _ = sleep_until(deadline) => {},
                }
            },
            None => flagged.await,
        }
    }
}

/// Lifecycle of a watch. Every state but `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Running,
    Done,
    Cancelled,
    TimedOut,
    Failed,
}

impl WatchState {
    /// Terminal state of a finished watch.
    pub fn of<T>(outcome: &Result<T>) -> Self {
        match outcome {
            Ok(_) => WatchState::Done,
            Err(Error::Cancelled) => WatchState::Cancelled,
            Err(Error::WatchTimeout(_)) => WatchState::TimedOut,
            Err(_) => WatchState::Failed,
        }
    }
}

/// The multiplexed wait between steps.
pub struct Poller<'a> {
    cancel: &'a CancelToken,
    ticker: Interval,
    deadline: Instant,
    timeout: Duration,
    polls: u64,
}

impl<'a> Poller<'a> {
    /// The first tick is immediate; later ticks are skipped, not queued, when a
    /// step overruns the interval.
    pub fn new(cancel: &'a CancelToken, every: Duration, timeout: Duration) -> Result<Self> {
        if every.is_zero() {
            return Err(Error::Config("watch interval must be positive".to_string()));
        }
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Ok(Self {
            cancel,
            ticker,
            deadline: Instant::now() + timeout,
            timeout,
            polls: 0,
        })
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Wait for the next tick. Errors with `Cancelled` or `WatchTimeout` when
    /// either fires first.
    pub async fn wait(&mut self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if Instant::now() >= self.deadline {
            return Err(Error::WatchTimeout(self.timeout));
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = sleep_until(self.deadline) => Err(Error::WatchTimeout(self.timeout)),
            _ = self.ticker.tick() => {
                self.polls += 1;
                Ok(())
            },
        }
    }
}

/// Run `step` on every tick until it returns `Ok(false)`.
///
/// `Ok(true)` means keep waiting. A step error ends the watch immediately and is
/// returned as is; cancellation and timeout come back as [`Error::Cancelled`]
/// and [`Error::WatchTimeout`].
pub async fn watch<F, Fut>(cancel: &CancelToken, every: Duration, timeout: Duration, mut step: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut poller = Poller::new(cancel, every, timeout)?;
    loop {
        poller.wait().await?;
        if !step().await? {
            tracing::debug!("watch done after {} polls", poller.polls());
            return Ok(());
        }
    }
}

impl Client {
    fn poller<'a>(&self, cancel: &'a CancelToken) -> Result<Poller<'a>> {
        Poller::new(cancel, self.config.watch_interval(), self.config.watch_timeout())
    }

    /// Re-read `resource` until it differs from its value at call time.
    pub async fn watch_read<R: Resource>(&self, cancel: &CancelToken, resource: &mut R) -> Result<Receipt> {
        let baseline = resource.clone();
        let mut poller = self.poller(cancel)?;
        loop {
            poller.wait().await?;
            let receipt = self.read(resource).await?;
            if *resource != baseline {
                tracing::info!("{} changed after {} polls", resource.name(), poller.polls());
                return Ok(receipt);
            }
        }
    }

    /// Re-list one page until the collection differs from its value at call time.
    pub async fn watch_list<R: ListResource>(
        &self,
        cancel: &CancelToken,
        resource: &mut R,
        search: Option<&dyn SearchParams>,
    ) -> Result<Receipt> {
        let baseline = resource.clone();
        let mut poller = self.poller(cancel)?;
        loop {
            poller.wait().await?;
            let receipt = self.list(resource, search).await?;
            if *resource != baseline {
                tracing::info!("{} list changed after {} polls", resource.name(), poller.polls());
                return Ok(receipt);
            }
        }
    }

    /// Re-aggregate every page until the full collection differs from its value at call time.
    pub async fn watch_list_all<R: CountedResource>(
        &self,
        cancel: &CancelToken,
        resource: &mut R,
        search: Option<R::Search>,
    ) -> Result<Receipt> {
        let baseline = resource.clone();
        let mut poller = self.poller(cancel)?;
        loop {
            poller.wait().await?;
            let receipt = self.list_all(resource, search.clone()).await?;
            if *resource != baseline {
                tracing::info!("{} collection changed after {} polls", resource.name(), poller.polls());
                return Ok(receipt);
            }
        }
    }
}

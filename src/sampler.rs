//! Periodic wall-clock sampling.

use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};
use tracing::debug;

use crate::Result;
use crate::time::{TimeOfDay, TimeSource};

/// Consumer of sampled time.
pub trait TimeSink {
    /// Replace the current time snapshot.
    fn publish(&mut self, time: TimeOfDay);
}

/// Repeating time sampler on the event loop.
///
/// The first sample is published immediately, every following sample one
/// interval after the previous callback. The timer is removed from the loop
/// on [`Sampler::cancel`] or when the sampler is dropped.
pub struct Sampler<S: 'static> {
    event_loop: LoopHandle<'static, S>,
    token: Option<RegistrationToken>,
}

impl<S: TimeSink + 'static> Sampler<S> {
    pub fn new<T>(
        event_loop: &LoopHandle<'static, S>,
        source: T,
        interval: Duration,
    ) -> Result<Self>
    where
        T: TimeSource + 'static,
    {
        let token = event_loop.insert_source(Timer::immediate(), move |_, _, sink| {
            sink.publish(source.now());
            TimeoutAction::ToDuration(interval)
        })?;

        debug!("Started time sampler with {interval:?} interval");

        Ok(Self { event_loop: event_loop.clone(), token: Some(token) })
    }
}

impl<S: 'static> Sampler<S> {
    /// Stop sampling.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            self.event_loop.remove(token);
            debug!("Cancelled time sampler");
        }
    }

    /// Check if the timer is still registered.
    pub fn is_running(&self) -> bool {
        self.token.is_some()
    }
}

impl<S: 'static> Drop for Sampler<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rand::Rng;
use tokio::time::{self, Instant};

use crate::error::KefError;
use crate::source::Source;
use crate::speaker::SpeakerClient;
use crate::volume::Volume;

/// An in-process speaker.
///
/// Behaves like a networked speaker seen from the client side: every call takes
/// `latency` plus up to `jitter`, and a written volume only shows up in reads
/// once `propagation` has passed. Used as the panel's backend and in tests.
#[derive(Debug)]
pub struct SimulatedSpeaker {
    address: String,
    latency: Duration,
    jitter: Duration,
    propagation: Duration,
    state: Mutex<DeviceState>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

#[derive(Debug)]
struct DeviceState {
    level: f64,
    propagating: Option<(Instant, f64)>,
    last_written: Option<f64>,
    source: Source,
    powered: bool,
    reachable: bool,
    failures_left: u32,
}

impl DeviceState {
    /// Apply a propagated write once its time has come
    fn settle(&mut self, now: Instant) {
        if let Some((visible_at, level)) = self.propagating {
            if now >= visible_at {
                self.level = level;
                self.propagating = None;
            }
        }
    }
}

pub struct SimulatedSpeakerBuilder {
    address: String,
    volume: Volume,
    source: Source,
    powered: bool,
    latency: Duration,
    jitter: Duration,
    propagation: Duration,
}

impl SimulatedSpeakerBuilder {
    pub fn volume(mut self, volume: Volume) -> Self {
        self.volume = volume;
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    pub fn powered(mut self, powered: bool) -> Self {
        self.powered = powered;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Upper bound of the random delay added to each call
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn propagation(mut self, propagation: Duration) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn build(self) -> SimulatedSpeaker {
        SimulatedSpeaker {
            address: self.address,
            latency: self.latency,
            jitter: self.jitter,
            propagation: self.propagation,
            state: Mutex::new(DeviceState {
                level: self.volume.as_fraction(),
                propagating: None,
                last_written: None,
                source: self.source,
                powered: self.powered,
                reachable: true,
                failures_left: 0,
            }),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }
}

impl SimulatedSpeaker {
    /// A powered-on speaker at 50% on Wifi that answers instantly
    pub fn builder(address: impl Into<String>) -> SimulatedSpeakerBuilder {
        SimulatedSpeakerBuilder {
            address: address.into(),
            volume: Volume::from_percent(50),
            source: Source::Wifi,
            powered: true,
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
            propagation: Duration::ZERO,
        }
    }

    pub fn new(address: impl Into<String>) -> Self {
        Self::builder(address).build()
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make the speaker stop (or resume) answering
    pub fn set_reachable(&self, reachable: bool) {
        self.state().reachable = reachable;
    }

    /// Fail the next `count` calls with a device error
    pub fn fail_next(&self, count: u32) {
        self.state().failures_left = count;
    }

    /// Change the volume from outside the panel, e.g. with the remote
    pub fn set_external_volume(&self, volume: Volume) {
        let mut state = self.state();
        state.level = volume.as_fraction();
        state.propagating = None;
    }

    /// Volume the device currently reports
    pub fn volume(&self) -> Volume {
        let mut state = self.state();
        state.settle(Instant::now());
        Volume::from_fraction(state.level)
    }

    pub fn last_written(&self) -> Option<f64> {
        self.state().last_written
    }

    pub fn source(&self) -> Source {
        self.state().source
    }

    pub fn is_powered(&self) -> bool {
        self.state().powered
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Wait out the call latency, then decide whether the call goes through
    async fn round_trip(&self) -> Result<(), KefError> {
        let extra = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let max = self.jitter.as_millis() as u64;
            Duration::from_millis(rand::thread_rng().gen_range(0..=max))
        };
        let delay = self.latency + extra;
        if !delay.is_zero() {
            time::sleep(delay).await;
        }

        let mut state = self.state();
        if !state.reachable {
            return Err(KefError::Unreachable(self.address.clone()));
        }
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(KefError::Device("simulated failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeakerClient for SimulatedSpeaker {
    fn address(&self) -> &str {
        &self.address
    }

    async fn get_volume(&self) -> Result<f64, KefError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;

        let mut state = self.state();
        if !state.powered {
            return Err(KefError::PoweredOff);
        }
        state.settle(Instant::now());
        Ok(state.level)
    }

    async fn set_volume(&self, level: f64) -> Result<(), KefError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;

        if !(0.0..=1.0).contains(&level) {
            return Err(KefError::Device(format!("volume level {} out of range", level)));
        }

        let mut state = self.state();
        if !state.powered {
            return Err(KefError::PoweredOff);
        }
        state.last_written = Some(level);
        let now = Instant::now();
        if self.propagation.is_zero() {
            state.level = level;
            state.propagating = None;
        } else {
            state.settle(now);
            state.propagating = Some((now + self.propagation, level));
        }
        debug!("{}: volume set to {}", self.address, level);
        Ok(())
    }

    async fn set_source(&self, source: Source) -> Result<(), KefError> {
        self.round_trip().await?;

        let mut state = self.state();
        state.source = source;
        state.powered = true;
        debug!("{}: source set to {}", self.address, source);
        Ok(())
    }

    async fn turn_off(&self) -> Result<(), KefError> {
        self.round_trip().await?;

        self.state().powered = false;
        debug!("{}: turned off", self.address);
        Ok(())
    }
}

//! CPU/GPU fence built on top of wgpu's queue completion callbacks.
//!
//! wgpu has no user-visible fence object. The same contract is expressed with
//! a monotonically increasing counter: [`Fence::signal`] bumps the CPU side
//! value and asks the queue to report back once every submission made so far
//! has finished, at which point the completed value is raised to match.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::{Context as _, ensure};

/// The part of the GPU a [`Fence`] needs: completion notification and a way
/// to block until a given submission is done.
pub trait GpuTimeline {
    /// Handle of one queue submission.
    type Submission: Clone;

    /// Invoke `callback` once all work submitted before this call has completed.
    fn notify_on_completion(&self, callback: Box<dyn FnOnce() + Send + 'static>);

    /// Block the calling thread until `submission` has completed, or until
    /// all outstanding work has if there is no submission to wait for.
    ///
    /// Completion callbacks of the finished work have run when this returns.
    fn block_until(&self, submission: Option<&Self::Submission>) -> anyhow::Result<()>;
}

/// [`GpuTimeline`] backed by a wgpu device and queue.
///
/// Both handles are internally reference counted, so cloning them here only
/// clones the reference.
#[derive(Debug, Clone)]
pub struct QueueTimeline {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl QueueTimeline {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
        }
    }
}

impl GpuTimeline for QueueTimeline {
    type Submission = wgpu::SubmissionIndex;

    fn notify_on_completion(&self, callback: Box<dyn FnOnce() + Send + 'static>) {
        self.queue.on_submitted_work_done(callback);
    }

    fn block_until(&self, submission: Option<&wgpu::SubmissionIndex>) -> anyhow::Result<()> {
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: submission.cloned(),
                timeout: None,
            })
            .context("Polling the device for completed work failed")?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Fence<T: GpuTimeline> {
    timeline: T,
    current: u64,
    completed: Arc<AtomicU64>,
    /// Signalled values not known to be complete, with the submission each one follows.
    in_flight: VecDeque<(u64, Option<T::Submission>)>,
}

impl<T: GpuTimeline> Fence<T> {
    pub fn new(timeline: T) -> Self {
        Self {
            timeline,
            current: 0,
            completed: Arc::new(AtomicU64::new(0)),
            in_flight: VecDeque::new(),
        }
    }

    /// The last value handed out by [`signal`](Self::signal).
    pub fn current_value(&self) -> u64 {
        self.current
    }

    /// The highest value the GPU has reached so far.
    pub fn completed_value(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    pub fn is_complete(&self, value: u64) -> bool {
        self.completed_value() >= value
    }

    /// Mark every command submitted up to now with a new fence value.
    ///
    /// `submission` is the submission just made. The value is reached on the
    /// GPU timeline, i.e. only after the GPU has processed all commands
    /// submitted prior to this call. Waiting for a value signalled without a
    /// submission waits for all outstanding work.
    pub fn signal(&mut self, submission: Option<T::Submission>) -> u64 {
        self.current += 1;
        let value = self.current;
        let completed = self.completed.clone();
        self.timeline.notify_on_completion(Box::new(move || {
            completed.fetch_max(value, Ordering::AcqRel);
        }));

        let reached = self.completed_value();
        self.in_flight.retain(|(v, _)| *v > reached);
        self.in_flight.push_back((value, submission));
        value
    }

    /// Block until the GPU has reached `value`.
    ///
    /// Only the submission `value` follows is waited for; later work stays in flight.
    pub fn wait_for(&self, value: u64) -> anyhow::Result<()> {
        ensure!(
            value <= self.current,
            "Cannot wait for fence value {} which was never signalled (current is {})",
            value,
            self.current
        );
        if self.is_complete(value) {
            return Ok(());
        }
        log::debug!(
            "Waiting for fence value {} (completed {})",
            value,
            self.completed_value()
        );
        let submission = self
            .in_flight
            .iter()
            .find(|(v, _)| *v == value)
            .and_then(|(_, submission)| submission.as_ref());
        self.timeline.block_until(submission)?;
        ensure!(
            self.is_complete(value),
            "GPU finished the awaited work without reaching fence value {} (completed {})",
            value,
            self.completed_value()
        );
        Ok(())
    }

    /// Signal and wait: afterwards the GPU has no outstanding work.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        let value = self.signal(None);
        self.wait_for(value)
    }
}

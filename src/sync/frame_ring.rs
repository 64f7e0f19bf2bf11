//! Fixed ring of in-flight frame resources.
//!
//! The CPU works on slot `i` while the GPU may still be consuming the slots
//! submitted before it. Moving onto a slot first waits for the fence value
//! recorded when that slot was last submitted.

use anyhow::ensure;

use crate::sync::fence::{Fence, GpuTimeline};

#[derive(Debug)]
struct Slot<R> {
    fence: u64,
    resource: R,
}

#[derive(Debug)]
pub struct FrameRing<R> {
    slots: Vec<Slot<R>>,
    current: usize,
}

impl<R> FrameRing<R> {
    pub fn new(resources: Vec<R>) -> anyhow::Result<Self> {
        ensure!(
            !resources.is_empty(),
            "A frame ring needs at least one frame resource"
        );
        let slots = resources
            .into_iter()
            .map(|resource| Slot { fence: 0, resource })
            .collect();
        Ok(Self { slots, current: 0 })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &R {
        &self.slots[self.current].resource
    }

    pub fn current_mut(&mut self) -> &mut R {
        &mut self.slots[self.current].resource
    }

    /// Fence value of the last submission that used the current slot (0 if never submitted).
    pub fn current_fence(&self) -> u64 {
        self.slots[self.current].fence
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.slots.iter().map(|slot| &slot.resource)
    }

    /// Move to the next slot and make sure the GPU is done with it.
    pub fn advance<T: GpuTimeline>(&mut self, fence: &Fence<T>) -> anyhow::Result<usize> {
        self.current = (self.current + 1) % self.slots.len();
        let pending = self.slots[self.current].fence;
        if pending != 0 && !fence.is_complete(pending) {
            log::debug!(
                "Frame resource {} still in flight, waiting for fence {}",
                self.current,
                pending
            );
            fence.wait_for(pending)?;
        }
        Ok(self.current)
    }

    /// Remember which fence value guards the current slot.
    pub fn mark_submitted(&mut self, fence_value: u64) {
        self.slots[self.current].fence = fence_value;
    }
}

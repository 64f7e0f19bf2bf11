use cgmath::{Matrix4, SquareMatrix};
use orbit_shapes::{
    data_structures::{mesh::Submesh, render_item::RenderItem},
    sync::{Fence, FrameRing},
};

use crate::common::test_utils::ScriptedTimeline;

mod common;

#[test]
fn fence_values_strictly_increase() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    assert_eq!(fence.current_value(), 0);
    let values: Vec<u64> = (0..5).map(|_| fence.signal(Some(timeline.submit()))).collect();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
    assert_eq!(fence.current_value(), 5);
    assert_eq!(timeline.pending(), 5);
}

#[test]
fn fence_completes_in_submission_order() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    let first = fence.signal(Some(timeline.submit()));
    let second = fence.signal(Some(timeline.submit()));
    assert_eq!(fence.completed_value(), 0);
    assert!(!fence.is_complete(first));

    timeline.complete_next();
    assert_eq!(fence.completed_value(), first);
    assert!(fence.is_complete(first));
    assert!(!fence.is_complete(second));

    timeline.complete_next();
    assert_eq!(fence.completed_value(), second);
    assert!(fence.completed_value() <= fence.current_value());
}

#[test]
fn waiting_for_zero_never_blocks() {
    let timeline = ScriptedTimeline::new();
    let fence = Fence::new(timeline.clone());
    fence.wait_for(0).unwrap();
    assert_eq!(timeline.block_count(), 0);
}

#[test]
fn waiting_for_a_completed_value_does_not_block() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    let value = fence.signal(Some(timeline.submit()));
    timeline.complete_all();
    fence.wait_for(value).unwrap();
    assert_eq!(timeline.block_count(), 0);
}

#[test]
fn waiting_blocks_until_the_value_is_reached() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    let value = fence.signal(Some(timeline.submit()));
    fence.wait_for(value).unwrap();
    assert_eq!(timeline.block_count(), 1);
    assert!(fence.is_complete(value));
}

#[test]
fn waiting_for_an_unsignalled_value_fails() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    fence.signal(Some(timeline.submit()));
    assert!(fence.wait_for(2).is_err());
    assert_eq!(timeline.block_count(), 0);
}

#[test]
fn flush_leaves_nothing_outstanding() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    fence.signal(Some(timeline.submit()));
    fence.signal(Some(timeline.submit()));
    fence.flush().unwrap();
    assert_eq!(fence.current_value(), 3);
    assert_eq!(fence.completed_value(), 3);
    assert_eq!(timeline.pending(), 0);
}

#[test]
fn frame_ring_needs_a_slot() {
    assert!(FrameRing::<()>::new(Vec::new()).is_err());
}

#[test]
fn frame_ring_rotates_through_every_slot() {
    let timeline = ScriptedTimeline::new();
    let fence = Fence::new(timeline);
    let mut ring = FrameRing::new(vec!['a', 'b', 'c']).unwrap();
    assert_eq!(ring.current_index(), 0);
    let visited: Vec<char> = (0..6)
        .map(|_| {
            ring.advance(&fence).unwrap();
            *ring.current()
        })
        .collect();
    assert_eq!(visited, vec!['b', 'c', 'a', 'b', 'c', 'a']);
}

#[test]
fn frame_ring_does_not_wait_when_the_gpu_keeps_up() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    let mut ring = FrameRing::new(vec![(); 3]).unwrap();
    for _ in 0..10 {
        ring.advance(&fence).unwrap();
        let value = fence.signal(Some(timeline.submit()));
        ring.mark_submitted(value);
        timeline.complete_all();
    }
    assert_eq!(timeline.block_count(), 0);
}

#[test]
fn frame_ring_waits_for_the_slot_it_reuses() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    let mut ring = FrameRing::new(vec![(); 3]).unwrap();

    // The GPU never catches up on its own: three frames fit in flight.
    for _ in 0..3 {
        ring.advance(&fence).unwrap();
        assert_eq!(ring.current_fence(), 0);
        let value = fence.signal(Some(timeline.submit()));
        ring.mark_submitted(value);
    }
    assert_eq!(timeline.block_count(), 0);
    assert_eq!(timeline.pending(), 3);

    // The fourth frame reuses the first slot and has to wait for it, but
    // only for it: the two newer frames stay queued on the GPU.
    ring.advance(&fence).unwrap();
    assert_eq!(timeline.block_count(), 1);
    assert_eq!(ring.current_fence(), 1);
    assert!(fence.is_complete(ring.current_fence()));
    assert_eq!(fence.completed_value(), 1);
    assert_eq!(timeline.pending(), 2);
}

#[test]
fn waiting_leaves_later_submissions_in_flight() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    let values: Vec<u64> = (0..3).map(|_| fence.signal(Some(timeline.submit()))).collect();

    fence.wait_for(values[0]).unwrap();
    assert_eq!(fence.completed_value(), values[0]);
    assert!(!fence.is_complete(values[1]));
    assert_eq!(timeline.pending(), 2);

    fence.wait_for(values[2]).unwrap();
    assert_eq!(fence.completed_value(), values[2]);
    assert_eq!(timeline.pending(), 0);
    assert_eq!(timeline.block_count(), 2);
}

#[test]
fn value_without_a_submission_waits_for_everything() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    fence.signal(Some(timeline.submit()));
    // Work submitted behind the fence's back.
    timeline.submit();
    let value = fence.signal(None);
    fence.wait_for(value).unwrap();
    assert_eq!(fence.completed_value(), value);
    assert_eq!(timeline.pending(), 0);
}

#[test]
fn advanced_slot_is_never_still_in_flight() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    let mut ring = FrameRing::new(vec![(); 2]).unwrap();
    for frame in 0..20 {
        ring.advance(&fence).unwrap();
        assert!(fence.is_complete(ring.current_fence()));
        let value = fence.signal(Some(timeline.submit()));
        ring.mark_submitted(value);
        // The GPU finishes every other frame.
        if frame % 2 == 0 {
            timeline.complete_next();
        }
    }
}

#[test]
fn single_slot_ring_waits_every_frame() {
    let timeline = ScriptedTimeline::new();
    let mut fence = Fence::new(timeline.clone());
    let mut ring = FrameRing::new(vec![()]).unwrap();
    for _ in 0..4 {
        ring.advance(&fence).unwrap();
        let value = fence.signal(Some(timeline.submit()));
        ring.mark_submitted(value);
    }
    // The first frame found the slot unused.
    assert_eq!(timeline.block_count(), 3);
}

#[test]
fn dirty_counters_reach_zero_after_one_write_per_frame_resource() {
    let frames = 3;
    let mut item = RenderItem::identity("shapeGeo", Submesh::default(), 0, frames);
    for _ in 0..frames {
        assert!(item.is_dirty());
        item.mark_written();
    }
    assert!(!item.is_dirty());
    item.mark_written();
    assert_eq!(item.num_frames_dirty, 0);

    item.set_world(Matrix4::from_scale(2.0), frames);
    assert_eq!(item.num_frames_dirty, frames);
    assert_ne!(item.world, Matrix4::identity());
}

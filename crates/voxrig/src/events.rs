//! # Destruction Event Channel
//!
//! Forwards destruction events out of the damage call into a bounded
//! crossbeam channel, for consumers that run elsewhere in the frame
//! (audio, network replication, particles).
//!
//! ```text
//! DamageEngine ──► ChannelSink ──[bounded]──► DestructionReceiver
//!                  (never blocks,             drain() once per frame
//!                   drops when full)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use voxrig_core::{DestructionObserver, VoxelDestroyed};

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Observer that forwards events into a channel.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    sender: Sender<VoxelDestroyed>,
    dropped: Arc<AtomicU64>,
}

impl ChannelSink {
    /// Forwards one event without blocking.
    ///
    /// Returns `false` when the event was dropped.
    #[inline]
    pub fn send(&self, event: VoxelDestroyed) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("destruction channel full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Events dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl DestructionObserver for ChannelSink {
    fn on_voxel_destroyed(&mut self, event: &VoxelDestroyed) {
        self.send(*event);
    }
}

/// Receiving end of a destruction channel.
#[derive(Clone, Debug)]
pub struct DestructionReceiver {
    receiver: Receiver<VoxelDestroyed>,
}

impl DestructionReceiver {
    /// Takes every pending event.
    #[must_use]
    pub fn drain(&self) -> Vec<VoxelDestroyed> {
        self.receiver.try_iter().collect()
    }

    /// Takes one pending event.
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<VoxelDestroyed> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

/// Creates a connected sink and receiver.
#[must_use]
pub fn destruction_channel(capacity: usize) -> (ChannelSink, DestructionReceiver) {
    let (sender, receiver) = bounded(capacity);
    (ChannelSink { sender, dropped: Arc::new(AtomicU64::new(0)) }, DestructionReceiver { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use voxrig_core::{CanonicalBone, VoxelCoord};

    fn event(x: u32) -> VoxelDestroyed {
        VoxelDestroyed {
            coord: VoxelCoord::new(x, 0, 0),
            bone: CanonicalBone::Chest.into(),
            color: [255; 4],
            world_point: Vec3::X,
            impact_center: Vec3::ZERO,
        }
    }

    #[test]
    fn test_events_arrive_in_order() {
        let (mut sink, receiver) = destruction_channel(8);
        for x in 0..3 {
            sink.on_voxel_destroyed(&event(x));
        }
        assert_eq!(receiver.pending_count(), 3);
        let coords: Vec<u32> = receiver.drain().iter().map(|e| e.coord.x).collect();
        assert_eq!(coords, vec![0, 1, 2]);
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let (sink, receiver) = destruction_channel(2);
        assert!(sink.send(event(0)));
        assert!(sink.send(event(1)));
        assert!(!sink.send(event(2)));
        assert_eq!(sink.dropped(), 1);
        assert_eq!(receiver.drain().len(), 2);
    }
}

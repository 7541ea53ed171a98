//! Per-marker pixel statistics with throttled recomputation
//!
//! A marker that has never been sampled is sampled directly, so the first
//! paint is always correct. Later invalidations go through a per-marker
//! `Throttle`: at most one recompute per interval, with the last request in a
//! window released on the first frame after the window closes.

use crate::geometry::ImagePoint;
use crate::host::{ImageInfo, PixelSource};
use crate::marker::{Marker, MarkerId, PixelStats, PixelValues};
use crate::store::SurfaceId;
use probe_scheduler::Throttle;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What `PixelStatsCache::refresh` did for a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsRefresh {
    /// Stats were current, nothing ran
    Unchanged,
    /// First sample, computed without throttling
    Direct,
    /// Recomputed through the throttle
    Throttled,
    /// Recompute is waiting for the throttle window to close
    Deferred,
}

/// Computes and caches pixel statistics under markers
pub struct PixelStatsCache {
    pixels: Arc<dyn PixelSource>,
    interval: Duration,
    throttles: HashMap<(SurfaceId, MarkerId), Throttle<ImagePoint>>,
}

impl PixelStatsCache {
    pub fn new(pixels: Arc<dyn PixelSource>, interval: Duration) -> Self {
        Self {
            pixels,
            interval,
            throttles: HashMap::new(),
        }
    }

    /// Sample the pixel under a point
    ///
    /// Returns `PixelStats::OutOfBounds` when the rounded point lies outside
    /// the image.
    pub fn sample(&self, image: &ImageInfo, surface: SurfaceId, point: ImagePoint) -> PixelStats {
        let (x, y) = point.rounded();
        if !image.contains(x, y) {
            return PixelStats::OutOfBounds;
        }

        let stored_pixels = if image.color {
            PixelValues::Rgb(self.pixels.rgb_pixels(surface, x, y, 1, 1))
        } else {
            PixelValues::Stored(self.pixels.stored_pixels(surface, x, y, 1, 1))
        };

        PixelStats::Sampled {
            x,
            y,
            stored_pixels,
        }
    }

    /// Recompute a marker's stats now
    ///
    /// Writes the result into the marker and clears its invalidated flag.
    pub fn compute_stats(
        &self,
        image: &ImageInfo,
        surface: SurfaceId,
        marker: &mut Marker,
    ) -> PixelStats {
        let stats = self.sample(image, surface, marker.anchor());
        marker.set_stats(stats.clone());
        stats
    }

    /// Bring a marker's stats up to date for this frame
    pub fn refresh(
        &mut self,
        image: &ImageInfo,
        surface: SurfaceId,
        marker: &mut Marker,
        now: Instant,
    ) -> StatsRefresh {
        // Trailing run left over from an earlier frame
        let released = self
            .throttles
            .get_mut(&(surface, marker.id()))
            .and_then(|throttle| throttle.poll(now));
        if let Some(anchor) = released {
            marker.set_stats(self.sample(image, surface, anchor));
            tracing::debug!(marker = %marker.id(), "trailing stats recompute");
            return StatsRefresh::Throttled;
        }

        if !marker.is_invalidated() {
            return StatsRefresh::Unchanged;
        }

        if marker.stats().is_none() {
            self.compute_stats(image, surface, marker);
            return StatsRefresh::Direct;
        }

        let interval = self.interval;
        let throttle = self
            .throttles
            .entry((surface, marker.id()))
            .or_insert_with(|| Throttle::new(interval));

        match throttle.call(now, marker.anchor()) {
            Some(anchor) => {
                marker.set_stats(self.sample(image, surface, anchor));
                StatsRefresh::Throttled
            }
            None => StatsRefresh::Deferred,
        }
    }

    /// Earliest time a deferred recompute becomes due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttles.values().filter_map(Throttle::deadline).min()
    }

    /// Drop throttle state for a marker that no longer exists
    pub fn forget(&mut self, id: MarkerId) {
        self.throttles.retain(|(_, marker), _| *marker != id);
    }

    /// Drop throttle state on `surface` for markers not in `live`
    ///
    /// Returns the number of entries removed.
    pub fn retain_surface(&mut self, surface: SurfaceId, live: &HashSet<MarkerId>) -> usize {
        let before = self.throttles.len();
        self.throttles
            .retain(|(on, marker), _| *on != surface || live.contains(marker));
        before - self.throttles.len()
    }
}

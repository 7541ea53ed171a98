//! Per-frame drawing of probe markers

use crate::config::{LabelIndexing, ProbeToolConfig, RenderStyle};
use crate::event::Frame;
use crate::geometry::CanvasPoint;
use crate::host::{CanvasTransform, DrawContext, PixelSource};
use crate::marker::{Marker, MarkerId};
use crate::stats::PixelStatsCache;
use crate::store::MarkerStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Draws markers and keeps their pixel stats current
pub struct RenderPipeline {
    tool_name: String,
    legacy_tool_name: Option<String>,
    label_indexing: LabelIndexing,
    style: RenderStyle,
    transform: Arc<dyn CanvasTransform>,
    stats: PixelStatsCache,
}

impl RenderPipeline {
    pub fn new(
        config: &ProbeToolConfig,
        transform: Arc<dyn CanvasTransform>,
        pixels: Arc<dyn PixelSource>,
    ) -> Self {
        Self {
            tool_name: config.tool_name.clone(),
            legacy_tool_name: config.legacy_tool_name.clone(),
            label_indexing: config.label_indexing,
            style: config.style.clone(),
            transform,
            stats: PixelStatsCache::new(pixels, config.stats_throttle()),
        }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn stats(&self) -> &PixelStatsCache {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut PixelStatsCache {
        &mut self.stats
    }

    /// Markers of this tool plus the legacy sibling on the frame's surface
    ///
    /// Missing tool state counts as zero.
    pub fn live_count(&self, store: &dyn MarkerStore, frame: &Frame<'_>) -> u32 {
        let own = store.count(frame.surface, &self.tool_name).unwrap_or(0);
        let legacy = self
            .legacy_tool_name
            .as_deref()
            .and_then(|name| store.count(frame.surface, name))
            .unwrap_or(0);
        (own + legacy) as u32
    }

    /// Draw every visible marker of this tool on the frame's surface
    ///
    /// Each marker gets its handle. Markers whose rounded anchor lies inside
    /// the image also get the risk label and then the index label. Returns
    /// the number of markers drawn.
    pub fn render_frame(
        &mut self,
        store: &mut dyn MarkerStore,
        frame: &Frame<'_>,
        ctx: &mut dyn DrawContext,
    ) -> usize {
        let live_count = self.live_count(store, frame);
        let Some(markers) = store.markers_mut(frame.surface, &self.tool_name) else {
            return 0;
        };

        let live: HashSet<MarkerId> = markers.iter().map(Marker::id).collect();
        let pruned = self.stats.retain_surface(frame.surface, &live);
        if pruned > 0 {
            tracing::debug!(surface = frame.surface, pruned, "dropped stats state of removed markers");
        }

        let mut drawn = 0;
        for marker in markers.iter_mut().filter(|marker| marker.is_visible()) {
            if self.label_indexing == LabelIndexing::LiveCount && marker.fid() == 0 {
                marker.set_fid(live_count);
            }
            self.draw_marker(marker, frame, ctx);
            drawn += 1;
        }

        tracing::trace!(surface = frame.surface, drawn, "probe markers rendered");
        drawn
    }

    fn draw_marker(&mut self, marker: &mut Marker, frame: &Frame<'_>, ctx: &mut dyn DrawContext) {
        let color = self.style.color_for(marker);
        let center = self.transform.pixel_to_canvas(frame.surface, marker.anchor());
        ctx.draw_handle(center, self.style.handle_radius, color);

        self.stats
            .refresh(frame.image, frame.surface, marker, frame.now);

        let (x, y) = marker.anchor().rounded();
        if !frame.image.contains(x, y) {
            return;
        }

        let (dx, dy) = self.style.label_offset;
        let text_at = self
            .transform
            .pixel_to_canvas(frame.surface, marker.anchor().offset(dx, dy));

        let risk_text = format!("{}{}", self.style.risk_label_prefix, marker.risk_label());
        let risk_at = CanvasPoint::new(
            text_at.x,
            text_at.y + self.style.font_height + self.style.risk_label_gap,
        );
        ctx.draw_text_box(&risk_text, risk_at, color);
        ctx.draw_text_box(&marker.fid().to_string(), text_at, color);
    }

    /// Earliest time a deferred stats recompute needs a frame
    pub fn next_deadline(&self) -> Option<Instant> {
        self.stats.next_deadline()
    }
}

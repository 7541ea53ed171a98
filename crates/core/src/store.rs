//! Marker storage per surface
//!
//! Markers belong to a (surface, tool name) pair and keep insertion order,
//! which is the order used for hit-testing and rendering.

use crate::marker::{Marker, MarkerId};
use std::collections::HashMap;

/// Identifier of a host surface (one displayed image element)
pub type SurfaceId = u64;

/// Keyed marker storage provided by the host
pub trait MarkerStore {
    /// Markers for a tool on a surface, `None` if none were ever registered
    fn markers(&self, surface: SurfaceId, tool: &str) -> Option<&[Marker]>;

    /// Mutable markers for a tool on a surface
    fn markers_mut(&mut self, surface: SurfaceId, tool: &str) -> Option<&mut [Marker]>;

    /// Append a marker
    fn insert(&mut self, surface: SurfaceId, tool: &str, marker: Marker);

    /// Number of markers registered for a tool on a surface
    fn count(&self, surface: SurfaceId, tool: &str) -> Option<usize> {
        self.markers(surface, tool).map(|markers| markers.len())
    }

    /// Find a marker by ID
    fn find_mut(&mut self, surface: SurfaceId, tool: &str, id: MarkerId) -> Option<&mut Marker> {
        self.markers_mut(surface, tool)?
            .iter_mut()
            .find(|marker| marker.id() == id)
    }
}

/// In-memory `MarkerStore`
#[derive(Debug, Default)]
pub struct MarkerCollection {
    by_surface: HashMap<SurfaceId, HashMap<String, Vec<Marker>>>,
}

impl MarkerCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a marker by ID
    pub fn remove(&mut self, surface: SurfaceId, tool: &str, id: MarkerId) -> Option<Marker> {
        let markers = self.by_surface.get_mut(&surface)?.get_mut(tool)?;
        let index = markers.iter().position(|marker| marker.id() == id)?;
        Some(markers.remove(index))
    }

    /// Drop every marker on a surface
    pub fn clear_surface(&mut self, surface: SurfaceId) {
        self.by_surface.remove(&surface);
    }

    /// Total markers across all surfaces and tools
    pub fn len(&self) -> usize {
        self.by_surface
            .values()
            .flat_map(|tools| tools.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MarkerStore for MarkerCollection {
    fn markers(&self, surface: SurfaceId, tool: &str) -> Option<&[Marker]> {
        self.by_surface
            .get(&surface)
            .and_then(|tools| tools.get(tool))
            .map(Vec::as_slice)
    }

    fn markers_mut(&mut self, surface: SurfaceId, tool: &str) -> Option<&mut [Marker]> {
        self.by_surface
            .get_mut(&surface)
            .and_then(|tools| tools.get_mut(tool))
            .map(Vec::as_mut_slice)
    }

    fn insert(&mut self, surface: SurfaceId, tool: &str, marker: Marker) {
        self.by_surface
            .entry(surface)
            .or_default()
            .entry(tool.to_string())
            .or_default()
            .push(marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ImagePoint;

    fn marker(x: f64) -> Marker {
        Marker::new(ImagePoint::new(x, 0.0), "")
    }

    #[test]
    fn test_unknown_surface_has_no_markers() {
        let store = MarkerCollection::new();
        assert!(store.markers(1, "AIProbe").is_none());
        assert_eq!(store.count(1, "AIProbe"), None);
    }

    #[test]
    fn test_insert_keeps_order_per_tool() {
        let mut store = MarkerCollection::new();
        store.insert(1, "AIProbe", marker(1.0));
        store.insert(1, "AIProbe", marker(2.0));
        store.insert(1, "Probe", marker(3.0));
        store.insert(2, "AIProbe", marker(4.0));

        let xs: Vec<f64> = store
            .markers(1, "AIProbe")
            .unwrap()
            .iter()
            .map(|m| m.anchor().x)
            .collect();
        assert_eq!(xs, vec![1.0, 2.0]);
        assert_eq!(store.count(1, "Probe"), Some(1));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_find_and_remove() {
        let mut store = MarkerCollection::new();
        let m = marker(5.0);
        let id = m.id();
        store.insert(7, "AIProbe", m);

        store.find_mut(7, "AIProbe", id).unwrap().set_visible(false);
        assert!(!store.markers(7, "AIProbe").unwrap()[0].is_visible());

        assert!(store.find_mut(7, "Probe", id).is_none());
        assert_eq!(store.remove(7, "AIProbe", id).map(|m| m.id()), Some(id));
        assert_eq!(store.count(7, "AIProbe"), Some(0));
    }

    #[test]
    fn test_clear_surface() {
        let mut store = MarkerCollection::new();
        store.insert(1, "AIProbe", marker(1.0));
        store.insert(2, "AIProbe", marker(1.0));
        store.clear_surface(1);
        assert!(store.markers(1, "AIProbe").is_none());
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}

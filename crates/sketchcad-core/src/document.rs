//! Shape collection owned by a view.

use crate::geom;
use crate::shapes::{HitResult, Shape, ShapeId};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A document containing all committed shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeDocument {
    /// Unique document identifier.
    pub id: String,
    /// All shapes in the document, keyed by ID.
    shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    z_order: Vec<ShapeId>,
    /// Last id handed out.
    #[serde(default)]
    last_id: ShapeId,
}

impl Default for ShapeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shapes: HashMap::new(),
            z_order: Vec::new(),
            last_id: 0,
        }
    }

    /// Get a shape by ID.
    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Shapes in z-order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Shape ids in z-order (back to front).
    pub fn ids(&self) -> &[ShapeId] {
        &self.z_order
    }

    /// Add a shape on top of the z-order and return its new id.
    pub fn add_shape(&mut self, mut shape: Shape) -> ShapeId {
        self.last_id += 1;
        let id = self.last_id;
        shape.set_id(id);
        self.z_order.push(id);
        self.shapes.insert(id, shape);
        id
    }

    /// Replace the shape with the same id. Fails if the id is unknown or the
    /// replacement is a different kind of shape.
    pub fn update_shape(&mut self, shape: Shape) -> bool {
        match self.shapes.get_mut(&shape.id()) {
            Some(existing) if existing.kind() == shape.kind() => {
                *existing = shape;
                true
            }
            _ => false,
        }
    }

    /// Remove a shape from the document.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.z_order.retain(|&shape_id| shape_id != id);
        self.shapes.remove(&id)
    }

    /// Clear all shapes from the document.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Get the number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Find the visible shape nearest to the center of `hit_box`.
    ///
    /// Only shapes whose bounds touch the box are tested. A point inside a
    /// filled closed shape counts as distance zero. Ties go to the topmost shape.
    pub fn hit_test(&self, hit_box: Rect, tolerance: f64) -> Option<(ShapeId, HitResult)> {
        let pt = hit_box.center();
        let mut best: Option<(ShapeId, HitResult)> = None;

        for &id in self.z_order.iter().rev() {
            let Some(shape) = self.shapes.get(&id) else {
                continue;
            };
            if !shape.is_visible() || !geom::rects_touch(shape.bounds(), hit_box) {
                continue;
            }
            let mut res = shape.hit_test(pt, tolerance);
            if res.inside && shape.style().fill_color.is_some() {
                res.dist = 0.0;
            }
            if res.dist <= tolerance && best.is_none_or(|(_, b)| res.dist < b.dist) {
                best = Some((id, res));
            }
        }
        best
    }

    /// Ids of visible shapes crossing or inside `rect`, in z-order.
    pub fn shapes_in_rect(&self, rect: Rect) -> Vec<ShapeId> {
        self.iter()
            .filter(|s| s.is_visible() && s.hit_test_box(rect))
            .map(|s| s.id())
            .collect()
    }

    /// Bounding box of all visible shapes, or an empty rect.
    pub fn extent(&self) -> Rect {
        self.iter()
            .filter(|s| s.is_visible())
            .map(|s| s.bounds())
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

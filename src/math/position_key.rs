use std::collections::HashMap;

use super::{effective_tolerance, Point3};

/// Tolerance-based point identity.
///
/// Two keys match when every coordinate differs by at most the tolerance.
/// Matching is not transitive, so keys are never hashed directly; they are
/// bucketed by [`PositionIndex`].
#[derive(Debug, Clone, Copy)]
pub struct PositionKey {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub tolerance: f64,
}

impl PositionKey {
    /// Creates a key for `point`. The tolerance is floored at
    /// [`MIN_TOLERANCE`](super::MIN_TOLERANCE).
    #[must_use]
    pub fn new(point: &Point3, tolerance: f64) -> Self {
        Self {
            x: point.x,
            y: point.y,
            z: point.z,
            tolerance: effective_tolerance(tolerance),
        }
    }

    /// Returns `true` if both keys denote the same position.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        let tol = self.tolerance.max(other.tolerance);
        (self.x - other.x).abs() <= tol
            && (self.y - other.y).abs() <= tol
            && (self.z - other.z).abs() <= tol
    }

    /// Returns the point this key was built from.
    #[must_use]
    pub fn point(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

type Cell = [i64; 3];

/// Largest cell coordinate; quantized values are clamped to it so the
/// neighbour offsets never overflow.
const CELL_LIMIT: i64 = i64::MAX / 2;

/// Uniform grid mapping positions to values under tolerance equality.
///
/// The cell size equals the tolerance, so two matching points quantize to
/// the same or an adjacent cell; lookups scan the 9 (planar) or 27
/// surrounding cells.
#[derive(Debug, Clone)]
pub struct PositionIndex<V> {
    tolerance: f64,
    planar: bool,
    cells: HashMap<Cell, Vec<(PositionKey, V)>>,
    len: usize,
}

impl<V: Copy> PositionIndex<V> {
    /// Creates an empty index. `planar` restricts lookups to the `z = 0` layer.
    #[must_use]
    pub fn new(tolerance: f64, planar: bool) -> Self {
        Self {
            tolerance: effective_tolerance(tolerance),
            planar,
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// The (floored) tolerance of this index.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Number of distinct positions stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no position is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Looks up the value stored for a position matching `point`.
    #[must_use]
    pub fn get(&self, point: &Point3) -> Option<V> {
        let key = PositionKey::new(point, self.tolerance);
        let [cx, cy, cz] = self.cell_of(point);
        let dz_range = if self.planar { 0..=0 } else { -1..=1 };
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in dz_range.clone() {
                    let cell = [cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz)];
                    let Some(bucket) = self.cells.get(&cell) else {
                        continue;
                    };
                    if let Some((_, value)) = bucket.iter().find(|(k, _)| k.matches(&key)) {
                        return Some(*value);
                    }
                }
            }
        }
        None
    }

    /// Returns the value for `point`, inserting `make()` if no matching
    /// position exists. The flag is `true` when a new entry was created.
    pub fn get_or_insert_with(&mut self, point: &Point3, make: impl FnOnce() -> V) -> (V, bool) {
        if let Some(existing) = self.get(point) {
            return (existing, false);
        }
        let value = make();
        let key = PositionKey::new(point, self.tolerance);
        let cell = self.cell_of(point);
        self.cells
            .entry(cell)
            .or_default()
            .push((key, value));
        self.len += 1;
        (value, true)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn cell_of(&self, point: &Point3) -> Cell {
        let limit = CELL_LIMIT as f64;
        let q = |v: f64| (v / self.tolerance).floor().clamp(-limit, limit) as i64;
        [q(point.x), q(point.y), if self.planar { 0 } else { q(point.z) }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn zero_tolerance_uses_floor() {
        let a = PositionKey::new(&p(1.0, 2.0, 3.0), 0.0);
        let b = PositionKey::new(&p(1.0 + 1e-15, 2.0, 3.0), 0.0);
        assert!(a.matches(&b));
        let c = PositionKey::new(&p(1.0 + 1e-9, 2.0, 3.0), 0.0);
        assert!(!a.matches(&c));
    }

    #[test]
    fn matching_is_per_coordinate() {
        let a = PositionKey::new(&p(0.0, 0.0, 0.0), 0.1);
        assert!(a.matches(&PositionKey::new(&p(0.1, -0.1, 0.1), 0.1)));
        assert!(!a.matches(&PositionKey::new(&p(0.0, 0.0, 0.11), 0.1)));
    }

    #[test]
    fn index_dedups_across_cell_boundaries() {
        let mut index = PositionIndex::new(1e-3, false);
        // Straddle a cell boundary at x = 1.0 (cell size 1e-3).
        let (first, created) = index.get_or_insert_with(&p(0.999_999_9, 0.0, 0.0), || 7);
        assert!(created);
        let (second, created) = index.get_or_insert_with(&p(1.000_000_1, 0.0, 0.0), || 8);
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn index_keeps_distinct_points_apart() {
        let mut index = PositionIndex::new(1e-6, false);
        index.get_or_insert_with(&p(0.0, 0.0, 0.0), || 1);
        index.get_or_insert_with(&p(0.0, 0.0, 1e-3), || 2);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&p(0.0, 0.0, 1e-3)), Some(2));
        assert_eq!(index.get(&p(0.0, 1.0, 0.0)), None);
    }

    #[test]
    fn far_coordinates_at_the_tolerance_floor() {
        let mut index = PositionIndex::new(0.0, false);
        let far = p(1.0e7, -1.0e7, 1.0e7 + 0.5);
        let (a, created) = index.get_or_insert_with(&far, || 1);
        assert!(created);
        let (b, _) = index.get_or_insert_with(&p(1.0e7 + 1.0, -1.0e7, 1.0e7 + 0.5), || 2);
        let (c, created) = index.get_or_insert_with(&far, || 3);
        assert!(!created);
        assert_eq!((a, b, c), (1, 2, 1));
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&p(-1.0e300, 0.0, 0.0)), None);
    }

    #[test]
    fn planar_index_ignores_z_layers() {
        let mut index = PositionIndex::new(1e-6, true);
        index.get_or_insert_with(&p(0.5, 0.5, 0.0), || 3);
        assert_eq!(index.get(&p(0.5, 0.5 + 1e-7, 0.0)), Some(3));
        assert!(!index.is_empty());
    }
}

use std::fmt;

use crate::math::Vector3;

/// Spatial dimension of the generator variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Plane problems: line boundaries extruded into 4-node quads.
    Two,
    /// Solid problems: quad boundaries extruded into 8-node hexahedra.
    Three,
}

impl Dimension {
    /// Boundary sides available in this dimension, in canonical order.
    #[must_use]
    pub fn sides(self) -> &'static [BoundarySide] {
        match self {
            Self::Two => &[BoundarySide::Bottom, BoundarySide::Left, BoundarySide::Right],
            Self::Three => &BoundarySide::ALL,
        }
    }

    /// Number of nodes of a boundary-tagged source element.
    #[must_use]
    pub fn face_nodes(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 4,
        }
    }

    /// Number of nodes of a generated absorbing element.
    #[must_use]
    pub fn element_nodes(self) -> usize {
        2 * self.face_nodes()
    }

    /// Solver element type name.
    #[must_use]
    pub fn element_type(self) -> &'static str {
        match self {
            Self::Two => "AbsorbingBoundary2D",
            Self::Three => "AbsorbingBoundary3D",
        }
    }

    /// Number of coordinates written per node.
    #[must_use]
    pub fn coordinates(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// Which end of an axis a side sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
}

/// A face of the domain bounding box that receives absorbing elements.
///
/// The top of the domain is a free surface and has no side. The
/// discriminant is the canonical order used for codes, ownership and
/// partition propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BoundarySide {
    Bottom = 0,
    Left = 1,
    Right = 2,
    Front = 3,
    Back = 4,
}

impl BoundarySide {
    /// All sides in canonical order.
    pub const ALL: [Self; 5] = [Self::Bottom, Self::Left, Self::Right, Self::Front, Self::Back];

    /// Letter used in the solver's boundary code.
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Self::Bottom => 'B',
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Front => 'F',
            Self::Back => 'K',
        }
    }

    /// Lower-case name, for messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Front => "front",
            Self::Back => "back",
        }
    }

    /// Coordinate axis (0 = x, 1 = y, 2 = z) and extreme of the box face.
    #[must_use]
    pub fn axis(self, dim: Dimension) -> (usize, Extreme) {
        match (self, dim) {
            (Self::Bottom, Dimension::Two) => (1, Extreme::Min),
            (Self::Bottom, Dimension::Three) => (2, Extreme::Min),
            (Self::Left, _) => (0, Extreme::Min),
            (Self::Right, _) => (0, Extreme::Max),
            (Self::Front, _) => (1, Extreme::Min),
            (Self::Back, _) => (1, Extreme::Max),
        }
    }

    /// Outward unit extrusion direction.
    #[must_use]
    pub fn direction(self, dim: Dimension) -> Vector3 {
        let (axis, extreme) = self.axis(dim);
        let mut v = Vector3::zeros();
        v[axis] = match extreme {
            Extreme::Min => -1.0,
            Extreme::Max => 1.0,
        };
        v
    }

    /// Fixed in-plane tangent of the side.
    ///
    /// In 3D this is `+x` for bottom, front and back and `+y` for left and
    /// right. In 2D it is the outward direction rotated by +90 degrees, so
    /// that `direction x tangent` is positive.
    #[must_use]
    pub fn tangent(self, dim: Dimension) -> Vector3 {
        match dim {
            Dimension::Two => {
                let d = self.direction(dim);
                Vector3::new(-d.y, d.x, 0.0)
            }
            Dimension::Three => match self {
                Self::Left | Self::Right => Vector3::y(),
                Self::Bottom | Self::Front | Self::Back => Vector3::x(),
            },
        }
    }

    /// Second in-plane axis, `direction x tangent` (3D only; zero in 2D).
    #[must_use]
    pub fn bitangent(self, dim: Dimension) -> Vector3 {
        match dim {
            Dimension::Two => Vector3::zeros(),
            Dimension::Three => self.direction(dim).cross(&self.tangent(dim)),
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for BoundarySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Order-independent set of boundary sides, stored as a bitmask.
///
/// One side is a face, two an edge, three a corner of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BoundaryCombo(u8);

impl BoundaryCombo {
    /// The empty set (an original, non-extruded node).
    pub const EMPTY: Self = Self(0);

    /// A combo holding a single side.
    #[must_use]
    pub fn single(side: BoundarySide) -> Self {
        Self(side.bit())
    }

    /// Raw bitmask, bit `i` standing for the side with discriminant `i`.
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of sides in the set.
    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub fn contains(self, side: BoundarySide) -> bool {
        self.0 & side.bit() != 0
    }

    /// Returns the set with `side` added.
    #[must_use]
    pub fn with(self, side: BoundarySide) -> Self {
        Self(self.0 | side.bit())
    }

    /// Adds `side` in place.
    pub fn insert(&mut self, side: BoundarySide) {
        self.0 |= side.bit();
    }

    /// Members in canonical order.
    pub fn iter(self) -> impl Iterator<Item = BoundarySide> {
        BoundarySide::ALL.into_iter().filter(move |s| self.contains(*s))
    }

    /// Lowest member in canonical order.
    #[must_use]
    pub fn lowest(self) -> Option<BoundarySide> {
        self.iter().next()
    }

    /// All non-empty subsets, enumerated as bitmasks `1..2^n` over the
    /// members.
    pub fn subsets(self) -> impl Iterator<Item = Self> {
        let members: Vec<BoundarySide> = self.iter().collect();
        let count: u8 = 1 << members.len();
        (1..count).map(move |mask| {
            members
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .fold(Self::EMPTY, |acc, (_, side)| acc.with(*side))
        })
    }

    /// Boundary code: member letters in canonical order.
    #[must_use]
    pub fn code(self) -> String {
        self.iter().map(BoundarySide::letter).collect()
    }

    /// Extrusion vector: normalized sum of member directions times `size`.
    ///
    /// Returns `None` for the empty set and for opposing sides whose
    /// directions cancel out.
    #[must_use]
    pub fn extrusion(self, dim: Dimension, size: f64) -> Option<Vector3> {
        let sum = self
            .iter()
            .fold(Vector3::zeros(), |acc, s| acc + s.direction(dim));
        let len = sum.norm();
        if len < 0.5 {
            return None;
        }
        Some(sum / len * size)
    }
}

impl From<BoundarySide> for BoundaryCombo {
    fn from(side: BoundarySide) -> Self {
        Self::single(side)
    }
}

impl FromIterator<BoundarySide> for BoundaryCombo {
    fn from_iter<I: IntoIterator<Item = BoundarySide>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for BoundaryCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

//! Axis-aligned rectangles for hitboxes and tiles
//!
//! All geometry is in integer pixels. Overlap requires non-zero area:
//! rectangles that only share an edge do not collide.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub pos: IVec2,
    pub size: IVec2,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            pos: IVec2::new(x, y),
            size: IVec2::new(w, h),
        }
    }

    pub fn from_origin(pos: IVec2, size: i32) -> Self {
        Self {
            pos,
            size: IVec2::splat(size),
        }
    }

    /// Exclusive bottom-right corner
    #[inline]
    pub fn max(&self) -> IVec2 {
        self.pos + self.size
    }

    #[inline]
    pub fn center(&self) -> IVec2 {
        self.pos + self.size / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    /// True iff the two rectangles share a region of non-zero area
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let a_max = self.max();
        let b_max = other.max();
        self.pos.x < b_max.x && other.pos.x < a_max.x && self.pos.y < b_max.y && other.pos.y < a_max.y
    }

    /// Copy moved by `delta`
    #[inline]
    pub fn translated(&self, delta: IVec2) -> Rect {
        Rect {
            pos: self.pos + delta,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_edge_contact_is_not_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(!a.intersects(&Rect::new(10, 0, 10, 10)));
        assert!(!a.intersects(&Rect::new(0, 10, 10, 10)));
        assert!(!a.intersects(&Rect::new(10, 10, 10, 10)));
    }

    #[test]
    fn test_empty_never_overlaps() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(!a.intersects(&Rect::new(5, 5, 0, 4)));
    }

    proptest! {
        #[test]
        fn prop_intersects_is_symmetric(
            ax in -100i32..100, ay in -100i32..100, aw in 1i32..50, ah in 1i32..50,
            bx in -100i32..100, by in -100i32..100, bw in 1i32..50, bh in 1i32..50,
        ) {
            let a = Rect::new(ax, ay, aw, ah);
            let b = Rect::new(bx, by, bw, bh);
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        #[test]
        fn prop_adjacent_rects_never_overlap(x in -100i32..100, y in -100i32..100, w in 1i32..50, h in 1i32..50) {
            let a = Rect::new(x, y, w, h);
            prop_assert!(!a.intersects(&a.translated(IVec2::new(w, 0))));
            prop_assert!(!a.intersects(&a.translated(IVec2::new(0, h))));
            prop_assert!(a.intersects(&a));
        }
    }
}

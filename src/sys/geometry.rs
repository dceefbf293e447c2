//! Integer screen geometry shared by the tiling engine and the window host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A rectangle in absolute screen coordinates, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> i32 { self.left + self.width }

    pub fn bottom(&self) -> i32 { self.top + self.height }

    pub fn area(&self) -> i64 { i64::from(self.width.max(0)) * i64::from(self.height.max(0)) }

    pub fn is_empty(&self) -> bool { self.width <= 0 || self.height <= 0 }

    /// Translates a rect expressed relative to `origin`'s top left corner into absolute coordinates.
    pub fn offset_by(&self, origin: &Rect) -> Rect {
        Rect {
            left: origin.left + self.left,
            top: origin.top + self.top,
            ..*self
        }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let left = self.left.max(other.left);
        let right = self.right().min(other.right());
        let top = self.top.max(other.top);
        let bottom = self.bottom().min(other.bottom());
        Rect {
            left,
            top,
            width: (right - left).max(0),
            height: (bottom - top).max(0),
        }
    }

    pub fn contains_rect(&self, other: &Self) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.left, self.top)
    }
}

/// Parses `left,top,width,height`.
impl FromStr for Rect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [left, top, width, height] = parts.as_slice() else {
            return Err(format!("expected LEFT,TOP,WIDTH,HEIGHT, got '{s}'"));
        };
        let num = |v: &str| v.parse::<i32>().map_err(|e| format!("invalid number '{v}': {e}"));
        Ok(Rect::new(num(left)?, num(top)?, num(width)?, num(height)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_and_area() {
        let r = Rect::new(10, 20, 300, 200);
        assert_eq!(r.right(), 310);
        assert_eq!(r.bottom(), 220);
        assert_eq!(r.area(), 60_000);
        assert!(!r.is_empty());
        assert!(Rect::new(0, 0, 0, 10).is_empty());
    }

    #[test]
    fn intersection_of_disjoint_rects_is_empty() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(100, 0, 100, 100);
        assert!(a.intersection(&b).is_empty());
        assert_eq!(a.intersection(&Rect::new(50, 50, 100, 100)), Rect::new(50, 50, 50, 50));
    }

    #[test]
    fn offset_and_containment() {
        let host = Rect::new(100, 50, 1000, 800);
        let local = Rect::new(500, 400, 500, 400);
        let placed = local.offset_by(&host);
        assert_eq!(placed, Rect::new(600, 450, 500, 400));
        assert!(host.contains_rect(&placed));
        assert!(!host.contains_rect(&Rect::new(600, 450, 501, 400)));
    }

    #[test]
    fn parses_comma_separated_frames() {
        assert_eq!("0, 25,1920,1055".parse::<Rect>(), Ok(Rect::new(0, 25, 1920, 1055)));
        assert!("1920x1080".parse::<Rect>().is_err());
        assert!("a,b,c,d".parse::<Rect>().is_err());
    }
}

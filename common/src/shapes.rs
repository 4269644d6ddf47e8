use rand::Rng;

/// Axis-aligned box anchored at its minimum corner.
///
/// `x`/`y` is the left/top corner, `w`/`h` the extent along each axis. The y
/// axis grows downward, so `top() <= bottom()`.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Box of the given size anchored at the origin.
    pub fn from_size(w: f32, h: f32) -> Self {
        Self::new(0.0, 0.0, w, h)
    }

    pub fn width(&self) -> f32 {
        self.w
    }

    pub fn height(&self) -> f32 {
        self.h
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// All components finite and both extents non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w >= 0.0
            && self.h >= 0.0
    }

    /// Splits the box into four equal quadrants.
    ///
    /// The order is fixed: 0 = low-x/low-y, 1 = low-x/high-y,
    /// 2 = high-x/low-y, 3 = high-x/high-y. Quadrant `i` of a branch node
    /// always lives at `first_child + i`, so this order must never change.
    pub fn split(&self) -> [BBox; 4] {
        let half_w = self.w * 0.5;
        let half_h = self.h * 0.5;
        let mid_x = self.x + half_w;
        let mid_y = self.y + half_h;
        [
            BBox::new(self.x, self.y, half_w, half_h),
            BBox::new(self.x, mid_y, half_w, half_h),
            BBox::new(mid_x, self.y, half_w, half_h),
            BBox::new(mid_x, mid_y, half_w, half_h),
        ]
    }

    /// True when the two boxes share interior area.
    ///
    /// Boxes that only touch along an edge do not overlap. A degenerate
    /// (zero-extent) axis is treated as a closed point so that points and
    /// lines still register against the regions they sit in.
    pub fn overlaps(&self, other: &BBox) -> bool {
        spans_overlap(self.left(), self.right(), other.left(), other.right())
            && spans_overlap(self.top(), self.bottom(), other.top(), other.bottom())
    }

    /// True when `inner` lies entirely within `self`, edges inclusive.
    pub fn contains(&self, inner: &BBox) -> bool {
        inner.left() >= self.left()
            && inner.right() <= self.right()
            && inner.top() >= self.top()
            && inner.bottom() <= self.bottom()
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }

    /// Random box of at most `max_w` x `max_h` placed fully inside `self`.
    ///
    /// Sizes and offsets are snapped to whole units so that boxes drawn from a
    /// whole-unit parent stay inside it without rounding drift.
    pub fn random_inside<R: Rng>(&self, max_w: f32, max_h: f32, rng: &mut R) -> BBox {
        let w = self._safe_randf32(rng, 0.0, max_w.min(self.w)).floor();
        let h = self._safe_randf32(rng, 0.0, max_h.min(self.h)).floor();
        let x = self._safe_randf32(rng, self.left(), self.right() - w).floor();
        let y = self._safe_randf32(rng, self.top(), self.bottom() - h).floor();
        BBox::new(x.max(self.left()), y.max(self.top()), w, h)
    }

    fn _safe_randf32<R: Rng>(&self, rng: &mut R, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        rng.gen_range(min..=max)
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 0.0,
            h: 0.0,
        }
    }
}

#[inline(always)]
fn spans_overlap(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> bool {
    if a_min == a_max || b_min == b_max {
        a_min <= b_max && b_min <= a_max
    } else {
        a_min < b_max && b_min < a_max
    }
}

#[inline(always)]
pub fn split(bbox: &BBox) -> [BBox; 4] {
    bbox.split()
}

#[inline(always)]
pub fn overlaps(a: &BBox, b: &BBox) -> bool {
    a.overlaps(b)
}

#[inline(always)]
pub fn contains(outer: &BBox, inner: &BBox) -> bool {
    outer.contains(inner)
}

use bevy::math::Vec2;

/// Axis-aligned rectangle in screen space (y grows downward, so `min_y` is
/// the top edge).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn from_top_left(top_left: Vec2, size: Vec2) -> Self {
        Self::new(top_left.x, top_left.y, size.x, size.y)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    pub fn left(&self) -> f32 {
        self.min_x
    }

    pub fn right(&self) -> f32 {
        self.max_x
    }

    pub fn top(&self) -> f32 {
        self.min_y
    }

    pub fn bottom(&self) -> f32 {
        self.max_y
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.min_x, self.min_y)
    }

    pub fn center_x(&self) -> f32 {
        (self.min_x + self.max_x) * 0.5
    }

    pub fn center_y(&self) -> f32 {
        (self.min_y + self.max_y) * 0.5
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x(), self.center_y())
    }

    pub fn mid_left(&self) -> Vec2 {
        Vec2::new(self.min_x, self.center_y())
    }

    pub fn mid_right(&self) -> Vec2 {
        Vec2::new(self.max_x, self.center_y())
    }

    pub fn mid_bottom(&self) -> Vec2 {
        Vec2::new(self.center_x(), self.max_y)
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.min_x += dx;
        self.max_x += dx;
        self.min_y += dy;
        self.max_y += dy;
    }

    pub fn set_left(&mut self, x: f32) {
        self.translate(x - self.min_x, 0.0);
    }

    pub fn set_right(&mut self, x: f32) {
        self.translate(x - self.max_x, 0.0);
    }

    pub fn set_top(&mut self, y: f32) {
        self.translate(0.0, y - self.min_y);
    }

    pub fn set_bottom(&mut self, y: f32) {
        self.translate(0.0, y - self.max_y);
    }

    pub fn set_center_x(&mut self, x: f32) {
        self.translate(x - self.center_x(), 0.0);
    }

    pub fn set_mid_left(&mut self, point: Vec2) {
        self.translate(point.x - self.min_x, point.y - self.center_y());
    }

    pub fn set_mid_right(&mut self, point: Vec2) {
        self.translate(point.x - self.max_x, point.y - self.center_y());
    }

    pub fn set_bottom_left(&mut self, point: Vec2) {
        self.translate(point.x - self.min_x, point.y - self.max_y);
    }

    /// Strict overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Inclusive containment of `other` inside `self`.
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = Aabb::new(9.5, 9.5, 10.0, 10.0);
        assert!(a.intersects(&c));
    }

    #[test]
    fn containment_is_inclusive() {
        let outer = Aabb::new(0.0, 0.0, 100.0, 20.0);
        assert!(outer.contains(&Aabb::new(0.0, 0.0, 100.0, 20.0)));
        assert!(outer.contains(&Aabb::new(10.0, 5.0, 20.0, 15.0)));
        assert!(!outer.contains(&Aabb::new(90.0, 5.0, 20.0, 15.0)));
    }

    #[test]
    fn edge_setters_preserve_size() {
        let mut r = Aabb::new(3.0, 4.0, 12.0, 8.0);
        r.set_right(50.0);
        assert_eq!(r.left(), 38.0);
        r.set_bottom(100.0);
        assert_eq!(r.top(), 92.0);
        r.set_center_x(0.0);
        assert_eq!(r.left(), -6.0);
        assert_eq!(r.size(), Vec2::new(12.0, 8.0));
    }

    #[test]
    fn mid_anchors_align_with_points() {
        let mut r = Aabb::new(0.0, 0.0, 10.0, 4.0);
        r.set_mid_left(Vec2::new(20.0, 30.0));
        assert_eq!(r.mid_left(), Vec2::new(20.0, 30.0));
        r.set_mid_right(Vec2::new(5.0, 5.0));
        assert_eq!(r.mid_right(), Vec2::new(5.0, 5.0));
        r.set_bottom_left(Vec2::new(1.0, 9.0));
        assert_eq!(r.top_left(), Vec2::new(1.0, 5.0));
    }
}

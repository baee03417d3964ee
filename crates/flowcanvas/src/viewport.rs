use serde::{Deserialize, Serialize};

use crate::config::ZoomBounds;
use crate::geometry::{Point, Rect, Size};
use crate::model::Node;

/// Pan offset (screen pixels) and zoom factor of the canvas.
///
/// Screen points are relative to the canvas origin; callers subtract the
/// canvas widget position before converting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    pub fn pan_offset(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn screen_to_world(&self, s: Point) -> Point {
        (s - self.pan_offset()) / self.zoom
    }

    pub fn world_to_screen(&self, w: Point) -> Point {
        w * self.zoom + self.pan_offset()
    }

    /// Screen-space deltas are applied unscaled.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Wheel-style zoom: `zoom - delta * sensitivity`, clamped. Not
    /// anchored at the pointer.
    pub fn zoom_by(&mut self, delta: f64, sensitivity: f64, bounds: &ZoomBounds) {
        self.zoom = bounds.clamp(self.zoom - delta * sensitivity);
    }

    pub fn set_zoom(&mut self, zoom: f64, bounds: &ZoomBounds) {
        self.zoom = bounds.clamp(zoom);
    }

    pub fn zoom_step(&mut self, step: f64, bounds: &ZoomBounds) {
        self.set_zoom(self.zoom + step, bounds);
    }

    /// The world rectangle currently visible on a canvas of `canvas` pixels.
    pub fn visible_world_rect(&self, canvas: Size) -> Rect {
        let origin = self.screen_to_world(Point::ZERO);
        Rect::new(
            origin.x,
            origin.y,
            canvas.width / self.zoom,
            canvas.height / self.zoom,
        )
    }

    pub fn visible_world_center(&self, canvas: Size) -> Point {
        self.visible_world_rect(canvas).center()
    }

    /// Pan so `world` lands at the canvas center, keeping the zoom.
    pub fn center_on(&mut self, world: Point, canvas: Size) {
        self.x = -(world.x * self.zoom - canvas.width / 2.0);
        self.y = -(world.y * self.zoom - canvas.height / 2.0);
    }

    /// Zoom (never above 1.0) and pan so `bounds`, padded by
    /// `padding_ratio` of its size on each side, fills the canvas.
    pub fn fit_to(
        &mut self,
        bounds: Rect,
        canvas: Size,
        padding_ratio: f64,
        zoom_bounds: &ZoomBounds,
    ) {
        let padded_w = bounds.width * (1.0 + 2.0 * padding_ratio);
        let padded_h = bounds.height * (1.0 + 2.0 * padding_ratio);
        let mut zoom = 1.0_f64;
        if padded_w > 0.0 {
            zoom = zoom.min(canvas.width / padded_w);
        }
        if padded_h > 0.0 {
            zoom = zoom.min(canvas.height / padded_h);
        }
        self.zoom = zoom_bounds.clamp(zoom);
        self.center_on(bounds.center(), canvas);
    }

    /// Fit every node. Returns false, leaving the viewport alone, when
    /// there are none.
    pub fn fit_nodes(
        &mut self,
        nodes: &[Node],
        canvas: Size,
        padding_ratio: f64,
        zoom_bounds: &ZoomBounds,
    ) -> bool {
        match Rect::bounding(nodes.iter().map(Node::rect)) {
            Some(bounds) => {
                self.fit_to(bounds, canvas, padding_ratio, zoom_bounds);
                true
            }
            None => false,
        }
    }
}

/// Nodes whose box overlaps the visible world rectangle.
pub fn visible_nodes<'a>(nodes: &'a [Node], viewport: &Viewport, canvas: Size) -> Vec<&'a Node> {
    let visible = viewport.visible_world_rect(canvas);
    nodes.iter().filter(|n| visible.intersects(&n.rect())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Viewport::new(0.0, 0.0, 1.0), Point::new(10.0, 20.0))]
    #[case(Viewport::new(-340.0, 125.5, 0.2), Point::new(-1e4, 3e3))]
    #[case(Viewport::new(17.0, -9.0, 2.75), Point::new(0.125, 999.0))]
    fn test_transform_round_trip(#[case] vp: Viewport, #[case] s: Point) {
        let back = vp.world_to_screen(vp.screen_to_world(s));
        assert!(back.distance(s) < 1e-9, "round trip drifted to {:?}", back);
    }

    #[rstest]
    #[case(1.0, 5000.0, 0.2)]
    #[case(1.0, -5000.0, 3.0)]
    #[case(1.0, 100.0, 0.9)]
    fn test_zoom_by_clamps(#[case] start: f64, #[case] delta: f64, #[case] expected: f64) {
        let mut vp = Viewport::new(0.0, 0.0, start);
        vp.zoom_by(delta, 0.001, &ZoomBounds::default());
        assert!((vp.zoom - expected).abs() < 1e-12, "zoom {}", vp.zoom);
    }

    #[test]
    fn test_visible_rect_accounts_for_zoom() {
        let vp = Viewport::new(-200.0, 100.0, 2.0);
        let r = vp.visible_world_rect(Size::new(800.0, 600.0));
        assert_eq!(r, Rect::new(100.0, -50.0, 400.0, 300.0));
    }

    #[test]
    fn test_center_on_puts_point_mid_canvas() {
        let canvas = Size::new(1000.0, 800.0);
        let mut vp = Viewport::new(0.0, 0.0, 1.5);
        vp.center_on(Point::new(300.0, -40.0), canvas);
        let s = vp.world_to_screen(Point::new(300.0, -40.0));
        assert!((s.x - 500.0).abs() < 1e-9 && (s.y - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_never_zooms_in_past_one() {
        let mut vp = Viewport::default();
        vp.fit_to(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Size::new(1000.0, 1000.0),
            0.1,
            &ZoomBounds::default(),
        );
        assert_eq!(vp.zoom, 1.0);
        assert!((vp.x - 450.0).abs() < 1e-9);
    }

    #[test]
    fn test_visible_nodes_follow_pan() {
        use crate::model::{NodeId, NodeKind};
        let nodes: Vec<Node> = [0.0, 900.0, 2000.0]
            .iter()
            .map(|&x| {
                Node::new(
                    NodeId::new(format!("n{x}")),
                    NodeKind::Note,
                    "n",
                    Point::new(x, 0.0),
                    Size::new(200.0, 150.0),
                )
            })
            .collect();
        let canvas = Size::new(1000.0, 600.0);
        let ids = |vp: &Viewport| -> Vec<String> {
            visible_nodes(&nodes, vp, canvas)
                .iter()
                .map(|n| n.id.to_string())
                .collect()
        };
        assert_eq!(ids(&Viewport::default()), vec!["n0", "n900"]);
        assert_eq!(ids(&Viewport::new(-1500.0, 0.0, 1.0)), vec!["n2000"]);
        assert!(!Viewport::default().fit_nodes(&[], canvas, 0.1, &ZoomBounds::default()));
    }

    #[test]
    fn test_fit_shrinks_large_bounds() {
        let mut vp = Viewport::default();
        vp.fit_to(
            Rect::new(0.0, 0.0, 2000.0, 500.0),
            Size::new(1200.0, 800.0),
            0.1,
            &ZoomBounds::default(),
        );
        assert!((vp.zoom - 0.5).abs() < 1e-12);
    }
}

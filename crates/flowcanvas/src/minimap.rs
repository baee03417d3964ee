use crate::config::MinimapConfig;
use crate::geometry::{Point, Rect, Size};
use crate::model::Node;
use crate::viewport::Viewport;

/// Projection of the world onto the fixed-size minimap overlay.
///
/// Minimap coordinates are pixels relative to the overlay's top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapProjection {
    /// Padded world bounds being shown.
    pub bounds: Rect,
    pub scale: f64,
    config: MinimapConfig,
}

impl MinimapProjection {
    /// None when there are no nodes; the overlay is not drawn then.
    pub fn new(nodes: &[Node], config: &MinimapConfig) -> Option<Self> {
        let bounds = Rect::bounding(nodes.iter().map(Node::rect))?.expand(config.world_padding);
        let inner = config.size - 2.0 * config.inner_padding;
        let sx = inner / bounds.width;
        let sy = inner / bounds.height;
        Some(Self {
            bounds,
            scale: sx.min(sy).min(1.0),
            config: *config,
        })
    }

    pub fn size(&self) -> Size {
        Size::new(self.config.size, self.config.size)
    }

    pub fn to_minimap(&self, world: Point) -> Point {
        Point::new(
            self.config.inner_padding + (world.x - self.bounds.x) * self.scale,
            self.config.inner_padding + (world.y - self.bounds.y) * self.scale,
        )
    }

    pub fn to_world(&self, mini: Point) -> Point {
        Point::new(
            (mini.x - self.config.inner_padding) / self.scale + self.bounds.x,
            (mini.y - self.config.inner_padding) / self.scale + self.bounds.y,
        )
    }

    pub fn project_rect(&self, world: Rect) -> Rect {
        let origin = self.to_minimap(world.origin());
        Rect::new(
            origin.x,
            origin.y,
            world.width * self.scale,
            world.height * self.scale,
        )
    }

    /// Outline of what the main canvas currently shows.
    pub fn viewport_rect(&self, viewport: &Viewport, canvas: Size) -> Rect {
        self.project_rect(viewport.visible_world_rect(canvas))
    }

    /// Viewport recentered on the world point under a minimap click.
    pub fn recenter(&self, click: Point, viewport: &Viewport, canvas: Size) -> Viewport {
        let mut next = *viewport;
        next.center_on(self.to_world(click), canvas);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, NodeKind};

    fn node(x: f64, y: f64) -> Node {
        Node::new(
            NodeId::new(format!("{x}:{y}")),
            NodeKind::Task,
            "n",
            Point::new(x, y),
            Size::new(200.0, 100.0),
        )
    }

    #[test]
    fn test_no_nodes_no_projection() {
        assert!(MinimapProjection::new(&[], &MinimapConfig::default()).is_none());
    }

    #[test]
    fn test_small_world_is_not_magnified() {
        let p = MinimapProjection::new(&[node(0.0, 0.0)], &MinimapConfig::default()).unwrap();
        assert_eq!(p.scale, 0.4);
        assert_eq!(p.bounds, Rect::new(-100.0, -100.0, 400.0, 300.0));
        assert_eq!(p.to_minimap(Point::new(-100.0, -100.0)), Point::new(20.0, 20.0));
    }

    #[test]
    fn test_projection_round_trip() {
        let nodes = vec![node(-3000.0, 200.0), node(4000.0, 900.0)];
        let p = MinimapProjection::new(&nodes, &MinimapConfig::default()).unwrap();
        let w = Point::new(123.0, 456.0);
        assert!(p.to_world(p.to_minimap(w)).distance(w) < 1e-9);
        assert!(p.scale < 1.0);
    }

    #[test]
    fn test_click_recenters_on_world_point() {
        let nodes = vec![node(0.0, 0.0), node(2000.0, 1500.0)];
        let p = MinimapProjection::new(&nodes, &MinimapConfig::default()).unwrap();
        let canvas = Size::new(1000.0, 800.0);
        let vp = Viewport::new(0.0, 0.0, 0.5);
        let click = Point::new(100.0, 100.0);
        let next = p.recenter(click, &vp, canvas);
        let target = p.to_world(click);
        let s = next.world_to_screen(target);
        assert!((s.x - 500.0).abs() < 1e-9 && (s.y - 400.0).abs() < 1e-9);
        assert_eq!(next.zoom, 0.5);
    }

    #[test]
    fn test_viewport_rect_scales_with_zoom() {
        let p = MinimapProjection::new(&[node(0.0, 0.0)], &MinimapConfig::default()).unwrap();
        let canvas = Size::new(400.0, 300.0);
        let near = p.viewport_rect(&Viewport::new(0.0, 0.0, 2.0), canvas);
        let far = p.viewport_rect(&Viewport::new(0.0, 0.0, 1.0), canvas);
        assert!((far.width - 2.0 * near.width).abs() < 1e-9);
    }
}

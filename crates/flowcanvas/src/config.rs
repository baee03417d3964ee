use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Common slider metadata so bounds live in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SliderRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }
}

pub const ZOOM_RANGE: SliderRange = SliderRange::new(0.2, 3.0, 0.05);

fn default_min_zoom() -> f64 {
    ZOOM_RANGE.min
}

fn default_max_zoom() -> f64 {
    ZOOM_RANGE.max
}

/// Zoom limits applied by every viewport operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomBounds {
    #[serde(default = "default_min_zoom")]
    pub min: f64,
    #[serde(default = "default_max_zoom")]
    pub max: f64,
}

impl ZoomBounds {
    /// Positive, finite and ordered.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && 0.0 < self.min && self.min <= self.max
    }

    /// Never panics: reversed bounds are taken in order and a NaN zoom
    /// becomes 1.0 before clamping.
    pub fn clamp(&self, zoom: f64) -> f64 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        let zoom = if zoom.is_nan() { 1.0 } else { zoom };
        zoom.max(lo).min(hi)
    }
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self {
            min: default_min_zoom(),
            max: default_max_zoom(),
        }
    }
}

/// Parameters of the layered auto-layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal gap between nodes of the same rank.
    pub node_spacing: f64,
    /// Vertical gap between ranks.
    pub rank_spacing: f64,
    pub margin: f64,
    /// Gap between cells of the fallback and isolated-node grids.
    pub grid_spacing: f64,
    /// Vertical gap between the layered block and the isolated grid.
    pub isolated_gap: f64,
    /// Barycenter passes (one down + one up each).
    pub sweeps: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 60.0,
            rank_spacing: 100.0,
            margin: 50.0,
            grid_spacing: 80.0,
            isolated_gap: 150.0,
            sweeps: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    /// Side of the square overlay, in screen pixels.
    pub size: f64,
    pub inner_padding: f64,
    /// World-space padding around the node bounds.
    pub world_padding: f64,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            size: 200.0,
            inner_padding: 20.0,
            world_padding: 100.0,
        }
    }
}

/// Card geometry shared by hit testing and rendering, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardMetrics {
    pub pin_radius: f64,
    pub resize_handle: f64,
    /// Height of the action strip at the bottom of completable cards.
    pub action_bar_height: f64,
    pub group_header_height: f64,
    /// Maximum distance, in world units, for an edge to count as hit.
    pub edge_hit_tolerance: f64,
}

impl Default for CardMetrics {
    fn default() -> Self {
        Self {
            pin_radius: 8.0,
            resize_handle: 16.0,
            action_bar_height: 36.0,
            group_header_height: 40.0,
            edge_hit_tolerance: 6.0,
        }
    }
}

/// Every tunable of the canvas engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Screen pixels of movement before a canvas press becomes a pan.
    pub pan_threshold: f64,
    /// Screen pixels of movement before a node press becomes a drag.
    pub node_drag_threshold: f64,
    pub zoom: ZoomBounds,
    pub wheel_sensitivity: f64,
    pub zoom_step: f64,
    pub long_press_ms: u64,
    pub min_node_size: Size,
    pub min_group_size: Size,
    pub default_node_size: Size,
    pub flashcard_height: f64,
    pub default_group_size: Size,
    pub fit_padding_ratio: f64,
    pub card: CardMetrics,
    pub layout: LayoutConfig,
    pub minimap: MinimapConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            pan_threshold: 5.0,
            node_drag_threshold: 8.0,
            zoom: ZoomBounds::default(),
            wheel_sensitivity: 0.001,
            zoom_step: 0.1,
            long_press_ms: 500,
            min_node_size: Size::new(180.0, 120.0),
            min_group_size: Size::new(200.0, 150.0),
            default_node_size: Size::new(260.0, 180.0),
            flashcard_height: 220.0,
            default_group_size: Size::new(400.0, 300.0),
            fit_padding_ratio: 0.1,
            card: CardMetrics::default(),
            layout: LayoutConfig::default(),
            minimap: MinimapConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: CanvasConfig =
            serde_json::from_str(r#"{ "pan_threshold": 3.0, "zoom": { "max": 2.0 } }"#)
                .unwrap();
        assert_eq!(cfg.pan_threshold, 3.0);
        assert_eq!(cfg.node_drag_threshold, 8.0);
        assert_eq!(cfg.zoom.min, 0.2);
        assert_eq!(cfg.zoom.max, 2.0);
        assert_eq!(cfg.layout.rank_spacing, 100.0);
    }

    #[test]
    fn test_reversed_zoom_bounds_clamp_without_panic() {
        let cfg: CanvasConfig = serde_json::from_str(r#"{ "zoom": { "max": 0.1 } }"#).unwrap();
        assert!(!cfg.zoom.is_valid());
        assert_eq!(cfg.zoom.clamp(1.0), 0.2);
        assert_eq!(cfg.zoom.clamp(0.05), 0.1);
        assert_eq!(ZoomBounds::default().clamp(f64::NAN), 1.0);
        assert!(ZoomBounds::default().is_valid());
    }
}

//! Fit-to-view: choose a viewport that shows the whole tree centered.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::viewport::{Viewport, MIN_SCALE};
use crate::domain::{ContainerSize, Position};

/// Margins added around node anchors so that cards near the edge are not
/// clipped. A card is drawn roughly 260 wide and extends further below its
/// anchor than above it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub node_half_width: f64,
    pub node_top: f64,
    pub node_bottom: f64,
    pub padding: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            node_half_width: 130.0,
            node_top: 50.0,
            node_bottom: 150.0,
            padding: 40.0,
        }
    }
}

/// Axis-aligned world-space box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn of<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        positions
            .into_iter()
            .filter(|p| p.is_finite())
            .fold(None, |acc: Option<Self>, p| {
                Some(match acc {
                    None => Self {
                        min_x: p.x,
                        min_y: p.y,
                        max_x: p.x,
                        max_y: p.y,
                    },
                    Some(b) => Self {
                        min_x: b.min_x.min(p.x),
                        min_y: b.min_y.min(p.y),
                        max_x: b.max_x.max(p.x),
                        max_y: b.max_y.max(p.y),
                    },
                })
            })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Position {
        Position::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FitToView {
    config: FitConfig,
}

impl FitToView {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    /// Node bounding box grown by the card margins.
    pub fn padded_bounds<'a>(&self, positions: impl IntoIterator<Item = &'a Position>) -> Option<BoundingBox> {
        let c = &self.config;
        BoundingBox::of(positions).map(|b| BoundingBox {
            min_x: b.min_x - (c.node_half_width + c.padding),
            max_x: b.max_x + (c.node_half_width + c.padding),
            min_y: b.min_y - (c.node_top + c.padding),
            max_y: b.max_y + (c.node_bottom + c.padding),
        })
    }

    /// Scale is capped at 1.0 and floored at the global minimum.
    pub fn fit<'a>(&self, positions: impl IntoIterator<Item = &'a Position>, container: ContainerSize) -> Viewport {
        if !container.is_usable() {
            debug!("fit: unusable container {:?}, using default view", container);
            return Viewport::centered(container);
        }
        let Some(bounds) = self.padded_bounds(positions) else {
            return Viewport::centered(container);
        };
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Viewport::centered(container);
        }

        let scale_x = container.width / bounds.width();
        let scale_y = container.height / bounds.height();
        let scale = scale_x.min(scale_y).min(1.0).max(MIN_SCALE);

        let center = bounds.center();
        let viewport = Viewport {
            x: container.width / 2.0 - center.x * scale,
            y: container.height / 2.0 - center.y * scale,
            scale,
        };
        debug!("fit: bounds {:?} -> {:?}", bounds, viewport);
        viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_positions_when_fitting_then_centered_default() {
        let container = ContainerSize::new(800.0, 600.0);

        let vp = FitToView::default().fit(std::iter::empty(), container);

        assert_eq!(vp, Viewport::centered(container));
        assert_eq!(vp, Viewport { x: 400.0, y: 100.0, scale: 1.0 });
    }

    #[test]
    fn given_zero_container_when_fitting_then_fallback_without_nan() {
        let positions = [Position::new(0.0, 0.0)];

        let vp = FitToView::default().fit(&positions, ContainerSize::new(0.0, 0.0));

        assert!(vp.x.is_finite() && vp.y.is_finite());
        assert_eq!(vp.scale, 1.0);
    }

    #[test]
    fn given_single_node_in_large_container_when_fitting_then_scale_capped_at_one() {
        let positions = [Position::new(0.0, 0.0)];

        let vp = FitToView::default().fit(&positions, ContainerSize::new(2000.0, 2000.0));

        assert_eq!(vp.scale, 1.0);
        // box center is (0, 50): x = 1000, y = 1000 - 50
        assert_eq!(vp.x, 1000.0);
        assert_eq!(vp.y, 950.0);
    }

    #[test]
    fn given_huge_tree_when_fitting_then_scale_floored() {
        let positions = [Position::new(-1.0e6, 0.0), Position::new(1.0e6, 0.0)];

        let vp = FitToView::default().fit(&positions, ContainerSize::new(800.0, 600.0));

        assert_eq!(vp.scale, MIN_SCALE);
    }
}

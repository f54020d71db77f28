//! Map viewport access and the per-frame view transform.

use nalgebra::{Matrix4, Vector3, Vector4};
use overlay_common::LatLon;
use projection::{to_pixel, PixelPoint};

/// What the map component exposes about the current view. Polled once per redraw.
pub trait MapViewport {
    /// Canvas size in pixels (width, height).
    fn canvas_size(&self) -> (u32, u32);

    /// Current zoom level; the base pixel grid is scaled by 2^zoom.
    fn zoom(&self) -> f64;

    /// North-west corner of the visible area.
    fn north_west(&self) -> LatLon;

    /// Canvas pixel (origin top-left) of a geographic point in the current view.
    fn container_point(&self, point: LatLon) -> PixelPoint {
        let p = to_pixel(point);
        let origin = to_pixel(self.north_west());
        let scale = self.zoom().exp2();
        PixelPoint::new((p.x - origin.x) * scale, (p.y - origin.y) * scale)
    }
}

/// A fixed snapshot of a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticViewport {
    pub width: u32,
    pub height: u32,
    pub zoom: f64,
    pub north_west: LatLon,
}

impl StaticViewport {
    pub fn new(width: u32, height: u32, zoom: f64, north_west: LatLon) -> Self {
        Self {
            width,
            height,
            zoom,
            north_west,
        }
    }
}

impl MapViewport for StaticViewport {
    fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn north_west(&self) -> LatLon {
        self.north_west
    }
}

/// Matrix taking base-grid pixel coordinates to clip space for one frame.
///
/// Built as `T(-1, 1) · S(2/w, -2/h, 0) · S(2^zoom) · T(-top_left)`, so the
/// north-west corner of the view lands on clip (-1, 1) and y points down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    matrix: Matrix4<f64>,
}

impl ViewTransform {
    pub fn new(canvas: (u32, u32), zoom: f64, top_left: PixelPoint) -> Self {
        let (w, h) = (canvas.0.max(1) as f64, canvas.1.max(1) as f64);
        let scale = zoom.exp2();

        let matrix = Matrix4::new_translation(&Vector3::new(-1.0, 1.0, 0.0))
            * Matrix4::new_nonuniform_scaling(&Vector3::new(2.0 / w, -2.0 / h, 0.0))
            * Matrix4::new_nonuniform_scaling(&Vector3::new(scale, scale, 1.0))
            * Matrix4::new_translation(&Vector3::new(-top_left.x, -top_left.y, 0.0));

        Self { matrix }
    }

    /// The transform for the viewport's current state.
    pub fn for_viewport(viewport: &dyn MapViewport) -> Self {
        Self::new(
            viewport.canvas_size(),
            viewport.zoom(),
            to_pixel(viewport.north_west()),
        )
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Transform a base-grid position (z = 0) to clip space.
    pub fn apply(&self, position: [f32; 3]) -> Vector4<f64> {
        self.matrix
            * Vector4::new(
                position[0] as f64,
                position[1] as f64,
                position[2] as f64,
                1.0,
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_top_left_maps_to_clip_corner() {
        let t = ViewTransform::new((800, 600), 3.0, PixelPoint::new(100.0, 50.0));
        let clip = t.apply([100.0, 50.0, 0.0]);
        assert!((clip.x + 1.0).abs() < EPSILON);
        assert!((clip.y - 1.0).abs() < EPSILON);
        assert_eq!(clip.w, 1.0);
    }

    #[test]
    fn test_bottom_right_maps_to_opposite_corner() {
        // At zoom 1 one base pixel spans two canvas pixels.
        let t = ViewTransform::new((400, 200), 1.0, PixelPoint::new(10.0, 20.0));
        let clip = t.apply([210.0, 120.0, 0.0]);
        assert!((clip.x - 1.0).abs() < EPSILON);
        assert!((clip.y + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_depth_is_flattened() {
        let t = ViewTransform::new((100, 100), 0.0, PixelPoint::default());
        assert_eq!(t.apply([0.0, 0.0, 5.0]).z, 0.0);
    }

    #[test]
    fn test_container_point() {
        let vp = StaticViewport::new(512, 512, 1.0, LatLon::new(0.0, 0.0));
        let p = vp.container_point(LatLon::new(0.0, 45.0));
        // 45 degrees is 32 base pixels, doubled at zoom 1.
        assert!((p.x - 64.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }
}

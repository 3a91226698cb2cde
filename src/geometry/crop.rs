//! Cropping a captured frame bitmap to a detected code's quadrilateral.

use super::{Point, Quad};
use image::{Rgba, RgbaImage};

/// Crops `source` to the region covered by `quad`.
///
/// The polygon is scaled by `scale` (the pixel-density factor mapping view
/// coordinates into `source` pixels), pixels outside the closed polygon are
/// cleared to transparent, and the result is the scaled polygon bounds
/// intersected with the image. Returns `None` when the source has no usable
/// pixel backing, the scale is unusable, or the region misses the image
/// entirely.
pub fn crop_to_quad(source: &RgbaImage, quad: &Quad, scale: f64) -> Option<RgbaImage> {
    if source.width() == 0 || source.height() == 0 {
        return None;
    }
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }

    let polygon: Vec<Point> = quad
        .corners()
        .iter()
        .map(|c| Point::new(c.x * scale, c.y * scale))
        .collect();
    let bounds = quad.bounds().scaled(scale);

    let left = bounds.origin.x.floor().max(0.0);
    let top = bounds.origin.y.floor().max(0.0);
    let right = bounds.max_x().ceil().min(f64::from(source.width()));
    let bottom = bounds.max_y().ceil().min(f64::from(source.height()));
    if right <= left || bottom <= top {
        return None;
    }
    let (left, top) = (left as u32, top as u32);
    let (right, bottom) = (right as u32, bottom as u32);

    let mut cropped = RgbaImage::new(right - left, bottom - top);
    for y in top..bottom {
        for x in left..right {
            let sample = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let pixel = if contains(&polygon, sample) {
                *source.get_pixel(x, y)
            } else {
                Rgba([0, 0, 0, 0])
            };
            cropped.put_pixel(x - left, y - top, pixel);
        }
    }
    Some(cropped)
}

/// Even-odd ray-casting test against the closed polygon.
fn contains(polygon: &[Point], p: Point) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let crossing_x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < crossing_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(pixel))
    }

    fn square(x0: f64, y0: f64, side: f64) -> Quad {
        Quad::new([
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ])
    }

    #[test]
    fn test_full_image_square_keeps_every_pixel() {
        let source = solid(8, 8, [255, 0, 0, 255]);
        let cropped = crop_to_quad(&source, &square(0.0, 0.0, 8.0), 1.0).unwrap();
        assert_eq!(cropped.dimensions(), (8, 8));
        assert!(cropped.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_diamond_clears_the_corners() {
        let source = solid(10, 10, [0, 255, 0, 255]);
        let diamond = Quad::new([
            Point::new(5.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(5.0, 10.0),
            Point::new(0.0, 5.0),
        ]);
        let cropped = crop_to_quad(&source, &diamond, 1.0).unwrap();
        assert_eq!(cropped.dimensions(), (10, 10));
        // Center survives, the extreme corner is outside the diamond.
        assert_eq!(cropped.get_pixel(5, 5).0, [0, 255, 0, 255]);
        assert_eq!(cropped.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_scale_maps_view_coordinates_into_pixels() {
        let mut source = solid(8, 8, [0, 0, 0, 255]);
        source.put_pixel(5, 5, Rgba([9, 9, 9, 255]));
        // A 2×2 view-space square at (2,2) with scale 2 covers pixels 4..8.
        let cropped = crop_to_quad(&source, &square(2.0, 2.0, 2.0), 2.0).unwrap();
        assert_eq!(cropped.dimensions(), (4, 4));
        assert_eq!(cropped.get_pixel(1, 1).0, [9, 9, 9, 255]);
    }

    #[test]
    fn test_empty_backing_yields_none() {
        let source = RgbaImage::new(0, 0);
        assert!(crop_to_quad(&source, &square(0.0, 0.0, 4.0), 1.0).is_none());
    }

    #[test]
    fn test_region_outside_image_yields_none() {
        let source = solid(4, 4, [1, 2, 3, 255]);
        assert!(crop_to_quad(&source, &square(100.0, 100.0, 4.0), 1.0).is_none());
    }
}

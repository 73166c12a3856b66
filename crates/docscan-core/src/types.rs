// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: points, document quadrilaterals, captured pages, and the
// final result of a scan session.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A 2D point. Whether it lives in original-image or preview space is decided
/// by the code holding it, not by the type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Return this point moved by `(dx, dy)`.
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A document boundary: four points with fixed roles.
///
/// The corners are stored by role so no caller ever has to reorder a list of
/// points. Malformed (self-intersecting or inverted) quads are representable;
/// they only produce a distorted crop downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quad {
    pub const fn new(
        top_left: Point,
        top_right: Point,
        bottom_right: Point,
        bottom_left: Point,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Corners in polygon order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Apply `f` to every corner, keeping roles.
    pub fn map(&self, mut f: impl FnMut(Point) -> Point) -> Self {
        Self {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_right: f(self.bottom_right),
            bottom_left: f(self.bottom_left),
        }
    }

    /// Length of the longer of the two horizontal sides (top, bottom).
    pub fn max_horizontal_side(&self) -> f64 {
        let top = self.top_left.distance_to(self.top_right);
        let bottom = self.bottom_left.distance_to(self.bottom_right);
        top.max(bottom)
    }

    /// Length of the longer of the two vertical sides (left, right).
    pub fn max_vertical_side(&self) -> f64 {
        let left = self.top_left.distance_to(self.bottom_left);
        let right = self.top_right.distance_to(self.bottom_right);
        left.max(right)
    }

    /// Unsigned polygon area via the shoelace formula.
    ///
    /// Self-intersecting quads cancel out here: a symmetric bowtie has area 0.
    pub fn area(&self) -> f64 {
        let corners = self.corners();
        let mut twice_area = 0.0;
        for i in 0..corners.len() {
            let j = (i + 1) % corners.len();
            twice_area += corners[i].x * corners[j].y;
            twice_area -= corners[j].x * corners[i].y;
        }
        twice_area.abs() / 2.0
    }

    /// Largest area of a triangle spanned by three of the four corners.
    ///
    /// Zero only when all four corners are collinear (or coincide), whatever
    /// the corner order, so it tells a flat quad from a crossed one.
    pub fn max_corner_triangle_area(&self) -> f64 {
        let c = self.corners();
        (0..4)
            .map(|skip| {
                let [a, b, d] = [(skip + 1) % 4, (skip + 2) % 4, (skip + 3) % 4].map(|i| c[i]);
                ((b.x - a.x) * (d.y - a.y) - (d.x - a.x) * (b.y - a.y)).abs() / 2.0
            })
            .fold(0.0, f64::max)
    }

    /// Whether every corner is within `epsilon` of the matching corner of `other`.
    pub fn approx_eq(&self, other: &Quad, epsilon: f64) -> bool {
        self.corners()
            .iter()
            .zip(other.corners().iter())
            .all(|(a, b)| (a.x - b.x).abs() <= epsilon && (a.y - b.y).abs() <= epsilon)
    }
}

/// One captured page: the full-resolution photo on disk plus its crop region.
///
/// Deliberately not `Clone`: the page owns its backing photo file and that file
/// is released exactly once, on retake or after a successful crop.
#[derive(Debug, PartialEq)]
pub struct Document {
    /// Path of the full-resolution photo.
    pub original_photo_path: PathBuf,
    /// Photo width in pixels at capture time.
    pub original_width: u32,
    /// Photo height in pixels at capture time.
    pub original_height: u32,
    /// Crop region in original-image space. Holds the detected corners while
    /// the page is edited and the user's selection once it is accepted.
    pub corners: Quad,
}

impl Document {
    pub fn new(
        original_photo_path: PathBuf,
        original_width: u32,
        original_height: u32,
        corners: Quad,
    ) -> Self {
        Self {
            original_photo_path,
            original_width,
            original_height,
            corners,
        }
    }
}

/// What the caller of a whole scan flow receives once the session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ScanOutcome {
    /// All pages were cropped and written, in capture order.
    #[serde(rename_all = "camelCase")]
    Completed { cropped_image_results: Vec<PathBuf> },
    /// The user backed out before accepting any page.
    Cancelled,
    /// The session stopped at its first error.
    Error { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Quad {
        Quad::new(
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        )
    }

    #[test]
    fn translate_moves_both_axes() {
        let p = Point::new(10.0, 20.0).translate(-5.0, 2.5);
        assert_eq!(p, Point::new(5.0, 22.5));
    }

    #[test]
    fn corners_follow_polygon_order() {
        let q = rect(0.0, 0.0, 4.0, 3.0);
        let [tl, tr, br, bl] = q.corners();
        assert_eq!(tl, Point::new(0.0, 0.0));
        assert_eq!(tr, Point::new(4.0, 0.0));
        assert_eq!(br, Point::new(4.0, 3.0));
        assert_eq!(bl, Point::new(0.0, 3.0));
    }

    #[test]
    fn area_of_rectangle() {
        let q = rect(50.0, 50.0, 750.0, 550.0);
        assert!((q.area() - 350_000.0).abs() < 1e-6);
    }

    #[test]
    fn area_of_collinear_quad_is_zero() {
        let q = Quad::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(30.0, 30.0),
        );
        assert_eq!(q.area(), 0.0);
        assert_eq!(q.max_corner_triangle_area(), 0.0);
    }

    #[test]
    fn crossed_quad_has_zero_area_but_spans_triangles() {
        let bowtie = Quad::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
        );
        assert_eq!(bowtie.area(), 0.0);
        assert!((bowtie.max_corner_triangle_area() - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn side_lengths_take_the_longer_side() {
        // Trapezoid: top 100 wide, bottom 140 wide, sides of differing height.
        let q = Quad::new(
            Point::new(20.0, 0.0),
            Point::new(120.0, 0.0),
            Point::new(140.0, 60.0),
            Point::new(0.0, 50.0),
        );
        let bottom = Point::new(0.0, 50.0).distance_to(Point::new(140.0, 60.0));
        let right = Point::new(120.0, 0.0).distance_to(Point::new(140.0, 60.0));
        assert!((q.max_horizontal_side() - bottom).abs() < 1e-9);
        assert!((q.max_vertical_side() - right).abs() < 1e-9);
    }

    #[test]
    fn map_keeps_roles() {
        let q = rect(0.0, 0.0, 2.0, 1.0).map(|p| Point::new(p.x * 2.0, p.y * 2.0));
        assert_eq!(q, rect(0.0, 0.0, 4.0, 2.0));
    }

    #[test]
    fn outcome_serialises_with_result_keys() {
        let done = ScanOutcome::Completed {
            cropped_image_results: vec![PathBuf::from("/tmp/a.jpg")],
        };
        let json = serde_json::to_value(&done).expect("serialize");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["croppedImageResults"][0], "/tmp/a.jpg");

        let failed = ScanOutcome::Error {
            error: "unable to crop image: zero area".into(),
        };
        let json = serde_json::to_value(&failed).expect("serialize");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "unable to crop image: zero area");
    }
}

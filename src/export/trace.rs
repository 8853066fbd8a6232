//! Two-color vector tracing for line art.
//!
//! The raster is binarized at a luminance threshold, dark regions are traced
//! with marching squares, tiny specks are dropped, and every contour is
//! simplified with Ramer-Douglas-Peucker before being written as one filled
//! black path over a white background.
//!
//! Coordinates are in source pixels; the SVG `viewBox` is the raster size, so
//! the document scales to any print size without resampling.

use crate::imaging::PixelBuffer;
use std::fmt::Write as _;

/// Tuning for line-art tracing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceOptions {
    /// Pixels darker than this (0-255 luma) are ink.
    pub luminance_threshold: u8,
    /// RDP tolerance in pixels; higher gives straighter, crisper strokes.
    pub line_threshold: f64,
    /// Contours enclosing less than this many square pixels are noise.
    pub path_omit: u32,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            luminance_threshold: 128,
            line_threshold: 1.0,
            path_omit: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Traced contours of one raster.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedImage {
    pub width: u32,
    pub height: u32,
    pub contours: Vec<Vec<Point>>,
}

/// Trace `raster` into an SVG document.
pub fn raster_to_svg(raster: &PixelBuffer, options: &TraceOptions) -> String {
    render_svg(&trace_raster(raster, options))
}

pub fn trace_raster(raster: &PixelBuffer, options: &TraceOptions) -> TracedImage {
    let width = raster.width() as usize;
    let height = raster.height() as usize;
    let mask = binarize(raster, options.luminance_threshold);

    let contours: Vec<Vec<Point>> = marching_squares(&mask, width, height)
        .into_iter()
        .filter(|contour| polygon_area(contour) >= options.path_omit as f64)
        .map(|contour| simplify_closed(&contour, options.line_threshold))
        .filter(|contour| contour.len() >= 3)
        .collect();

    tracing::debug!(
        width,
        height,
        contours = contours.len(),
        "traced raster"
    );

    TracedImage {
        width: raster.width(),
        height: raster.height(),
        contours,
    }
}

/// Row-major ink mask. Transparent pixels count as paper.
pub fn binarize(raster: &PixelBuffer, threshold: u8) -> Vec<bool> {
    raster
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            if a < 128 {
                return false;
            }
            let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
            luma < threshold as u32
        })
        .collect()
}

// Sides of a marching-squares cell.
const TOP: u8 = 0;
const RIGHT: u8 = 1;
const BOTTOM: u8 = 2;
const LEFT: u8 = 3;

/// Segments crossing a cell as `(entry, exit)` pairs, ink kept on the left.
///
/// The case index packs the corners as `tl<<3 | tr<<2 | br<<1 | bl`.
fn case_segments(case: u8) -> &'static [(u8, u8)] {
    match case {
        1 => &[(BOTTOM, LEFT)],
        2 => &[(RIGHT, BOTTOM)],
        3 => &[(RIGHT, LEFT)],
        4 => &[(TOP, RIGHT)],
        5 => &[(TOP, RIGHT), (BOTTOM, LEFT)],
        6 => &[(TOP, BOTTOM)],
        7 => &[(TOP, LEFT)],
        8 => &[(LEFT, TOP)],
        9 => &[(BOTTOM, TOP)],
        10 => &[(LEFT, TOP), (RIGHT, BOTTOM)],
        11 => &[(RIGHT, TOP)],
        12 => &[(LEFT, RIGHT)],
        13 => &[(BOTTOM, RIGHT)],
        14 => &[(LEFT, BOTTOM)],
        _ => &[],
    }
}

fn opposite(side: u8) -> u8 {
    (side + 2) % 4
}

/// Closed contours around every ink region.
///
/// Corners of the `(width + 2) × (height + 2)` lattice sit on pixel centers
/// with a one-pixel ring of paper around the image, so every contour closes.
fn marching_squares(mask: &[bool], width: usize, height: usize) -> Vec<Vec<Point>> {
    let cells_w = width + 1;
    let cells_h = height + 1;

    let inside = |gx: usize, gy: usize| -> bool {
        gx >= 1 && gy >= 1 && gx <= width && gy <= height && mask[(gy - 1) * width + (gx - 1)]
    };
    let case_of = |cx: usize, cy: usize| -> u8 {
        (inside(cx, cy) as u8) << 3
            | (inside(cx + 1, cy) as u8) << 2
            | (inside(cx + 1, cy + 1) as u8) << 1
            | inside(cx, cy + 1) as u8
    };
    let edge_point = |cx: usize, cy: usize, side: u8| -> Point {
        let (x, y) = (cx as f64, cy as f64);
        match side {
            TOP => Point { x, y: y - 0.5 },
            RIGHT => Point { x: x + 0.5, y },
            BOTTOM => Point { x, y: y + 0.5 },
            _ => Point { x: x - 0.5, y },
        }
    };
    let neighbor = |cx: usize, cy: usize, side: u8| -> Option<(usize, usize)> {
        match side {
            TOP => cy.checked_sub(1).map(|y| (cx, y)),
            RIGHT => (cx + 1 < cells_w).then_some((cx + 1, cy)),
            BOTTOM => (cy + 1 < cells_h).then_some((cx, cy + 1)),
            _ => cx.checked_sub(1).map(|x| (x, cy)),
        }
    };

    let mut visited = vec![false; cells_w * cells_h * 4];
    let key = |cx: usize, cy: usize, entry: u8| (cy * cells_w + cx) * 4 + entry as usize;

    let mut contours = Vec::new();
    for cy in 0..cells_h {
        for cx in 0..cells_w {
            for &(entry, exit) in case_segments(case_of(cx, cy)) {
                if visited[key(cx, cy, entry)] {
                    continue;
                }

                let mut contour = Vec::new();
                let (mut cur_x, mut cur_y, mut cur_exit) = (cx, cy, exit);
                visited[key(cx, cy, entry)] = true;

                loop {
                    contour.push(edge_point(cur_x, cur_y, cur_exit));
                    let Some((nx, ny)) = neighbor(cur_x, cur_y, cur_exit) else {
                        break;
                    };
                    let next_entry = opposite(cur_exit);
                    let Some(&(_, next_exit)) = case_segments(case_of(nx, ny))
                        .iter()
                        .find(|(e, _)| *e == next_entry)
                    else {
                        break;
                    };
                    let k = key(nx, ny, next_entry);
                    if visited[k] {
                        break;
                    }
                    visited[k] = true;
                    cur_x = nx;
                    cur_y = ny;
                    cur_exit = next_exit;
                }

                if contour.len() >= 3 {
                    contours.push(contour);
                }
            }
        }
    }
    contours
}

fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        twice += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice.abs() / 2.0
}

/// RDP over a closed ring: close it, simplify, drop the repeated end.
fn simplify_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 4 || epsilon <= 0.0 {
        return points.to_vec();
    }
    let mut ring = points.to_vec();
    ring.push(points[0]);
    let mut simplified = rdp_simplify(&ring, epsilon);
    simplified.pop();
    simplified
}

fn rdp_simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];
    let (max_idx, max_dist) = points[1..points.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, point_to_segment_distance(*p, first, last)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if max_dist > epsilon {
        let mut left = rdp_simplify(&points[..=max_idx], epsilon);
        let right = rdp_simplify(&points[max_idx..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq < 1e-10 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let (px, py) = (a.x + t * dx, a.y + t * dy);
    ((p.x - px).powi(2) + (p.y - py).powi(2)).sqrt()
}

/// Contour coordinates are always on the half-pixel grid.
fn fmt_coord(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.1}", v)
    }
}

pub fn render_svg(traced: &TracedImage) -> String {
    let (w, h) = (traced.width, traced.height);
    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    let _ = writeln!(svg, r##"  <rect width="{w}" height="{h}" fill="#ffffff"/>"##);

    let mut d = String::new();
    for contour in &traced.contours {
        if !d.is_empty() {
            d.push(' ');
        }
        let _ = write!(d, "M{} {}", fmt_coord(contour[0].x), fmt_coord(contour[0].y));
        for p in &contour[1..] {
            let _ = write!(d, "L{} {}", fmt_coord(p.x), fmt_coord(p.y));
        }
        d.push('Z');
    }
    if !d.is_empty() {
        let _ = writeln!(
            svg,
            r##"  <path d="{d}" fill="#000000" fill-rule="evenodd" stroke="none"/>"##
        );
    }
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn canvas(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::from_pixel(w, h, PAPER)
    }

    fn fill(buffer: &mut PixelBuffer, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                buffer.put_pixel(x, y, INK);
            }
        }
    }

    fn no_omit() -> TraceOptions {
        TraceOptions {
            path_omit: 0,
            ..TraceOptions::default()
        }
    }

    // =========================================================================
    // binarize
    // =========================================================================

    #[test]
    fn binarize_splits_on_threshold() {
        let mut buffer = canvas(3, 1);
        buffer.put_pixel(0, 0, Rgba([127, 127, 127, 255]));
        buffer.put_pixel(1, 0, Rgba([128, 128, 128, 255]));
        buffer.put_pixel(2, 0, Rgba([0, 0, 0, 0]));
        assert_eq!(binarize(&buffer, 128), vec![true, false, false]);
    }

    // =========================================================================
    // contours
    // =========================================================================

    #[test]
    fn blank_page_has_no_paths() {
        let traced = trace_raster(&canvas(16, 16), &no_omit());
        assert!(traced.contours.is_empty());
        let svg = render_svg(&traced);
        assert!(!svg.contains("<path"));
        assert!(svg.contains(r##"fill="#ffffff""##));
    }

    #[test]
    fn single_pixel_is_a_diamond() {
        let mut buffer = canvas(5, 5);
        buffer.put_pixel(2, 2, INK);
        let contours = marching_squares(&binarize(&buffer, 128), 5, 5);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
        assert!((polygon_area(&contours[0]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn square_traces_one_contour_of_its_area() {
        let mut buffer = canvas(20, 20);
        fill(&mut buffer, 5, 5, 15, 15);
        let traced = trace_raster(&buffer, &TraceOptions::default());
        assert_eq!(traced.contours.len(), 1);
        let area = polygon_area(&traced.contours[0]);
        assert!((98.0..=100.0).contains(&area), "area {area}");
        // Straight edges collapse to the chamfered corners
        assert!(traced.contours[0].len() <= 8);
    }

    #[test]
    fn ring_traces_outer_and_inner_contours() {
        let mut buffer = canvas(20, 20);
        fill(&mut buffer, 2, 2, 18, 18);
        for y in 6..14 {
            for x in 6..14 {
                buffer.put_pixel(x, y, PAPER);
            }
        }
        let traced = trace_raster(&buffer, &no_omit());
        assert_eq!(traced.contours.len(), 2);
    }

    #[test]
    fn edge_touching_ink_still_closes() {
        let mut buffer = canvas(10, 10);
        fill(&mut buffer, 0, 0, 10, 3);
        let traced = trace_raster(&buffer, &no_omit());
        assert_eq!(traced.contours.len(), 1);
        for p in &traced.contours[0] {
            assert!((0.0..=10.0).contains(&p.x) && (0.0..=10.0).contains(&p.y));
        }
    }

    #[test]
    fn specks_below_path_omit_are_dropped() {
        let mut buffer = canvas(20, 20);
        buffer.put_pixel(1, 1, INK);
        fill(&mut buffer, 8, 8, 16, 16);
        let traced = trace_raster(&buffer, &TraceOptions::default());
        assert_eq!(traced.contours.len(), 1);
    }

    // =========================================================================
    // svg document
    // =========================================================================

    #[test]
    fn svg_has_pixel_viewbox_and_black_path() {
        let mut buffer = canvas(30, 20);
        fill(&mut buffer, 4, 4, 12, 12);
        let svg = raster_to_svg(&buffer, &TraceOptions::default());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"viewBox="0 0 30 20""#));
        assert!(svg.contains(r##"fill="#000000""##));
        assert!(svg.contains('M') && svg.contains('Z'));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn coordinates_format_compactly() {
        assert_eq!(fmt_coord(3.0), "3");
        assert_eq!(fmt_coord(3.5), "3.5");
        assert_eq!(fmt_coord(0.0), "0");
    }
}

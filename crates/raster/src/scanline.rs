//! Pixel-space scan conversion shared by the rasterizer and the renderer.
//!
//! Coordinates are fractional pixel positions: x grows with the column,
//! y with the row, and pixel (c, r) covers `[c, c+1) x [r, r+1)`.

/// Visit every pixel whose centre lies inside the polygon formed by
/// `rings`, using the even-odd rule.
///
/// Rings need not be closed; the last vertex connects back to the first.
/// An edge counts for a scanline when `y0 <= yc < y1` (or the reverse),
/// so a centre exactly on a shared edge is filled by exactly one side.
pub fn fill_polygon<F>(rings: &[Vec<(f64, f64)>], width: usize, height: usize, mut visit: F)
where
    F: FnMut(usize, usize),
{
    if width == 0 || height == 0 {
        return;
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in rings.iter().flatten() {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        return;
    }

    // Rows whose centre can fall inside [y_min, y_max].
    let row_start = (y_min - 0.5).ceil().max(0.0) as usize;
    let row_end = ((y_max - 0.5).floor() + 1.0).clamp(0.0, height as f64) as usize;

    let mut crossings = Vec::new();
    for row in row_start..row_end {
        let yc = row as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            let n = ring.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let (x0, y0) = ring[i];
                let (x1, y1) = ring[(i + 1) % n];
                if (y0 <= yc && yc < y1) || (y1 <= yc && yc < y0) {
                    crossings.push(x0 + (yc - y0) * (x1 - x0) / (y1 - y0));
                }
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            // Columns whose centre c + 0.5 is in [pair[0], pair[1]).
            let first = (pair[0] - 0.5).ceil().max(0.0);
            let last = (pair[1] - 0.5).ceil().min(width as f64);
            if first >= last {
                continue;
            }
            for col in first as usize..last as usize {
                visit(col, row);
            }
        }
    }
}

/// Visit every pixel a segment passes through (grid traversal), clipped
/// to the raster.
pub fn trace_segment<F>(a: (f64, f64), b: (f64, f64), width: usize, height: usize, mut visit: F)
where
    F: FnMut(usize, usize),
{
    if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
        return;
    }

    let mut cell = (a.0.floor() as i64, a.1.floor() as i64);
    let end = (b.0.floor() as i64, b.1.floor() as i64);
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let step = (dx.signum() as i64, dy.signum() as i64);

    let next_boundary = |p: f64, c: i64, s: i64| if s > 0 { (c + 1) as f64 - p } else { p - c as f64 };
    let mut t_max_x = if dx != 0.0 { next_boundary(a.0, cell.0, step.0) / dx.abs() } else { f64::INFINITY };
    let mut t_max_y = if dy != 0.0 { next_boundary(a.1, cell.1, step.1) / dy.abs() } else { f64::INFINITY };
    let t_delta_x = if dx != 0.0 { 1.0 / dx.abs() } else { f64::INFINITY };
    let t_delta_y = if dy != 0.0 { 1.0 / dy.abs() } else { f64::INFINITY };

    loop {
        visit_cell(cell, width, height, &mut visit);
        if cell == end || t_max_x.min(t_max_y) > 1.0 {
            break;
        }
        // Through a corner: step diagonally so only cells the segment
        // actually crosses are visited.
        if t_max_x < t_max_y {
            cell.0 += step.0;
            t_max_x += t_delta_x;
        } else if t_max_y < t_max_x {
            cell.1 += step.1;
            t_max_y += t_delta_y;
        } else {
            cell.0 += step.0;
            cell.1 += step.1;
            t_max_x += t_delta_x;
            t_max_y += t_delta_y;
        }
    }
}

/// Visit the pixel containing `p`, if it lies inside the raster.
pub fn visit_point<F>(p: (f64, f64), width: usize, height: usize, mut visit: F)
where
    F: FnMut(usize, usize),
{
    if p.0.is_finite() && p.1.is_finite() {
        visit_cell((p.0.floor() as i64, p.1.floor() as i64), width, height, &mut visit);
    }
}

fn visit_cell<F: FnMut(usize, usize)>(cell: (i64, i64), width: usize, height: usize, visit: &mut F) {
    if cell.0 >= 0 && cell.1 >= 0 && (cell.0 as usize) < width && (cell.1 as usize) < height {
        visit(cell.0 as usize, cell.1 as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(rings: &[Vec<(f64, f64)>], w: usize, h: usize) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        fill_polygon(rings, w, h, |c, r| cells.push((c, r)));
        cells.sort();
        cells
    }

    #[test]
    fn test_square_fills_covered_centres() {
        // [1, 3] x [1, 3] covers centres 1.5 and 2.5 in both directions.
        let ring = vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)];
        assert_eq!(filled(&[ring], 5, 5), vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_small_polygon_missing_all_centres_burns_nothing() {
        let ring = vec![(1.1, 1.1), (1.4, 1.1), (1.4, 1.4), (1.1, 1.4)];
        assert!(filled(&[ring], 5, 5).is_empty());
    }

    #[test]
    fn test_hole_is_left_empty() {
        let outer = vec![(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0), (0.0, 0.0)];
        let hole = vec![(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0), (1.0, 1.0)];
        let cells = filled(&[outer, hole], 3, 3);
        assert_eq!(cells.len(), 8);
        assert!(!cells.contains(&(1, 1)));
    }

    #[test]
    fn test_adjacent_polygons_share_no_pixels() {
        let left = vec![(0.0, 0.0), (2.0, 0.0), (2.0, 4.0), (0.0, 4.0)];
        let right = vec![(2.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 4.0)];
        let mut all = filled(&[left], 4, 4);
        all.extend(filled(&[right], 4, 4));
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(total, 16);
        assert_eq!(all.len(), 16);
    }

    #[test]
    fn test_clipped_to_raster() {
        let ring = vec![(-5.0, -5.0), (10.0, -5.0), (10.0, 10.0), (-5.0, 10.0)];
        assert_eq!(filled(&[ring], 2, 3).len(), 6);
    }

    #[test]
    fn test_trace_diagonal_segment() {
        let mut cells = Vec::new();
        trace_segment((0.5, 0.5), (2.5, 1.5), 4, 4, |c, r| cells.push((c, r)));
        assert_eq!(cells.first(), Some(&(0, 0)));
        assert_eq!(cells.last(), Some(&(2, 1)));
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn test_trace_through_corners_stays_diagonal() {
        let mut cells = Vec::new();
        trace_segment((0.0, 3.0), (3.0, 0.0), 3, 3, |c, r| cells.push((c, r)));
        assert_eq!(cells, vec![(0, 2), (1, 1), (2, 0)]);
    }

    #[test]
    fn test_trace_outside_raster_visits_nothing() {
        let mut count = 0;
        trace_segment((-3.0, -3.0), (-1.0, -2.0), 4, 4, |_, _| count += 1);
        assert_eq!(count, 0);
    }
}

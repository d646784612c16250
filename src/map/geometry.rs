use crate::braille::BrailleCanvas;

/// 4x4 ordered-dither thresholds (0..16)
const BAYER_4X4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a line `weight` pixels wide by repeating it along the minor axis
pub fn draw_stroke(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, weight: u8) {
    let mostly_horizontal = (x1 - x0).abs() >= (y1 - y0).abs();
    for offset in 0..weight.max(1) as i32 {
        if mostly_horizontal {
            draw_line(canvas, x0, y0 + offset, x1, y1 + offset);
        } else {
            draw_line(canvas, x0 + offset, y0, x1 + offset, y1);
        }
    }
}

/// Draw a filled circle (for location markers)
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Whether the ordered dither lights pixel (x, y) at the given opacity
#[inline(always)]
pub fn dither_lit(x: i32, y: i32, opacity: f64) -> bool {
    let threshold = BAYER_4X4[y.rem_euclid(4) as usize][x.rem_euclid(4) as usize];
    (threshold as f64) < opacity * 16.0
}

/// Fill a projected ring with an even-odd scanline pass, dithered to `opacity`.
/// Rows and spans are clipped to the canvas so huge off-screen rings stay cheap.
pub fn fill_polygon(canvas: &mut BrailleCanvas, ring: &[(i32, i32)], opacity: f64) {
    if ring.len() < 3 || opacity <= 0.0 {
        return;
    }

    let max_x = canvas.pixel_width() as i32 - 1;
    let max_y = canvas.pixel_height() as i32 - 1;
    let min_py = ring.iter().map(|p| p.1).min().unwrap_or(0).max(0);
    let max_py = ring.iter().map(|p| p.1).max().unwrap_or(-1).min(max_y);

    let mut crossings: Vec<f64> = Vec::new();
    for y in min_py..=max_py {
        // Sample at the pixel center
        let scan = y as f64 + 0.5;
        crossings.clear();

        for (i, &(ax, ay)) in ring.iter().enumerate() {
            let (bx, by) = ring[(i + 1) % ring.len()];
            let (ay, by) = (ay as f64, by as f64);
            if (ay <= scan) != (by <= scan) {
                let t = (scan - ay) / (by - ay);
                crossings.push(ax as f64 + t * (bx - ax) as f64);
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0) as i32;
            let end = ((span[1] - 0.5).floor() as i32).min(max_x);
            for x in start..=end {
                if dither_lit(x, y, opacity) {
                    canvas.set_pixel_signed(x, y);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.row_to_string(0), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.lit_count(), 8);
    }

    #[test]
    fn test_stroke_weight_two_doubles_pixels() {
        let mut thin = BrailleCanvas::new(10, 2);
        let mut thick = BrailleCanvas::new(10, 2);
        draw_stroke(&mut thin, 0, 2, 15, 2, 1);
        draw_stroke(&mut thick, 0, 2, 15, 2, 2);
        assert_eq!(thin.lit_count(), 16);
        assert_eq!(thick.lit_count(), 32);
        assert!(thick.is_set(5, 3));
    }

    #[test]
    fn test_full_opacity_fills_square() {
        let mut canvas = BrailleCanvas::new(4, 2);
        fill_polygon(&mut canvas, &[(0, 0), (8, 0), (8, 8), (0, 8), (0, 0)], 1.0);
        assert_eq!(canvas.lit_count(), 64);
    }

    #[test]
    fn test_partial_opacity_dithers() {
        let mut canvas = BrailleCanvas::new(2, 1);
        fill_polygon(&mut canvas, &[(0, 0), (4, 0), (4, 4), (0, 4)], 0.7);
        // Thresholds below 11.2 are 0..=11
        assert_eq!(canvas.lit_count(), 12);
    }

    #[test]
    fn test_zero_opacity_draws_nothing() {
        let mut canvas = BrailleCanvas::new(4, 2);
        fill_polygon(&mut canvas, &[(0, 0), (8, 0), (8, 8), (0, 8)], 0.0);
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_offscreen_ring_is_clipped() {
        let mut canvas = BrailleCanvas::new(2, 1);
        fill_polygon(
            &mut canvas,
            &[(-100_000, -100_000), (100_000, -100_000), (100_000, 100_000), (-100_000, 100_000)],
            1.0,
        );
        assert_eq!(canvas.lit_count(), 16);
    }
}

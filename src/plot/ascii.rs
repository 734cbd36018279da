//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Axes: x = log10(copies), y = Ct.
//!
//! Plot elements:
//! - standards: `o`
//! - fitted line: `-`
//! - unknowns: `x`

use crate::domain::{StandardCurve, UnknownSample};

/// Render the standard curve with its standards and (optionally) unknowns.
pub fn render_curve_plot(
    curve: &StandardCurve,
    unknowns: &[UnknownSample],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let standards: Vec<(f64, f64)> = curve
        .points()
        .iter()
        .map(|p| (p.log10_copies(), p.ct))
        .collect();
    let samples: Vec<(f64, f64)> = unknowns
        .iter()
        .filter(|u| u.copies.is_finite() && u.copies > 0.0)
        .map(|u| (u.log10_copies(), u.ct))
        .collect();

    let (x_min, x_max) = range(standards.iter().chain(samples.iter()).map(|&(x, _)| x))
        .unwrap_or((0.0, 1.0));
    let line = [
        (x_min, curve.slope() * x_min + curve.intercept()),
        (x_max, curve.slope() * x_max + curve.intercept()),
    ];
    let (y_min, y_max) = range(
        standards
            .iter()
            .chain(samples.iter())
            .chain(line.iter())
            .map(|&(_, y)| y),
    )
    .unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the line first so points overlay it.
    let (x0, y0) = (map_x(line[0].0, x_min, x_max, width), map_y(line[0].1, y_min, y_max, height));
    let (x1, y1) = (map_x(line[1].0, x_min, x_max, width), map_y(line[1].1, y_min, y_max, height));
    draw_line(&mut grid, x0, y0, x1, y1, '-');

    for &(x, y) in &standards {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }
    for &(x, y) in &samples {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'x';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: log10(copies)=[{x_min:.3}, {x_max:.3}] | Ct=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

use iterview_core::{Annotation, AnnotationOp};

use crate::present::Frame;

/// Segments per ellipse outline at most; each one is clipped anyway.
const MAX_OUTLINE_STEPS: f64 = 4096.0;

/// Pen state while replaying annotations.
struct Pen {
    stroke: [f64; 4],
    fill: [f64; 4],
    width: f64,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            stroke: [255.0, 255.0, 255.0, 255.0],
            fill: [255.0, 255.0, 255.0, 255.0],
            width: 1.0,
        }
    }
}

/// Burn raster-space annotations into `frame`.
///
/// Lines, rectangles and ellipses are rasterized with the current stroke
/// or fill color, alpha-blended by its opacity. Text commands are left to
/// the UI and skipped here. Plane-coordinate annotations must be resolved
/// first; any that are not are skipped.
pub fn burn(frame: &mut Frame, annotations: &[Annotation]) {
    let mut pen = Pen::default();
    for a in annotations.iter().filter(|a| !a.plane_coords) {
        let [p0, p1, p2, p3] = a.operands;
        match a.op {
            AnnotationOp::SetStrokeColor => pen.stroke = a.operands,
            AnnotationOp::SetFillColor => pen.fill = a.operands,
            AnnotationOp::SetLineWidth => pen.width = p0.max(1.0),
            AnnotationOp::DrawLine => line(frame, &pen, p0, p1, p2, p3),
            AnnotationOp::DrawRect => {
                let (x1, y1) = (p0 + p2, p1 + p3);
                line(frame, &pen, p0, p1, x1, p1);
                line(frame, &pen, x1, p1, x1, y1);
                line(frame, &pen, x1, y1, p0, y1);
                line(frame, &pen, p0, y1, p0, p1);
            }
            AnnotationOp::FillRect => {
                let (xs, ys) = (
                    span(p0.round(), (p0 + p2).round(), frame.width),
                    span(p1.round(), (p1 + p3).round(), frame.height),
                );
                for y in ys {
                    for x in xs.clone() {
                        blend(frame, x, y, pen.fill);
                    }
                }
            }
            AnnotationOp::DrawEllipse => ellipse_outline(frame, &pen, p0, p1, p2, p3),
            AnnotationOp::FillEllipse => ellipse_fill(frame, pen.fill, p0, p1, p2, p3),
            AnnotationOp::SetFont | AnnotationOp::DrawText => {}
        }
    }
}

fn blend(frame: &mut Frame, x: i64, y: i64, rgba: [f64; 4]) {
    if x < 0 || y < 0 || x >= frame.width as i64 || y >= frame.height as i64 {
        return;
    }
    let i = y as usize * frame.width as usize + x as usize;
    let alpha = (rgba[3] / 255.0).clamp(0.0, 1.0);
    let [_, dr, dg, db] = frame.pixels[i].to_be_bytes();
    let mix = |src: f64, dst: u8| -> u8 {
        (src.clamp(0.0, 255.0) * alpha + dst as f64 * (1.0 - alpha)).round() as u8
    };
    frame.pixels[i] = u32::from_be_bytes([
        0xFF,
        mix(rgba[0], dr),
        mix(rgba[1], dg),
        mix(rgba[2], db),
    ]);
}

/// Square brush of the pen width centred on `(x, y)`.
fn dab(frame: &mut Frame, pen: &Pen, x: i64, y: i64) {
    let w = pen.width.round().max(1.0) as i64;
    let off = (w - 1) / 2;
    for dy in 0..w {
        for dx in 0..w {
            blend(frame, x - off + dx, y - off + dy, pen.stroke);
        }
    }
}

/// Half-open pixel range `[from, to)` clamped to `0..limit`.
fn span(from: f64, to: f64, limit: u32) -> std::ops::Range<i64> {
    let clamp = |v: f64| {
        if v.is_nan() {
            0
        } else {
            v.clamp(0.0, limit as f64) as i64
        }
    };
    clamp(from)..clamp(to)
}

/// Liang–Barsky clip of a segment against `[lo, hi]` on both axes.
fn clip(
    (x0, y0): (f64, f64),
    (x1, y1): (f64, f64),
    (lo_x, hi_x): (f64, f64),
    (lo_y, hi_y): (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (x1 - x0, y1 - y0);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, x0 - lo_x),
        (dx, hi_x - x0),
        (-dy, y0 - lo_y),
        (dy, hi_y - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
    }
    Some((
        (x0 + t0 * dx, y0 + t0 * dy),
        (x0 + t1 * dx, y0 + t1 * dy),
    ))
}

/// Bresenham line, endpoints inclusive, clipped to the frame plus the
/// brush margin.
fn line(frame: &mut Frame, pen: &Pen, x0: f64, y0: f64, x1: f64, y1: f64) {
    let margin = pen.width.round().max(1.0);
    let Some(((x0, y0), (x1, y1))) = clip(
        (x0, y0),
        (x1, y1),
        (-margin, frame.width as f64 - 1.0 + margin),
        (-margin, frame.height as f64 - 1.0 + margin),
    ) else {
        return;
    };
    let (mut x, mut y) = (x0.round() as i64, y0.round() as i64);
    let (xe, ye) = (x1.round() as i64, y1.round() as i64);
    let dx = (xe - x).abs();
    let dy = -(ye - y).abs();
    let sx = if x < xe { 1 } else { -1 };
    let sy = if y < ye { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        dab(frame, pen, x, y);
        if x == xe && y == ye {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn ellipse_outline(frame: &mut Frame, pen: &Pen, x: f64, y: f64, w: f64, h: f64) {
    let (rx, ry) = (w / 2.0, h / 2.0);
    let (cx, cy) = (x + rx, y + ry);
    let steps = ((rx.abs() + ry.abs()) * 4.0).ceil().clamp(8.0, MAX_OUTLINE_STEPS) as usize;
    let point = |k: usize| {
        let t = k as f64 / steps as f64 * std::f64::consts::TAU;
        (cx + rx * t.cos(), cy + ry * t.sin())
    };
    let mut prev = point(0);
    for k in 1..=steps {
        let next = point(k);
        line(frame, pen, prev.0, prev.1, next.0, next.1);
        prev = next;
    }
}

fn ellipse_fill(frame: &mut Frame, rgba: [f64; 4], x: f64, y: f64, w: f64, h: f64) {
    let (rx, ry) = (w / 2.0, h / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let (cx, cy) = (x + rx, y + ry);
    let ys = span(y.floor(), (y + h).ceil() + 1.0, frame.height);
    let xs = span(x.floor(), (x + w).ceil() + 1.0, frame.width);
    for py in ys {
        for px in xs.clone() {
            let nx = (px as f64 - cx) / rx;
            let ny = (py as f64 - cy) / ry;
            if nx * nx + ny * ny <= 1.0 {
                blend(frame, px, py, rgba);
            }
        }
    }
}

//! Path-Data Interpreter: tokenizes the XPS/SVG-style path mini-language
//! and replays it onto an abstract 2D canvas as a sequence of
//! [`Segment`]s, converting elliptical arcs to cubic Béziers along the
//! way. Nothing here knows about PDF — `pdf::emitter` consumes the
//! `Vec<Segment>` this module produces.

use std::f64::consts::PI;

/// One drawing instruction on the abstract canvas, already reduced to the
/// primitives a PDF content stream (or any other vector target) can
/// emit directly: no more arcs, no more implicit repetition.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CubicTo(f64, f64, f64, f64, f64, f64),
    ClosePath,
}

/// Parses and replays a path-data string. Never panics: unknown commands
/// are skipped, a malformed numeric stream simply stops consuming further
/// operands for that command. Callers that need an all-or-nothing result
/// (the emitter does, per spec's "malformed path data must not abort the
/// page") wrap this in their own validation if they care about partial
/// output; this function always returns whatever it managed to parse.
pub fn interpret(data: &str) -> Vec<Segment> {
    let tokens = tokenize(data);
    let mut out = Vec::new();
    let mut i = 0;

    let (mut cx, mut cy) = (0.0, 0.0);
    let (mut sx, mut sy) = (0.0, 0.0);
    let mut last_cmd: Option<char> = None;

    while i < tokens.len() {
        let Token::Command(c) = tokens[i] else {
            // Stray number with no command context: ignore and advance.
            i += 1;
            continue;
        };
        i += 1;

        let is_relative = c.is_ascii_lowercase();
        let upper = c.to_ascii_uppercase();

        macro_rules! next_num {
            () => {{
                match tokens.get(i) {
                    Some(Token::Number(n)) => {
                        i += 1;
                        *n
                    }
                    _ => break,
                }
            }};
        }

        match upper {
            'F' => {
                // Fill-rule flag: consume one operand, no drawing effect.
                if matches!(tokens.get(i), Some(Token::Number(_))) {
                    i += 1;
                }
            }
            'M' => {
                let mut first = true;
                loop {
                    if !matches!(tokens.get(i), Some(Token::Number(_))) {
                        break;
                    }
                    let x = next_num!();
                    let y = next_num!();
                    let (nx, ny) = if is_relative { (cx + x, cy + y) } else { (x, y) };
                    if first {
                        out.push(Segment::MoveTo(nx, ny));
                        sx = nx;
                        sy = ny;
                        first = false;
                    } else {
                        out.push(Segment::LineTo(nx, ny));
                    }
                    cx = nx;
                    cy = ny;
                }
            }
            'L' => loop {
                if !matches!(tokens.get(i), Some(Token::Number(_))) {
                    break;
                }
                let x = next_num!();
                let y = next_num!();
                let (nx, ny) = if is_relative { (cx + x, cy + y) } else { (x, y) };
                out.push(Segment::LineTo(nx, ny));
                cx = nx;
                cy = ny;
            },
            'H' => loop {
                if !matches!(tokens.get(i), Some(Token::Number(_))) {
                    break;
                }
                let x = next_num!();
                let nx = if is_relative { cx + x } else { x };
                out.push(Segment::LineTo(nx, cy));
                cx = nx;
            },
            'V' => loop {
                if !matches!(tokens.get(i), Some(Token::Number(_))) {
                    break;
                }
                let y = next_num!();
                let ny = if is_relative { cy + y } else { y };
                out.push(Segment::LineTo(cx, ny));
                cy = ny;
            },
            'C' => loop {
                if !matches!(tokens.get(i), Some(Token::Number(_))) {
                    break;
                }
                let x1 = next_num!();
                let y1 = next_num!();
                let x2 = next_num!();
                let y2 = next_num!();
                let x = next_num!();
                let y = next_num!();
                let off = if is_relative { (cx, cy) } else { (0.0, 0.0) };
                out.push(Segment::CubicTo(
                    off.0 + x1,
                    off.1 + y1,
                    off.0 + x2,
                    off.1 + y2,
                    off.0 + x,
                    off.1 + y,
                ));
                cx = off.0 + x;
                cy = off.1 + y;
            },
            'Q' => loop {
                if !matches!(tokens.get(i), Some(Token::Number(_))) {
                    break;
                }
                let qx = next_num!();
                let qy = next_num!();
                let x = next_num!();
                let y = next_num!();
                let off = if is_relative { (cx, cy) } else { (0.0, 0.0) };
                let (qx, qy, x, y) = (off.0 + qx, off.1 + qy, off.0 + x, off.1 + y);
                // Quadratic-to-cubic elevation: c1 = p0 + 2/3(q - p0), c2 = p1 + 2/3(q - p1).
                let c1x = cx + 2.0 / 3.0 * (qx - cx);
                let c1y = cy + 2.0 / 3.0 * (qy - cy);
                let c2x = x + 2.0 / 3.0 * (qx - x);
                let c2y = y + 2.0 / 3.0 * (qy - y);
                out.push(Segment::CubicTo(c1x, c1y, c2x, c2y, x, y));
                cx = x;
                cy = y;
            },
            'A' => loop {
                if !matches!(tokens.get(i), Some(Token::Number(_))) {
                    break;
                }
                let rx = next_num!();
                let ry = next_num!();
                let rot = next_num!();
                let large_arc = next_num!() != 0.0;
                let sweep = next_num!() != 0.0;
                let x = next_num!();
                let y = next_num!();
                let (nx, ny) = if is_relative { (cx + x, cy + y) } else { (x, y) };
                arc_to_cubics(cx, cy, nx, ny, rx, ry, rot, large_arc, sweep, &mut out);
                cx = nx;
                cy = ny;
            },
            'Z' => {
                out.push(Segment::ClosePath);
                cx = sx;
                cy = sy;
            }
            _ => {
                // Unknown command: skip any immediately following numeric
                // operands so we don't misinterpret them as a new command.
                while matches!(tokens.get(i), Some(Token::Number(_))) {
                    i += 1;
                }
            }
        }

        last_cmd = Some(c);
    }

    let _ = last_cmd;
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

/// Splits path data into command letters and numeric operands. The
/// numeric grammar accepts an optional sign, integer and fractional
/// parts, and scientific notation (`1e-3`, `-2.5E2`); XPS path data also
/// allows numbers to run together without separators (`100.100` is two
/// numbers `100` and `.100` when a decimal point reappears), handled by
/// ending a number as soon as a second `.` is seen.
fn tokenize(data: &str) -> Vec<Token> {
    let chars: Vec<char> = data.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() || c == ',' {
            i += 1;
        } else if c.is_ascii_alphabetic() {
            tokens.push(Token::Command(c));
            i += 1;
        } else if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() {
            let start = i;
            let mut seen_dot = false;
            if c == '-' || c == '+' {
                i += 1;
            }
            while i < chars.len() {
                let c = chars[i];
                if c.is_ascii_digit() {
                    i += 1;
                } else if c == '.' && !seen_dot {
                    seen_dot = true;
                    i += 1;
                } else if (c == 'e' || c == 'E')
                    && i + 1 < chars.len()
                    && (chars[i + 1].is_ascii_digit() || chars[i + 1] == '-' || chars[i + 1] == '+')
                {
                    i += 2;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    break;
                } else {
                    break;
                }
            }
            let text: String = chars[start..i].iter().collect();
            if let Ok(n) = text.parse::<f64>() {
                tokens.push(Token::Number(n));
            }
        } else {
            i += 1;
        }
    }

    tokens
}

/// Elliptical-arc-to-cubic-Bézier conversion, endpoint parameterization
/// per spec §4.4 steps 1-7 (equivalently: the SVG/XPS arc algorithm).
#[allow(clippy::too_many_arguments)]
fn arc_to_cubics(
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    rx: f64,
    ry: f64,
    rot_deg: f64,
    large_arc: bool,
    sweep: bool,
    out: &mut Vec<Segment>,
) {
    // Step 1: degenerate cases become a straight line.
    if (x1 == x2 && y1 == y2) || rx == 0.0 || ry == 0.0 {
        out.push(Segment::LineTo(x2, y2));
        return;
    }

    // Step 2: absolute radii, rotate into the ellipse's own frame.
    let mut rx = rx.abs();
    let mut ry = ry.abs();
    let phi = rot_deg.to_radians();
    let (cos_phi, sin_phi) = (phi.cos(), phi.sin());

    let dx2 = (x1 - x2) / 2.0;
    let dy2 = (y1 - y2) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    // Step 3: scale up radii if the endpoints don't fit the ellipse.
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    // Step 4: center in the rotated frame.
    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let x1p2 = x1p * x1p;
    let y1p2 = y1p * y1p;
    let num = (rx2 * ry2 - rx2 * y1p2 - ry2 * x1p2).max(0.0);
    let den = rx2 * y1p2 + ry2 * x1p2;
    let coef = if den == 0.0 { 0.0 } else { (num / den).sqrt() };
    let coef = if large_arc == sweep { -coef } else { coef };
    let cxp = coef * (rx * y1p / ry);
    let cyp = coef * (-ry * x1p / rx);

    // Step 5: un-rotate to the actual center.
    let cx = cos_phi * cxp - sin_phi * cyp + (x1 + x2) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (y1 + y2) / 2.0;

    // Step 6: start angle and sweep angle.
    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;

    let theta1 = vec_angle(1.0, 0.0, ux, uy);
    let mut dtheta = vec_angle(ux, uy, vx, vy);

    if !sweep && dtheta > 0.0 {
        dtheta -= 2.0 * PI;
    } else if sweep && dtheta < 0.0 {
        dtheta += 2.0 * PI;
    }

    // Step 7: split into <= pi/2 segments, emit cubic Béziers.
    let num_segments = (dtheta.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
    let delta = dtheta / num_segments as f64;
    let alpha = 4.0 / 3.0 * (delta / 4.0).tan();

    let mut t1 = theta1;
    for _ in 0..num_segments {
        let t2 = t1 + delta;

        let (sin_t1, cos_t1) = t1.sin_cos();
        let (sin_t2, cos_t2) = t2.sin_cos();

        let e1x = -rx * sin_t1;
        let e1y = ry * cos_t1;
        let e2x = -rx * sin_t2;
        let e2y = ry * cos_t2;

        let p1x = cx + rx * cos_t1 * cos_phi - ry * sin_t1 * sin_phi;
        let p1y = cy + rx * cos_t1 * sin_phi + ry * sin_t1 * cos_phi;
        let p2x = cx + rx * cos_t2 * cos_phi - ry * sin_t2 * sin_phi;
        let p2y = cy + rx * cos_t2 * sin_phi + ry * sin_t2 * cos_phi;

        let q1x = p1x + alpha * (e1x * cos_phi - e1y * sin_phi);
        let q1y = p1y + alpha * (e1x * sin_phi + e1y * cos_phi);
        let q2x = p2x - alpha * (e2x * cos_phi - e2y * sin_phi);
        let q2y = p2y - alpha * (e2x * sin_phi + e2y * cos_phi);

        out.push(Segment::CubicTo(q1x, q1y, q2x, q2y, p2x, p2y));
        t1 = t2;
    }

    // Fix up any drift so the chain lands exactly on the caller-supplied
    // endpoint rather than the ellipse-parameterization's own estimate.
    if let Some(Segment::CubicTo(_, _, _, _, lx, ly)) = out.last_mut() {
        *lx = x2;
        *ly = y2;
    }
}

/// `vecAngle(u, v)` per spec §4.4: signed angle from `u` to `v`.
fn vec_angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
    let len_u = (ux * ux + uy * uy).sqrt();
    let len_v = (vx * vx + vy * vy).sqrt();
    if len_u * len_v == 0.0 {
        return 0.0;
    }
    let dot = (ux * vx + uy * vy) / (len_u * len_v);
    let angle = dot.clamp(-1.0, 1.0).acos();
    let sign = (ux * vy - uy * vx).signum();
    if sign == 0.0 {
        angle
    } else {
        sign * angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn moveto_lineto_close_sequence_is_order_preserving() {
        let segs = interpret("M 10,10 L 110,10 L 110,110 L 10,110 Z");
        assert_eq!(
            segs,
            vec![
                Segment::MoveTo(10.0, 10.0),
                Segment::LineTo(110.0, 10.0),
                Segment::LineTo(110.0, 110.0),
                Segment::LineTo(10.0, 110.0),
                Segment::ClosePath,
            ]
        );
    }

    #[test]
    fn implicit_command_repetition_for_moveto_becomes_lineto() {
        let segs = interpret("M 0,0 10,10 20,20");
        assert_eq!(
            segs,
            vec![
                Segment::MoveTo(0.0, 0.0),
                Segment::LineTo(10.0, 10.0),
                Segment::LineTo(20.0, 20.0),
            ]
        );
    }

    #[test]
    fn relative_and_absolute_pairs_are_equivalent() {
        let abs = interpret("M 1,2 L 5,9");
        let rel = interpret("M 1,2 l 4,7");
        assert_eq!(abs, rel);
    }

    #[test]
    fn unknown_command_is_skipped_not_fatal() {
        let segs = interpret("M 0,0 X 5 5 L 1,1");
        assert_eq!(segs, vec![Segment::MoveTo(0.0, 0.0), Segment::LineTo(1.0, 1.0)]);
    }

    #[test]
    fn horizontal_and_vertical_lines() {
        let segs = interpret("M 0,0 H 10 V 10");
        assert_eq!(
            segs,
            vec![
                Segment::MoveTo(0.0, 0.0),
                Segment::LineTo(10.0, 0.0),
                Segment::LineTo(10.0, 10.0),
            ]
        );
    }

    #[test]
    fn straight_line_semicircle_arc_hits_endpoint() {
        let segs = interpret("M 0,0 A 50 50 0 0 1 100 0");
        let last = segs.last().unwrap();
        match last {
            Segment::CubicTo(_, _, _, _, x, y) => {
                assert!((x - 100.0).abs() < 1e-4);
                assert!((y - 0.0).abs() < 1e-4);
            }
            other => panic!("expected CubicTo, got {other:?}"),
        }
        // at most two cubic Béziers for a semicircle
        let cubics = segs.iter().filter(|s| matches!(s, Segment::CubicTo(..))).count();
        assert!(cubics <= 2);
    }

    #[test]
    fn arc_with_equal_radii_ends_at_target_within_tolerance() {
        let segs = interpret("M 10,0 A 10 10 0 1 0 -10 0");
        if let Some(Segment::CubicTo(_, _, _, _, x, y)) = segs.last() {
            assert!((*x - (-10.0)).abs() < 1e-6 * 10.0);
            assert!((*y - 0.0).abs() < 1e-6 * 10.0);
        } else {
            panic!("expected an arc to produce a CubicTo");
        }
    }

    #[test]
    fn degenerate_zero_radius_arc_becomes_a_line() {
        let segs = interpret("M 0,0 A 0 0 0 0 0 10 10");
        assert_eq!(segs, vec![Segment::MoveTo(0.0, 0.0), Segment::LineTo(10.0, 10.0)]);
    }

    #[test]
    fn scientific_notation_is_tokenized() {
        let segs = interpret("M 1e1,-2.5E1 L 0,0");
        assert_eq!(segs[0], Segment::MoveTo(10.0, -25.0));
    }

    #[test]
    fn quadratic_bezier_is_elevated_to_cubic() {
        let segs = interpret("M 0,0 Q 5,10 10,0");
        assert_eq!(segs.len(), 2);
        assert!(matches!(segs[1], Segment::CubicTo(..)));
    }
}

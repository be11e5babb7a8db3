use crate::braille::BrailleCanvas;
use glam::IVec2;

/// Bresenham line between two pixels, both ends inclusive
pub fn draw_line(canvas: &mut BrailleCanvas, from: IVec2, to: IVec2) {
    let d = IVec2::new((to.x - from.x).abs(), -(to.y - from.y).abs());
    let step = IVec2::new((to.x - from.x).signum(), (to.y - from.y).signum());
    let mut err = d.x + d.y;
    let mut p = from;

    loop {
        canvas.set(p.x, p.y);
        if p == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= d.y {
            err += d.y;
            p.x += step.x;
        }
        if e2 <= d.x {
            err += d.x;
            p.y += step.y;
        }
    }
}

/// Line `width` pixels wide, offset down and right of the centre line
pub fn draw_thick_line(canvas: &mut BrailleCanvas, from: IVec2, to: IVec2, width: i32) {
    for offset in 0..width.max(1) {
        draw_line(canvas, from + IVec2::new(offset, 0), to + IVec2::new(offset, 0));
        draw_line(canvas, from + IVec2::new(0, offset), to + IVec2::new(0, offset));
    }
}

/// Filled disc
pub fn draw_circle(canvas: &mut BrailleCanvas, center: IVec2, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set(center.x + dx, center.y + dy);
            }
        }
    }
}

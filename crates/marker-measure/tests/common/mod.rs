#![allow(dead_code)]

use image::{GrayImage, Luma};

pub const BACKGROUND: u8 = 230;
pub const OBJECT: u8 = 40;
pub const MARKER_CODE: u64 = 0x1A2_B3C4;

/// Marker outline side in pixels: 100 px between corner pixel centres, so a
/// 20-unit perimeter calibrates to 20 px per unit.
pub const MARKER_PX: u32 = 101;

pub fn canvas(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([BACKGROUND]))
}

/// Bordered 5x5 marker with its top-left outline pixel at `(x0, y0)`.
pub fn paint_marker(img: &mut GrayImage, x0: u32, y0: u32) {
    for dy in 0..MARKER_PX {
        for dx in 0..MARKER_PX {
            let cx = dx * 7 / MARKER_PX;
            let cy = dy * 7 / MARKER_PX;
            let border = cx == 0 || cy == 0 || cx == 6 || cy == 6;
            let black = border || (MARKER_CODE >> ((cy - 1) * 5 + (cx - 1))) & 1 == 1;
            img.put_pixel(x0 + dx, y0 + dy, Luma([if black { 0 } else { 255 }]));
        }
    }
}

pub fn fill_rect(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, Luma([OBJECT]));
        }
    }
}

/// Filled rectangle of `w × h` px rotated by `angle_deg` about `(cx, cy)`.
pub fn fill_rotated_rect(img: &mut GrayImage, cx: f64, cy: f64, w: f64, h: f64, angle_deg: f64) {
    let (s, c) = angle_deg.to_radians().sin_cos();
    for y in 0..img.height() {
        for x in 0..img.width() {
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            let u = dx * c + dy * s;
            let v = -dx * s + dy * c;
            if u.abs() <= w / 2.0 && v.abs() <= h / 2.0 {
                img.put_pixel(x, y, Luma([OBJECT]));
            }
        }
    }
}

/// Marker at (40, 40) and three objects, in contour order:
/// 5 x 8, 10 x 15 (tallest) and 6 x 7 units.
pub fn scene() -> GrayImage {
    let mut img = canvas(640, 480);
    paint_marker(&mut img, 40, 40);
    fill_rect(&mut img, 200, 40, 101, 161);
    fill_rect(&mut img, 340, 60, 201, 301);
    fill_rect(&mut img, 60, 250, 121, 141);
    img
}

pub const SCENE_SIZES: [(f64, f64); 3] = [(5.0, 8.0), (10.0, 15.0), (6.0, 7.0)];

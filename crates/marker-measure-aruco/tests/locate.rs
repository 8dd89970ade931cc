use image::{GrayImage, Luma};
use marker_measure_aruco::{
    locate_all, locate_marker, rotate_code_u64, Dictionary, LocateConfig, LocateError,
    MarkerDictionary, MarkerLocator, MultipleMarkerPolicy,
};
use nalgebra::Point2;

const CODE_A: u64 = 0x1A2_B3C4;
const CODE_B: u64 = 0x05E_6F70;

/// Paint a bordered 5x5 marker with its top-left outline pixel at `(x0, y0)`.
fn paint_marker(img: &mut GrayImage, code: u64, x0: u32, y0: u32, cell_px: u32) {
    let cells = 7u32;
    for cy in 0..cells {
        for cx in 0..cells {
            let border = cx == 0 || cy == 0 || cx + 1 == cells || cy + 1 == cells;
            let black = border || (code >> ((cy - 1) * 5 + (cx - 1))) & 1 == 1;
            let v = if black { 0 } else { 255 };
            for yy in 0..cell_px {
                for xx in 0..cell_px {
                    img.put_pixel(x0 + cx * cell_px + xx, y0 + cy * cell_px + yy, Luma([v]));
                }
            }
        }
    }
}

/// Paint a bordered 5x5 marker of `side` px centred at `(cx, cy)` and turned
/// clockwise on screen by `angle_deg`.
fn paint_rotated_marker(img: &mut GrayImage, code: u64, cx: f64, cy: f64, side: f64, angle_deg: f64) {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let half = side / 2.0;
    let cell = side / 7.0;
    for y in 0..img.height() {
        for x in 0..img.width() {
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            let u = dx * c + dy * s + half;
            let v = -dx * s + dy * c + half;
            if !(0.0..side).contains(&u) || !(0.0..side).contains(&v) {
                continue;
            }
            let (gx, gy) = ((u / cell) as u64, (v / cell) as u64);
            let border = gx == 0 || gy == 0 || gx == 6 || gy == 6;
            let black = border || (code >> ((gy - 1) * 5 + (gx - 1))) & 1 == 1;
            img.put_pixel(x, y, Luma([if black { 0 } else { 255 }]));
        }
    }
}

fn table() -> Dictionary {
    Dictionary {
        name: "TEST_5X5_2".to_string(),
        marker_size: 5,
        max_correction_bits: 0,
        codes: vec![CODE_A, CODE_B],
    }
}

fn table_config() -> LocateConfig {
    LocateConfig {
        dictionary: MarkerDictionary::Codes(table()),
        ..LocateConfig::default()
    }
}

#[test]
fn locates_single_marker_outline() {
    let mut img = GrayImage::from_pixel(320, 240, Luma([255]));
    paint_marker(&mut img, CODE_A, 60, 50, 12);

    let det = locate_marker(&img, &LocateConfig::default()).expect("marker");
    assert_eq!(det.id, None);
    assert_eq!(det.code, CODE_A);
    assert_eq!(
        det.corners,
        [
            Point2::new(60.0, 50.0),
            Point2::new(143.0, 50.0),
            Point2::new(143.0, 133.0),
            Point2::new(60.0, 133.0),
        ]
    );
    assert_eq!(det.perimeter(), 4.0 * 83.0);
}

#[test]
fn code_table_reports_id_and_true_top_left() {
    let mut img = GrayImage::from_pixel(320, 240, Luma([255]));
    // the marker is printed turned a quarter clockwise
    paint_marker(&mut img, rotate_code_u64(CODE_B, 5, 1), 60, 50, 12);

    let det = locate_marker(&img, &table_config()).expect("marker");
    assert_eq!(det.id, Some(1));
    assert_eq!(det.hamming, 0);
    assert_eq!(det.corners[0], Point2::new(143.0, 50.0));
    assert_eq!(det.corners[1], Point2::new(143.0, 133.0));
}

#[test]
fn rotated_marker_outline_follows_the_tilt() {
    let (cx, cy, side) = (200.0, 200.0, 140.0);
    for angle in [10.0f64, 25.0, 40.0] {
        let mut img = GrayImage::from_pixel(400, 400, Luma([230]));
        paint_rotated_marker(&mut img, CODE_A, cx, cy, side, angle);

        let det = locate_marker(&img, &table_config()).expect("marker");
        assert_eq!(det.id, Some(0), "angle {angle}");

        // corners sit on boundary pixel centres, slightly inside the true outline
        let perimeter = det.perimeter();
        assert!(
            perimeter > 4.0 * side - 10.0 && perimeter < 4.0 * side,
            "angle {angle}: perimeter {perimeter}"
        );

        // corners[0] is the marker's own top-left corner, wherever it lands
        let (s, c) = angle.to_radians().sin_cos();
        let half = side / 2.0;
        let true_corners = [(-half, -half), (half, -half), (half, half), (-half, half)]
            .map(|(u, v)| (cx + u * c - v * s, cy + u * s + v * c));
        for (found, (tx, ty)) in det.corners.iter().zip(true_corners) {
            let d = (found.x as f64 - tx).hypot(found.y as f64 - ty);
            assert!(d < 3.0, "angle {angle}: corner {found:?} vs ({tx:.1}, {ty:.1})");
        }
    }
}

#[test]
fn unknown_code_is_not_a_marker() {
    let mut img = GrayImage::from_pixel(320, 240, Luma([255]));
    paint_marker(&mut img, 0x0F0_F0F1, 60, 50, 12);

    let err = locate_marker(&img, &table_config()).unwrap_err();
    assert_eq!(err, LocateError::MarkerNotFound);
}

#[test]
fn blank_image_has_no_marker() {
    let img = GrayImage::from_pixel(200, 150, Luma([200]));
    let err = locate_marker(&img, &LocateConfig::default()).unwrap_err();
    assert_eq!(err, LocateError::MarkerNotFound);
}

#[test]
fn solid_dark_square_is_rejected() {
    let mut img = GrayImage::from_pixel(240, 200, Luma([230]));
    for y in 40..140 {
        for x in 50..150 {
            img.put_pixel(x, y, Luma([30]));
        }
    }
    assert!(locate_all(&img, &LocateConfig::default())
        .expect("config")
        .is_empty());
}

#[test]
fn multiple_marker_policy_is_explicit() {
    let mut img = GrayImage::from_pixel(400, 240, Luma([255]));
    paint_marker(&mut img, CODE_A, 30, 30, 12);
    paint_marker(&mut img, CODE_B, 220, 60, 16);

    let largest = MarkerLocator::new(table_config()).expect("locator");
    assert_eq!(largest.locate_all(&img).len(), 2);
    let det = largest.locate(&img).expect("marker");
    assert_eq!(det.id, Some(1));
    assert_eq!(det.corners[0], Point2::new(220.0, 60.0));

    let reject = MarkerLocator::new(LocateConfig {
        multiple_markers: MultipleMarkerPolicy::Reject,
        ..table_config()
    })
    .expect("locator");
    assert_eq!(
        reject.locate(&img).unwrap_err(),
        LocateError::AmbiguousMarker { count: 2 }
    );
}

#[test]
fn invalid_dictionary_is_reported() {
    let cfg = LocateConfig {
        dictionary: MarkerDictionary::AnyCode { marker_size: 9 },
        ..LocateConfig::default()
    };
    let img = GrayImage::from_pixel(64, 64, Luma([255]));
    assert!(matches!(
        locate_marker(&img, &cfg),
        Err(LocateError::InvalidDictionary { .. })
    ));
}

#[test]
fn config_round_trips_through_json() {
    let cfg = table_config();
    let raw = serde_json::to_string(&cfg).expect("serialize");
    let back: LocateConfig = serde_json::from_str(&raw).expect("deserialize");
    assert_eq!(back, cfg);

    let defaults: LocateConfig = serde_json::from_str("{}").expect("defaults");
    assert_eq!(defaults, LocateConfig::default());
}

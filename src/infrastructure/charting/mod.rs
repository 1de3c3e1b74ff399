//! Raster chart rendering for forecast runs.

mod forecast_chart;

pub use forecast_chart::{ChartConfig, ForecastChartRenderer};

use image::{Rgb, RgbImage};

/// Common color definitions
pub mod colors {
    use image::Rgb;

    pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    pub const LIGHT_GRAY: Rgb<u8> = Rgb([200, 200, 200]);
    pub const BLUE: Rgb<u8> = Rgb([31, 119, 180]);
}

/// Interpolate between two colors
pub fn interpolate_color(c1: Rgb<u8>, c2: Rgb<u8>, t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    Rgb([
        ((1.0 - t) * c1.0[0] as f64 + t * c2.0[0] as f64) as u8,
        ((1.0 - t) * c1.0[1] as f64 + t * c2.0[1] as f64) as u8,
        ((1.0 - t) * c1.0[2] as f64 + t * c2.0[2] as f64) as u8,
    ])
}

/// Vertical run of pixels, clipped to the image
pub fn draw_vertical_line(img: &mut RgbImage, x: u32, y1: u32, y2: u32, color: Rgb<u8>) {
    let (start, end) = if y1 < y2 { (y1, y2) } else { (y2, y1) };
    if x >= img.width() || img.height() == 0 {
        return;
    }
    for y in start..=end.min(img.height() - 1) {
        img.put_pixel(x, y, color);
    }
}

/// Horizontal run of pixels, clipped to the image
pub fn draw_horizontal_line(img: &mut RgbImage, y: u32, x1: u32, x2: u32, color: Rgb<u8>) {
    let (start, end) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
    if y >= img.height() || img.width() == 0 {
        return;
    }
    for x in start..=end.min(img.width() - 1) {
        img.put_pixel(x, y, color);
    }
}

/// Bresenham segment between two points, clipped to the image
pub fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x0 >= 0 && y0 >= 0 && (x0 as u32) < img.width() && (y0 as u32) < img.height() {
            img.put_pixel(x0 as u32, y0 as u32, color);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_color() {
        let mid = interpolate_color(Rgb([0, 0, 0]), Rgb([255, 255, 255]), 0.5);
        assert_eq!(mid, Rgb([127, 127, 127]));
    }

    #[test]
    fn test_draw_line_endpoints() {
        let mut img = RgbImage::from_pixel(10, 10, colors::WHITE);
        draw_line(&mut img, (1, 1), (8, 5), colors::BLACK);

        assert_eq!(*img.get_pixel(1, 1), colors::BLACK);
        assert_eq!(*img.get_pixel(8, 5), colors::BLACK);
        assert_eq!(*img.get_pixel(8, 1), colors::WHITE);
    }

    #[test]
    fn test_lines_clip_to_image() {
        let mut img = RgbImage::from_pixel(4, 4, colors::WHITE);
        draw_line(&mut img, (-5, 2), (10, 2), colors::BLUE);
        draw_vertical_line(&mut img, 1, 0, 100, colors::BLACK);
        draw_horizontal_line(&mut img, 100, 0, 3, colors::BLACK);

        assert_eq!(*img.get_pixel(3, 2), colors::BLUE);
        assert_eq!(*img.get_pixel(1, 3), colors::BLACK);
    }
}

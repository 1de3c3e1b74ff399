use super::{colors, draw_horizontal_line, draw_line, draw_vertical_line, interpolate_color};
use crate::domain::forecast::IntervalForecast;
use crate::domain::ports::ForecastSink;
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Chart configuration
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub background: Rgb<u8>,
    pub mean_color: Rgb<u8>,
    pub band_color: Rgb<u8>,
    pub grid_color: Rgb<u8>,
    pub grid_lines: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 700,
            margin: 50,
            background: colors::WHITE,
            mean_color: colors::BLUE,
            // Band drawn at 20% opacity over the background
            band_color: interpolate_color(colors::WHITE, colors::BLUE, 0.2),
            grid_color: interpolate_color(colors::WHITE, colors::LIGHT_GRAY, 0.3),
            grid_lines: 8,
        }
    }
}

/// Maps data coordinates into the plot area.
struct Projection {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    t0: i64,
    t_span: i64,
    y_lo: f64,
    y_hi: f64,
}

impl Projection {
    fn new(config: &ChartConfig, forecasts: &[IntervalForecast]) -> Self {
        let t0 = forecasts.first().map(|f| f.timestamp.timestamp_micros()).unwrap_or(0);
        let t1 = forecasts.last().map(|f| f.timestamp.timestamp_micros()).unwrap_or(0);

        let mut lo = forecasts
            .iter()
            .map(|f| f.lower_bound)
            .filter(|v| v.is_finite())
            .fold(f64::INFINITY, f64::min);
        let mut hi = forecasts
            .iter()
            .map(|f| f.upper_bound)
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        if !lo.is_finite() || !hi.is_finite() {
            lo = -1.0;
            hi = 1.0;
        }
        let range = hi - lo;
        let pad = if range > 0.0 {
            range * 0.05
        } else {
            (lo.abs() * 0.05).max(1e-9)
        };

        Self {
            left: config.margin as f64,
            right: config.width.saturating_sub(config.margin + 1) as f64,
            top: config.margin as f64,
            bottom: config.height.saturating_sub(config.margin + 1) as f64,
            t0,
            t_span: t1 - t0,
            y_lo: lo - pad,
            y_hi: hi + pad,
        }
    }

    fn x(&self, forecast: &IntervalForecast) -> i64 {
        if self.t_span <= 0 {
            return ((self.left + self.right) / 2.0).round() as i64;
        }
        let frac = (forecast.timestamp.timestamp_micros() - self.t0) as f64 / self.t_span as f64;
        (self.left + frac * (self.right - self.left)).round() as i64
    }

    fn y(&self, value: f64) -> i64 {
        let frac = (value - self.y_lo) / (self.y_hi - self.y_lo);
        (self.bottom - frac * (self.bottom - self.top)).round() as i64
    }
}

/// Renders the mean forecast as a line over its shaded confidence band.
pub struct ForecastChartRenderer {
    output_path: PathBuf,
    config: ChartConfig,
}

impl ForecastChartRenderer {
    pub fn new(output_path: PathBuf) -> Self {
        Self::with_config(output_path, ChartConfig::default())
    }

    pub fn with_config(output_path: PathBuf, config: ChartConfig) -> Self {
        Self {
            output_path,
            config,
        }
    }

    pub fn render(&self, forecasts: &[IntervalForecast]) -> RgbImage {
        let cfg = &self.config;
        let mut img = RgbImage::from_pixel(cfg.width, cfg.height, cfg.background);
        let proj = Projection::new(cfg, forecasts);

        self.draw_grid(&mut img, &proj);

        // Band
        let columns = |x: i64| x.max(0) as u32;
        match forecasts {
            [] => {}
            [only] => {
                let x = proj.x(only);
                draw_vertical_line(
                    &mut img,
                    columns(x),
                    columns(proj.y(only.upper_bound)),
                    columns(proj.y(only.lower_bound)),
                    cfg.band_color,
                );
            }
            _ => {
                for pair in forecasts.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    let (xa, xb) = (proj.x(a), proj.x(b));
                    for px in xa..=xb {
                        let t = if xb > xa {
                            (px - xa) as f64 / (xb - xa) as f64
                        } else {
                            0.0
                        };
                        let upper = a.upper_bound + t * (b.upper_bound - a.upper_bound);
                        let lower = a.lower_bound + t * (b.lower_bound - a.lower_bound);
                        draw_vertical_line(
                            &mut img,
                            columns(px),
                            columns(proj.y(upper)),
                            columns(proj.y(lower)),
                            cfg.band_color,
                        );
                    }
                }
            }
        }

        // Mean
        for pair in forecasts.windows(2) {
            draw_line(
                &mut img,
                (proj.x(&pair[0]), proj.y(pair[0].predicted_mean)),
                (proj.x(&pair[1]), proj.y(pair[1].predicted_mean)),
                cfg.mean_color,
            );
        }
        if let [only] = forecasts {
            let point = (proj.x(only), proj.y(only.predicted_mean));
            draw_line(&mut img, point, point, cfg.mean_color);
        }

        // Axes
        let (left, bottom) = (proj.left as u32, proj.bottom as u32);
        draw_vertical_line(&mut img, left, proj.top as u32, bottom, colors::BLACK);
        draw_horizontal_line(&mut img, bottom, left, proj.right as u32, colors::BLACK);

        img
    }

    fn draw_grid(&self, img: &mut RgbImage, proj: &Projection) {
        let n = self.config.grid_lines;
        if n == 0 {
            return;
        }
        for k in 1..n {
            let frac = k as f64 / n as f64;
            let x = (proj.left + frac * (proj.right - proj.left)).round() as u32;
            let y = (proj.top + frac * (proj.bottom - proj.top)).round() as u32;
            draw_vertical_line(img, x, proj.top as u32, proj.bottom as u32, self.config.grid_color);
            draw_horizontal_line(img, y, proj.left as u32, proj.right as u32, self.config.grid_color);
        }
    }
}

impl ForecastSink for ForecastChartRenderer {
    fn write(&self, forecasts: &[IntervalForecast]) -> Result<()> {
        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create chart directory {:?}", parent))?;
        }

        let img = self.render(forecasts);
        img.save(&self.output_path)
            .with_context(|| format!("Failed to save chart {:?}", self.output_path))?;

        info!("Saved forecast chart to {:?}", self.output_path);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("chart {:?}", self.output_path)
    }
}

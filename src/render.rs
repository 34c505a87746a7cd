//! Renders the summary image from the persisted aggregate.
//!
//! The image is published with a write-to-temp-then-rename so the serving
//! endpoint never observes a partially written file.

use crate::store::{CountryRecord, CountryStore, StoreError};
use chrono::{DateTime, Utc};
use embedded_graphics::{
    mono_font::{
        MonoTextStyle,
        ascii::{FONT_9X15, FONT_9X15_BOLD, FONT_10X20},
    },
    pixelcolor::Rgb888,
    prelude::*,
    text::{Alignment, Text},
};
use image::{ImageFormat, Rgb, RgbImage};
use std::convert::Infallible;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const WIDTH: u32 = 600;
pub const HEIGHT: u32 = 400;

const BACKGROUND: Rgb<u8> = Rgb([0x1d, 0x2b, 0x53]);
const TEXT: Rgb888 = Rgb888::WHITE;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("summary query failed: {0}")]
    Query(#[from] StoreError),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("image write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapts an `RgbImage` to an embedded-graphics draw target so the bitmap
/// fonts can be blitted straight into the PNG buffer.
struct Canvas(RgbImage);

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Infallible>
    where
        I: IntoIterator<Item = Pixel<Rgb888>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < self.0.width()
                && (point.y as u32) < self.0.height()
            {
                self.0.put_pixel(
                    point.x as u32,
                    point.y as u32,
                    Rgb([color.r(), color.g(), color.b()]),
                );
            }
        }
        Ok(())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.0.width(), self.0.height())
    }
}

fn gdp_label(record: &CountryRecord) -> String {
    record
        .estimated_gdp
        .map_or("N/A".to_string(), |gdp| format!("{gdp:.0}"))
}

/// Draws the fixed 600x400 layout: title, total count, render timestamp and
/// the ranked top entries. An empty `top` slice still renders a valid image.
pub fn render_summary(total: u64, top: &[CountryRecord], now: DateTime<Utc>) -> RgbImage {
    let mut canvas = Canvas(RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND));

    let title = MonoTextStyle::new(&FONT_10X20, TEXT);
    let body = MonoTextStyle::new(&FONT_9X15, TEXT);
    let heading = MonoTextStyle::new(&FONT_9X15_BOLD, TEXT);

    // Drawing into the canvas is infallible; the unwraps cannot fire.
    Text::with_alignment(
        "Country GDP Summary",
        Point::new(WIDTH as i32 / 2, 50),
        title,
        Alignment::Center,
    )
    .draw(&mut canvas)
    .unwrap();

    Text::new(
        &format!("Total Countries: {total}"),
        Point::new(30, 100),
        body,
    )
    .draw(&mut canvas)
    .unwrap();

    let timestamp = now.format("%Y-%m-%d %H:%M:%S");
    Text::new(
        &format!("Last Refresh (UTC): {timestamp}"),
        Point::new(30, 130),
        body,
    )
    .draw(&mut canvas)
    .unwrap();

    Text::new(
        "Top 5 Countries by Estimated GDP:",
        Point::new(30, 190),
        heading,
    )
    .draw(&mut canvas)
    .unwrap();

    let mut y = 230;
    for (index, record) in top.iter().enumerate() {
        let line = format!("{}. {} - ${}", index + 1, record.name, gdp_label(record));
        Text::new(&line, Point::new(50, y), body)
            .draw(&mut canvas)
            .unwrap();
        y += 30;
    }

    canvas.0
}

/// Reads the aggregate from the store, renders it and atomically replaces
/// the cached image at `path`.
pub async fn write_summary(store: &dyn CountryStore, path: &Path) -> Result<(), RenderError> {
    let total = store.count().await?;
    let top = store.top_by_gdp(5).await?;

    let image = render_summary(total, &top, Utc::now());

    let mut encoded = Vec::new();
    image.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let staging = path.with_extension("tmp");
    std::fs::write(&staging, &encoded)?;
    std::fs::rename(&staging, path)?;

    info!(path = %path.display(), "Summary image saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EnrichedCountry, memory::MemoryStore};
    use tempfile::tempdir;

    fn record(name: &str, gdp: Option<f64>) -> CountryRecord {
        CountryRecord {
            name: name.to_string(),
            capital: None,
            region: None,
            population: Some(100),
            flag_url: None,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: gdp,
            last_refreshed_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_empty_store() {
        let image = render_summary(0, &[], Utc::now());
        assert_eq!(image.dimensions(), (WIDTH, HEIGHT));
        // Corner pixel keeps the background color.
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn test_render_with_entries_changes_pixels() {
        let top = vec![record("Testland", Some(150000.0)), record("Ghost", None)];
        let image = render_summary(2, &top, Utc::now());

        // Some pixel in the list area must be text-colored.
        let painted = (0..WIDTH).any(|x| *image.get_pixel(x, 225) == Rgb([0xff, 0xff, 0xff]));
        assert!(painted);
    }

    #[tokio::test]
    async fn test_write_summary_produces_decodable_png() {
        let store = MemoryStore::new();
        store
            .upsert(EnrichedCountry {
                name: "Testland".to_string(),
                capital: None,
                region: None,
                population: Some(1000),
                flag_url: None,
                currency_code: Some("TST".to_string()),
                exchange_rate: Some(10.0),
                estimated_gdp: Some(150000.0),
            })
            .await
            .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("cache").join("summary.png");

        write_summary(&store, &path).await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), WIDTH);
        assert_eq!(decoded.height(), HEIGHT);
        // The staging file was renamed away.
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_write_summary_empty_store_still_writes() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.png");

        write_summary(&store, &path).await.unwrap();
        assert!(path.exists());
    }
}

//! Flag images for the terminal.
//!
//! A flag is downloaded once per URL and kept decoded. For display it is
//! resized so that every terminal cell carries two vertically stacked pixels,
//! drawn with the upper half-block glyph.

use crate::error::FlagError;
use image::DynamicImage;
use image::imageops::FilterType;
use reqwest::blocking::Client;
use std::collections::HashMap;

pub type Rgb = [u8; 3];

/// A flag downsampled to a grid of terminal cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagImage {
    columns: u16,
    rows: u16,
    // (upper pixel, lower pixel) per cell, row-major
    cells: Vec<(Rgb, Rgb)>,
}

impl FlagImage {
    /// Scales `image` to fit `max_columns` x `max_rows` cells, keeping its
    /// aspect ratio.
    #[must_use]
    pub fn fit(image: &DynamicImage, max_columns: u16, max_rows: u16) -> Self {
        let (width, height) = (image.width().max(1), image.height().max(1));
        let max_w = f64::from(max_columns.max(1));
        let max_h = f64::from(max_rows.max(1)) * 2.0;
        let scale = (max_w / f64::from(width)).min(max_h / f64::from(height));

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let columns = ((f64::from(width) * scale).round() as u32).clamp(1, u32::from(max_columns.max(1)));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pixel_rows = ((f64::from(height) * scale).round() as u32).clamp(2, u32::from(max_rows.max(1)) * 2);
        let rows = pixel_rows.div_ceil(2);

        let resized = image
            .resize_exact(columns, rows * 2, FilterType::Triangle)
            .to_rgb8();
        let mut cells = Vec::with_capacity((columns * rows) as usize);
        for row in 0..rows {
            for column in 0..columns {
                let upper = resized.get_pixel(column, row * 2).0;
                let lower = resized.get_pixel(column, row * 2 + 1).0;
                cells.push((upper, lower));
            }
        }

        Self {
            columns: u16::try_from(columns).unwrap_or(u16::MAX),
            rows: u16::try_from(rows).unwrap_or(u16::MAX),
            cells,
        }
    }

    #[must_use]
    pub fn columns(&self) -> u16 {
        self.columns
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn row_cells(&self) -> impl Iterator<Item = &[(Rgb, Rgb)]> {
        self.cells.chunks(usize::from(self.columns.max(1)))
    }
}

/// Downloads and decodes a single flag.
pub fn fetch_flag(client: &Client, url: &str) -> Result<DynamicImage, FlagError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FlagError::Status(status));
    }
    let bytes = response.bytes()?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Per-process store of decoded flags, keyed by URL.
///
/// Failed downloads are remembered too, so a broken URL is only tried once.
pub struct FlagStore {
    client: Client,
    flags: HashMap<String, Option<DynamicImage>>,
}

impl FlagStore {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            flags: HashMap::new(),
        }
    }

    pub fn get(&mut self, url: &str) -> Option<&DynamicImage> {
        if url.is_empty() {
            return None;
        }
        if !self.flags.contains_key(url) {
            let flag = match fetch_flag(&self.client, url) {
                Ok(image) => Some(image),
                Err(e) => {
                    log::warn!("Flag unavailable for {url}: {e}");
                    None
                }
            };
            self.flags.insert(url.to_string(), flag);
        }
        self.flags.get(url).and_then(Option::as_ref)
    }

    /// Looks up a flag without downloading it. The outer `None` means the URL
    /// has not been tried yet.
    #[must_use]
    pub fn peek(&self, url: &str) -> Option<Option<&DynamicImage>> {
        self.flags.get(url).map(Option::as_ref)
    }

    #[cfg(test)]
    fn insert(&mut self, url: &str, image: Option<DynamicImage>) {
        self.flags.insert(url.to_string(), image);
    }
}

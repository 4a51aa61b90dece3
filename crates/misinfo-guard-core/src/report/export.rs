//! Bitmap export of the visible report region into a single-page PDF.
//!
//! The capture is a raster of what the viewport shows, not a re-layout of the
//! document: rows scrolled out of view are absent from the output, and glyphs
//! the bitmap font lacks are drawn as filled boxes.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::{debug, info, instrument, warn};

use super::{RenderedReport, Viewport};
use crate::error::ErrorInfo;

pub const EXPORT_FILENAME: &str = "misinfo-report.pdf";

const GLYPH_SIZE: u32 = 8;
const LINE_HEIGHT: u32 = 10;
const SCALE: u32 = 2;
const MARGIN: u32 = 12;
const PAPER: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([20, 20, 20]);
const MISSING_GLYPH: [u8; 8] = [0x00, 0x7E, 0x7E, 0x7E, 0x7E, 0x7E, 0x7E, 0x00];

const MM: f32 = 72.0 / 25.4;
const PAGE_WIDTH_PT: f32 = 595.28;
const PAGE_HEIGHT_PT: f32 = 841.89;
const IMAGE_OFFSET_PT: f32 = 10.0 * MM;
const IMAGE_WIDTH_PT: f32 = 180.0 * MM;
const IMAGE_HEIGHT_PT: f32 = 160.0 * MM;
const IMAGE_NAME: &str = "Im0";

/// Pixel size of a capture for the given viewport.
pub fn capture_size(columns: usize, rows: usize) -> (u32, u32) {
    let width = columns as u32 * GLYPH_SIZE * SCALE + 2 * MARGIN;
    let height = rows as u32 * LINE_HEIGHT * SCALE + 2 * MARGIN;
    (width, height)
}

/// Rasterize the visible rows of a rendered report.
pub fn capture(rendered: &RenderedReport) -> Result<RgbImage, ErrorInfo> {
    let Viewport { columns, rows, .. } = rendered.viewport;
    if columns == 0 || rows == 0 {
        return Err(ErrorInfo::export("report region is empty; nothing to capture"));
    }
    let (width, height) = capture_size(columns, rows);
    let mut canvas = RgbImage::from_pixel(width, height, PAPER);

    for (row, line) in rendered.visible.iter().take(rows).enumerate() {
        for (col, ch) in line.chars().take(columns).enumerate() {
            let x = MARGIN + col as u32 * GLYPH_SIZE * SCALE;
            let y = MARGIN + row as u32 * LINE_HEIGHT * SCALE;
            draw_glyph(&mut canvas, x, y, glyph_for(ch));
        }
    }
    Ok(canvas)
}

fn glyph_for(ch: char) -> [u8; 8] {
    if ch.is_whitespace() {
        return [0; 8];
    }
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .unwrap_or(MISSING_GLYPH)
}

fn draw_glyph(canvas: &mut RgbImage, x: u32, y: u32, glyph: [u8; 8]) {
    for (dy, bits) in glyph.iter().enumerate() {
        for dx in 0..GLYPH_SIZE {
            if bits & (1 << dx) == 0 {
                continue;
            }
            for sy in 0..SCALE {
                for sx in 0..SCALE {
                    let px = x + dx * SCALE + sx;
                    let py = y + dy as u32 * SCALE + sy;
                    if px < canvas.width() && py < canvas.height() {
                        canvas.put_pixel(px, py, INK);
                    }
                }
            }
        }
    }
}

/// Build a one-page A4 document holding `image` at the fixed offset and size.
pub fn build_document(image: &RgbImage) -> Result<Document, ErrorInfo> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width()),
            "Height" => i64::from(image.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    ));

    // PDF origin is bottom-left; the image hangs from the top margin.
    let bottom = PAGE_HEIGHT_PT - IMAGE_OFFSET_PT - IMAGE_HEIGHT_PT;
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    IMAGE_WIDTH_PT.into(),
                    0.into(),
                    0.into(),
                    IMAGE_HEIGHT_PT.into(),
                    IMAGE_OFFSET_PT.into(),
                    bottom.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|err| ErrorInfo::export(format!("failed to encode page content: {err}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image_id,
            },
        },
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH_PT.into(), PAGE_HEIGHT_PT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

/// Capture the rendered report and persist it as `dir/misinfo-report.pdf`.
#[instrument(skip(rendered, dir), fields(rows = rendered.visible.len(), dir = %dir.display()))]
pub fn export_to_file(rendered: &RenderedReport, dir: &Path) -> Result<PathBuf, ErrorInfo> {
    let image = capture(rendered)?;
    debug!(width = image.width(), height = image.height(), "captured report region");
    let mut doc = build_document(&image)?;

    let path = dir.join(EXPORT_FILENAME);
    write_file(&path, |writer| {
        doc.save_to(writer)?;
        Ok(())
    })?;
    info!(path = %path.display(), "report exported");
    Ok(path)
}

/// Create `path` and fill it through `write`. A failed write removes the
/// partial file.
fn write_file<F>(path: &Path, write: F) -> Result<(), ErrorInfo>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file = File::create(path).map_err(|err| {
        ErrorInfo::export(format!("failed to create {}: {err}", path.display()))
    })?;
    let mut writer = BufWriter::new(file);
    let written = write(&mut writer).and_then(|()| writer.flush());
    drop(writer);
    if let Err(err) = written {
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %cleanup, "failed to remove partial export");
        }
        return Err(ErrorInfo::export(format!(
            "failed to write {}: {err}",
            path.display()
        )));
    }
    Ok(())
}

//! Pixel buffer loading
//!
//! Decodes files into `RasterImage`, tags the source format and gathers the
//! metadata facts the core cannot read on its own (EXIF capture date and
//! tag count, file timestamps).

use chrono::{DateTime, NaiveDate, Utc};
use forensic_core::{ForensicError, MetadataFacts, RasterImage, Result, SourceFormat};
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "jpe", "jfif", "webp", "gif", "tiff", "tif", "bmp",
];

#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub raster: RasterImage,
    pub format: SourceFormat,
    pub metadata: MetadataFacts,
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files under `dir`, sorted by path so frame order is stable.
pub fn collect_files(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let walker = if recursive {
        WalkDir::new(dir).follow_links(true)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_image_extension(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format().ok_or_else(|| {
        ForensicError::UnsupportedContentType(format!("{}: not a recognised image", path.display()))
    })?;

    let mut decoder = reader.into_decoder()?;
    let exif = decoder.exif_metadata()?;
    let image = DynamicImage::from_decoder(decoder)?;
    let raster = RasterImage::from_dynamic(&image)?;

    let metadata = file_facts(path, format, exif.as_deref())?;
    tracing::debug!(
        path = %path.display(),
        format = ?format,
        width = raster.width(),
        height = raster.height(),
        exif_tags = ?metadata.exif_tag_count,
        "image loaded"
    );

    Ok(LoadedImage {
        path: path.to_path_buf(),
        raster,
        format: SourceFormat::from(format),
        metadata,
    })
}

fn carries_exif(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Tiff
    )
}

fn file_facts(path: &Path, format: ImageFormat, exif: Option<&[u8]>) -> Result<MetadataFacts> {
    let meta = std::fs::metadata(path)?;
    let exif = exif.and_then(read_exif);
    let taken = exif.as_ref().and_then(|e| e.taken);
    Ok(MetadataFacts {
        // Filesystem birth time only stands in when EXIF carries no date.
        created: taken.or_else(|| meta.created().ok().map(DateTime::<Utc>::from)),
        modified: meta.modified().ok().map(DateTime::<Utc>::from),
        exif_tag_count: carries_exif(format).then(|| exif.map(|e| e.tag_count).unwrap_or(0)),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifFacts {
    /// Fields of the primary image, sub-IFDs included.
    pub tag_count: usize,
    pub taken: Option<DateTime<Utc>>,
}

/// Parse a raw EXIF block as returned by the decoder. `None` when the block
/// is not valid TIFF-structured EXIF.
pub fn read_exif(raw: &[u8]) -> Option<ExifFacts> {
    let tiff = raw.strip_prefix(b"Exif\0\0").unwrap_or(raw);
    let exif = match exif::Reader::new().read_raw(tiff.to_vec()) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "unreadable EXIF block");
            return None;
        }
    };

    let tag_count = exif
        .fields()
        .filter(|f| f.ifd_num == exif::In::PRIMARY)
        .count();
    let taken = [exif::Tag::DateTimeOriginal, exif::Tag::DateTime]
        .into_iter()
        .find_map(|tag| exif.get_field(tag, exif::In::PRIMARY).and_then(exif_date));

    Some(ExifFacts { tag_count, taken })
}

/// EXIF dates carry no zone; they are read as UTC.
fn exif_date(field: &exif::Field) -> Option<DateTime<Utc>> {
    let exif::Value::Ascii(ref parts) = field.value else {
        return None;
    };
    let dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
    NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?
        .and_hms_opt(dt.hour.into(), dt.minute.into(), dt.second.into())
        .map(|naive| naive.and_utc())
}

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// EXIF facts read from one edited photo, ready for insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoExif {
    pub file_path: String,
    pub file_name: String,

    // Camera info
    pub camera: Option<String>,
    pub lens: Option<String>,

    // Exposure settings
    pub aperture: Option<f64>,
    pub shutter_speed: Option<String>,
    pub iso: Option<i64>,
    pub focal_length: Option<f64>,
    pub exposure_program: Option<String>,
    pub exposure_bias: Option<f64>,
    pub flash_mode: Option<String>,

    // Date/time
    pub date_taken: Option<NaiveDateTime>,
}

impl PhotoExif {
    /// A record with only the file identity filled in, for files whose EXIF
    /// block cannot be read.
    pub fn bare(path: &Path) -> Self {
        Self {
            file_path: path.to_string_lossy().to_string(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            ..Default::default()
        }
    }
}

pub fn extract_exif(path: &Path) -> Result<PhotoExif> {
    let mut photo = PhotoExif::bare(path);

    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut bufreader)
        .with_context(|| format!("reading EXIF from {}", path.display()))?;

    // Camera is "Make Model", either part may be missing
    let make = ascii_field(&exif, exif::Tag::Make);
    let model = ascii_field(&exif, exif::Tag::Model);
    photo.camera = match (make, model) {
        (Some(make), Some(model)) => Some(format!("{} {}", make, model)),
        (make, model) => make.or(model),
    };

    photo.lens = ascii_field(&exif, exif::Tag::LensModel);

    if let Some(field) = exif.get_field(exif::Tag::FNumber, exif::In::PRIMARY) {
        if let exif::Value::Rational(ref v) = field.value {
            photo.aperture = v.first().and_then(|r| ratio(r.num as f64, r.denom as f64));
        }
    }

    if let Some(field) = exif.get_field(exif::Tag::FocalLength, exif::In::PRIMARY) {
        if let exif::Value::Rational(ref v) = field.value {
            photo.focal_length = v.first().and_then(|r| ratio(r.num as f64, r.denom as f64));
        }
    }

    if let Some(field) = exif.get_field(exif::Tag::ExposureTime, exif::In::PRIMARY) {
        if let exif::Value::Rational(ref v) = field.value {
            photo.shutter_speed = v.first().and_then(|r| format_exposure_time(r.num, r.denom));
        }
    }

    if let Some(field) = exif.get_field(exif::Tag::PhotographicSensitivity, exif::In::PRIMARY) {
        photo.iso = field.value.get_uint(0).map(i64::from);
    }

    if let Some(field) = exif.get_field(exif::Tag::ExposureBiasValue, exif::In::PRIMARY) {
        if let exif::Value::SRational(ref v) = field.value {
            photo.exposure_bias = v.first().and_then(|r| ratio(r.num as f64, r.denom as f64));
        }
    }

    if let Some(field) = exif.get_field(exif::Tag::ExposureProgram, exif::In::PRIMARY) {
        photo.exposure_program = field.value.get_uint(0).map(exposure_program_name);
    }

    if let Some(field) = exif.get_field(exif::Tag::Flash, exif::In::PRIMARY) {
        photo.flash_mode = field.value.get_uint(0).map(flash_mode_name);
    }

    photo.date_taken = ascii_field(&exif, exif::Tag::DateTimeOriginal)
        .or_else(|| ascii_field(&exif, exif::Tag::DateTimeDigitized))
        .and_then(|s| parse_exif_datetime(&s));

    Ok(photo)
}

fn ascii_field(exif: &exif::Exif, tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    match field.value {
        exif::Value::Ascii(ref parts) => parts
            .first()
            .map(|bytes| {
                String::from_utf8_lossy(bytes)
                    .trim_matches(|c: char| c == '\0' || c.is_whitespace())
                    .to_string()
            })
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn ratio(num: f64, denom: f64) -> Option<f64> {
    if denom == 0.0 {
        None
    } else {
        Some(num / denom)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// `1/125` for fractions of a second, a decimal for one second or longer.
pub fn format_exposure_time(num: u32, denom: u32) -> Option<String> {
    if denom == 0 || num == 0 {
        return None;
    }
    let divisor = gcd(num, denom);
    let (num, denom) = (num / divisor, denom / divisor);
    if num >= denom {
        Some(crate::models::format_decimal(num as f64 / denom as f64))
    } else {
        Some(format!("{}/{}", num, denom))
    }
}

pub fn exposure_program_name(code: u32) -> String {
    match code {
        0 => "Not defined".to_string(),
        1 => "Manual".to_string(),
        2 => "Normal program".to_string(),
        3 => "Aperture priority".to_string(),
        4 => "Shutter priority".to_string(),
        5 => "Creative program".to_string(),
        6 => "Action program".to_string(),
        7 => "Portrait mode".to_string(),
        8 => "Landscape mode".to_string(),
        other => format!("Unknown ({})", other),
    }
}

pub fn flash_mode_name(code: u32) -> String {
    match code {
        0 | 16 => "Flash off, no flash function".to_string(),
        1 => "Flash fired".to_string(),
        5 => "Flash fired, return not detected".to_string(),
        7 => "Flash fired, return detected".to_string(),
        9 => "Flash on, compulsory flash mode".to_string(),
        13 => "Flash on, return not detected".to_string(),
        other => format!("Unknown ({})", other),
    }
}

/// EXIF timestamps look like `2025:04:03 18:15:00`.
pub fn parse_exif_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y:%m:%d %H:%M:%S").ok()
}

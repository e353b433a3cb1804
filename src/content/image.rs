//! Data-URI image decoding
//!
//! Images arrive with their bytes already inlined as `data:` URIs. Decoding
//! returns an explicit outcome instead of failing, so the converter can drop
//! in a placeholder without any error handling of its own.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use std::io::Cursor;

use super::models::{EmbeddedImage, ImageSubtype};

#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Embedded(EmbeddedImage),
    Placeholder { reason: String },
}

struct DataUri<'a> {
    mime: &'a str,
    base64: bool,
    payload: &'a str,
}

fn split_data_uri(src: &str) -> Option<DataUri<'_>> {
    let rest = src.trim().strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or_default().trim();
    let base64 = parts.any(|param| param.trim().eq_ignore_ascii_case("base64"));

    Some(DataUri {
        mime,
        base64,
        payload,
    })
}

pub fn is_data_uri(src: &str) -> bool {
    src.trim_start()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}

/// Subtype declared by a data URI, or `None` if `src` is not one
pub fn data_uri_subtype(src: &str) -> Option<ImageSubtype> {
    split_data_uri(src).map(|uri| ImageSubtype::from_mime(uri.mime))
}

/// Decode a data URI into an image displayed at `width` × `height` pixels
pub fn decode_data_uri(src: &str, width: u32, height: u32) -> ImageOutcome {
    let placeholder = |reason: &str| ImageOutcome::Placeholder {
        reason: reason.to_string(),
    };

    let Some(uri) = split_data_uri(src) else {
        return placeholder("malformed data URI");
    };
    if !uri.base64 {
        return placeholder("data URI is not base64 encoded");
    }

    let subtype = ImageSubtype::from_mime(uri.mime);
    if subtype == ImageSubtype::Svg {
        return placeholder("SVG images cannot be embedded");
    }

    let payload: String = uri
        .payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = match STANDARD
        .decode(&payload)
        .or_else(|_| STANDARD_NO_PAD.decode(&payload))
    {
        Ok(bytes) => bytes,
        Err(err) => return placeholder(&format!("invalid base64 payload: {err}")),
    };

    match reencode_png(&bytes) {
        Ok(data) => ImageOutcome::Embedded(EmbeddedImage {
            subtype,
            data,
            width,
            height,
        }),
        Err(err) => placeholder(&format!("unreadable {} image: {err}", subtype.extension())),
    }
}

/// Validate the bytes and convert them to PNG, the one format every Word build renders
fn reencode_png(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    if matches!(image::guess_format(bytes), Ok(image::ImageFormat::Png)) {
        // Still decode so truncated files are caught here rather than in Word
        image::load_from_memory(bytes)?;
        return Ok(bytes.to_vec());
    }

    let img = image::load_from_memory(bytes)?;
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(buffer)
}

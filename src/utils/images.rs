use std::io::Cursor;

use image::ImageReader;
use tokio::{fs::create_dir_all, io::AsyncWriteExt};

use super::Error;

/// Server icons are capped at 70x70 pixels.
pub const MAX_ICON_DIMENSION: u32 = 70;

/// Checks an uploaded icon against the dimension bound. An absent icon is
/// valid; a present one must decode and fit within 70x70. Only the image
/// header is inspected, the pixel data is never decoded and the reader is
/// dropped on every path.
pub fn validate_icon(bytes: &[u8]) -> Result<(), Error> {
    if bytes.is_empty() {
        return Ok(());
    }
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let (width, height) = reader.into_dimensions()?;
    if width > MAX_ICON_DIMENSION || height > MAX_ICON_DIMENSION {
        return Err(Error::IconTooLarge { width, height });
    }
    Ok(())
}

/// Writes a validated icon to the image store and returns the stored path.
pub async fn save_icon(bytes: &[u8], filename: &str) -> Result<String, Error> {
    if !filename.contains('.') {
        return Err(Error::InvalidFileName(filename.to_string()));
    }
    let file_extension = filename
        .rsplit('.')
        .next()
        .ok_or_else(|| Error::InvalidFileName(filename.to_string()))?;
    let file_name = format!("images/server/{}.{}", uuid::Uuid::new_v4(), file_extension);
    let file_name_path = std::path::Path::new(&file_name);

    // Create the directory if it doesn't exist
    create_dir_all(file_name_path.parent().unwrap()).await?;
    let mut file = tokio::fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(file_name_path)
        .await?;
    file.write_all(bytes).await?;

    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::new(width, height);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn missing_icon_is_valid() {
        assert!(validate_icon(&[]).is_ok());
    }

    #[test]
    fn icon_at_the_bound_is_valid() {
        assert!(validate_icon(&png_bytes(70, 70)).is_ok());
        assert!(validate_icon(&png_bytes(1, 70)).is_ok());
    }

    #[test]
    fn oversized_icon_reports_its_dimensions() {
        let err = validate_icon(&png_bytes(80, 50)).unwrap_err();
        assert!(matches!(
            err,
            Error::IconTooLarge {
                width: 80,
                height: 50
            }
        ));
        assert!(err.to_string().contains("(80, 50)"));
    }

    #[test]
    fn either_dimension_over_the_bound_fails() {
        assert!(validate_icon(&png_bytes(71, 1)).is_err());
        assert!(validate_icon(&png_bytes(1, 71)).is_err());
    }

    #[test]
    fn undecodable_bytes_are_rejected_as_bad_format() {
        let err = validate_icon(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::InvalidImageFormat(_)));
    }
}

use chrono::Utc;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType};
use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;
use tracing::{info, warn};

use crate::services::{metrics::PHOTO_UPLOADS_COUNTER, storage::PhotoStorage};

/// Photos wider than this are scaled down before upload.
pub const MAX_WIDTH: u32 = 1200;
pub const JPEG_QUALITY: u8 = 70;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Decoding, re-encoding or storing failed. Nothing was kept.
    #[error("upload failed: {0:#}")]
    UploadFailed(anyhow::Error),
}

/// Decode, shrink to at most [`MAX_WIDTH`] wide (aspect ratio kept) and
/// re-encode as JPEG.
pub fn compress(bytes: &[u8]) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;

    let img = if img.width() > MAX_WIDTH {
        let height = (f64::from(img.height()) * f64::from(MAX_WIDTH) / f64::from(img.width()))
            .round()
            .max(1.0) as u32;
        img.resize_exact(MAX_WIDTH, height, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(out)
}

/// Fresh object name: "<epoch millis>-<7 random alphanumerics>.jpg".
pub fn object_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}-{}.jpg", Utc::now().timestamp_millis(), suffix)
}

/// Compress a photo and store it; returns the public URL.
pub async fn ingest(storage: &dyn PhotoStorage, bytes: &[u8]) -> Result<String, IngestError> {
    let result = async {
        let jpeg = compress(bytes)?;
        let name = object_name();
        storage.put(&name, jpeg, "image/jpeg").await
    }
    .await;

    match result {
        Ok(url) => {
            PHOTO_UPLOADS_COUNTER.with_label_values(&["ok"]).inc();
            info!("Photo stored at {}", url);
            Ok(url)
        }
        Err(e) => {
            PHOTO_UPLOADS_COUNTER.with_label_values(&["failed"]).inc();
            warn!("Photo upload failed: {:#}", e);
            Err(IngestError::UploadFailed(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use image::{DynamicImage, ImageFormat, RgbaImage};

    use super::*;
    use crate::services::storage::MemoryPhotoStorage;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([200, 120, 40, 128]),
        ));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn wide_photo_is_scaled_to_max_width() {
        let out = compress(&png(2400, 600)).unwrap();
        let decoded = image::load_from_memory_with_format(&out, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1200, 300));
    }

    #[test]
    fn narrow_photo_keeps_its_size() {
        let out = compress(&png(640, 480)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (640, 480));
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(compress(b"definitely not an image").is_err());
    }

    #[test]
    fn object_names_are_unique_jpgs() {
        let a = object_name();
        let b = object_name();
        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
        let (millis, rest) = a.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest.len(), "abcdefg.jpg".len());
    }

    #[tokio::test]
    async fn ingest_stores_jpeg_and_returns_url() {
        let storage = MemoryPhotoStorage::default();
        let url = ingest(&storage, &png(10, 10)).await.unwrap();

        let objects = storage.objects.lock().await;
        assert_eq!(objects.len(), 1);
        let (name, _, content_type) = &objects[0];
        assert_eq!(url, format!("https://photos.test/{name}"));
        assert_eq!(content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn decode_error_stores_nothing() {
        let storage = MemoryPhotoStorage::default();
        let err = ingest(&storage, b"nope").await.unwrap_err();
        assert!(err.to_string().starts_with("upload failed"));
        assert!(storage.objects.lock().await.is_empty());
    }

    #[tokio::test]
    async fn storage_error_is_upload_failed() {
        let storage = MemoryPhotoStorage::default();
        storage.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            ingest(&storage, &png(10, 10)).await,
            Err(IngestError::UploadFailed(_))
        ));
    }
}

//! Media ingestion: fan one upload into fixed-resolution variants.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use metrics::counter;
use tracing::info;
use uuid::Uuid;

use crate::config::MediaSettings;
use crate::domain::{ImageRecord, Visibility};
use crate::infra::{BackendError, ObjectStore};

use super::{DataService, ServiceError};

/// Labeled maximum widths, ascending. Aspect ratio is preserved and images
/// are never upscaled past their decoded width.
const VARIANTS: [(&str, u32); 3] = [("low", 480), ("medium", 1080), ("high", 1920)];

/// The variant whose URL becomes the image's canonical `image_url`.
pub const CANONICAL_VARIANT: &str = "high";

/// Metadata accompanying an upload.
#[derive(Debug, Clone)]
pub struct ImageDraft {
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub photographer: String,
}

/// A committed image plus its variant URLs.
#[derive(Debug, Clone)]
pub struct PublishedImage {
    pub record: ImageRecord,
    pub variant_urls: BTreeMap<String, String>,
}

/// Decodes an upload once, renders and uploads the resolution variants, and
/// commits the metadata through the data-access service only after every
/// upload has succeeded.
#[derive(Clone)]
pub struct MediaPipeline {
    objects: Arc<dyn ObjectStore>,
    data: DataService,
    media: MediaSettings,
}

impl MediaPipeline {
    pub fn new(objects: Arc<dyn ObjectStore>, data: DataService, media: MediaSettings) -> Self {
        Self {
            objects,
            data,
            media,
        }
    }

    /// Publish one uploaded image.
    ///
    /// Any variant upload failure aborts the whole operation before metadata
    /// is written. Variants uploaded by the failed attempt stay behind as
    /// orphans; reclaiming them is out-of-band.
    pub async fn publish(
        &self,
        bytes: Bytes,
        draft: ImageDraft,
    ) -> Result<PublishedImage, ServiceError> {
        let quality = self.media.jpeg_quality;
        let rendered = tokio::task::spawn_blocking(move || render_variants(&bytes, quality))
            .await
            .map_err(|err| {
                BackendError::unavailable(format!("variant rendering task failed: {err}"))
            })??;

        let folder = format!("users/{}/images/{}", draft.owner_id, Uuid::new_v4());
        let mut urls = BTreeMap::new();
        for variant in &rendered.variants {
            let key = format!("{folder}/{}_{}", variant.label, draft.title);
            let url = self
                .objects
                .put_object(&key, variant.bytes.clone(), "image/jpeg")
                .await?;
            counter!("lumina_media_variants_uploaded_total").increment(1);
            urls.insert(variant.label.to_string(), url);
        }

        let mut record = ImageRecord::new(
            draft.owner_id,
            draft.title,
            draft.description,
            draft.tags,
            draft.visibility,
            draft.photographer,
        );
        record.image_url = urls
            .get(CANONICAL_VARIANT)
            .cloned()
            .unwrap_or_default();
        record.aspect_ratio = format!(
            "{:.4}",
            f64::from(rendered.width) / f64::from(rendered.height)
        );
        record.quality_urls = urls.clone();

        self.data.save_image_with_tags(&record).await?;
        info!(
            image_id = %record.id,
            width = rendered.width,
            height = rendered.height,
            "image published"
        );
        Ok(PublishedImage {
            record,
            variant_urls: urls,
        })
    }
}

#[derive(Debug)]
struct RenderedVariant {
    label: &'static str,
    bytes: Bytes,
}

#[derive(Debug)]
struct RenderedSet {
    width: u32,
    height: u32,
    variants: Vec<RenderedVariant>,
}

/// Decode the source once and produce every JPEG variant.
fn render_variants(bytes: &[u8], jpeg_quality: u8) -> Result<RenderedSet, ServiceError> {
    let source = image::load_from_memory(bytes)
        .map_err(|err| ServiceError::decode(format!("unreadable upload: {err}")))?;
    let width = source.width();
    let height = source.height().max(1);

    let mut variants = Vec::with_capacity(VARIANTS.len());
    for (label, max_width) in VARIANTS {
        let scaled = if width > max_width {
            let target_height =
                ((u64::from(max_width) * u64::from(height)) / u64::from(width)).max(1) as u32;
            source.resize_exact(max_width, target_height, FilterType::Lanczos3)
        } else {
            source.clone()
        };

        // JPEG carries no alpha channel.
        let rgb = scaled.to_rgb8();
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ServiceError::encode(format!("jpeg encoding failed: {err}")))?;
        variants.push(RenderedVariant {
            label,
            bytes: Bytes::from(buf),
        });
    }

    Ok(RenderedSet {
        width,
        height,
        variants,
    })
}

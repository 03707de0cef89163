//! Sample documents for loading the dataset into a curation tool.
//!
//! Each filtered record becomes one sample: image file path, image metadata
//! (size on disk, sniffed MIME type, dimensions), an embedded caption document
//! and the per-image score fields.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use imagesize::{Compression, ImageType};

use crate::records::Record;

pub const DATASET_NAME: &str = "COYO-Tiny";
pub const DATASET_TAGS: [&str; 3] = ["image", "image-text", "captions"];

/// Score fields copied from the record, with their descriptions.
pub const SCORE_FIELDS: [(&str, &str); 6] = [
    (
        "clip_similarity_vitb32",
        "The cosine similarity between text and image(ViT-B/32) embeddings by OpenAI CLIP",
    ),
    (
        "clip_similarity_vitl14",
        "The cosine similarity between text and image(ViT-L/14) embeddings by OpenAI CLIP",
    ),
    ("nsfw_score_gantman", "The NSFW score of the image by GantMan/NSFW"),
    ("nsfw_score_opennsfw2", "The NSFW score of the image by OpenNSFW2"),
    ("aesthetic_score_laion_v2", "The aesthetic score of the image by Laion V2"),
    ("num_faces", "The number of faces in the image detected by SCRFD"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMetadata {
    pub size_bytes: u64,
    pub mime_type: String,
    pub width: Option<Value>,
    pub height: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caption {
    pub caption: Option<Value>,
    pub text_length: Option<Value>,
    pub word_count: Option<Value>,
    pub token_count_gpt: Option<Value>,
    pub token_count_bert: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub id: i64,
    pub filepath: String,
    pub metadata: ImageMetadata,
    pub caption: Caption,
    /// One entry per [`SCORE_FIELDS`] name, `null` when the record lacks it.
    #[serde(flatten)]
    pub scores: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleExport {
    pub name: &'static str,
    pub tags: Vec<&'static str>,
    pub fields: Vec<FieldSchema>,
    pub samples: Vec<Sample>,
}

/// Bytes read from the start of a file for format detection.
const HEADER_LEN: usize = 64;

/// MIME type from the leading bytes of an image file; `None` if unrecognized.
pub fn sniff_mime(header: &[u8]) -> Option<&'static str> {
    let mime = match imagesize::image_type(header).ok()? {
        ImageType::Jpeg => "image/jpeg",
        ImageType::Png => "image/png",
        ImageType::Gif => "image/gif",
        ImageType::Webp => "image/webp",
        ImageType::Bmp => "image/bmp",
        ImageType::Tiff => "image/tiff",
        ImageType::Ico => "image/x-icon",
        ImageType::Psd => "image/vnd.adobe.photoshop",
        ImageType::Jxl => "image/jxl",
        ImageType::Heif(Compression::Av1) => "image/avif",
        ImageType::Heif(_) => "image/heif",
        _ => return None,
    };
    Some(mime)
}

fn file_mime(path: &Path) -> String {
    let mut header = Vec::with_capacity(HEADER_LEN);
    let read = File::open(path).and_then(|f| f.take(HEADER_LEN as u64).read_to_end(&mut header));
    if read.is_err() {
        return String::new();
    }
    sniff_mime(&header).unwrap_or("").to_string()
}

/// Record value for `name`, or the dimension read from the image header when
/// the record has none.
fn dimension(record: &Record, name: &str, size: Option<&imagesize::ImageSize>) -> Option<Value> {
    field(record, name).or_else(|| {
        let size = size?;
        let px = if name == "width" { size.width } else { size.height };
        Some(Value::from(px as u64))
    })
}

fn field(record: &Record, name: &str) -> Option<Value> {
    record.field(name).cloned()
}

/// Builds a sample for a record with an `image_path`; `None` otherwise.
pub fn sample_from_record(record: &Record) -> Option<Sample> {
    let filepath = record.image_path.clone()?;
    let path = Path::new(&filepath);
    let size_bytes = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let dims = if record.field("width").is_none() || record.field("height").is_none() {
        imagesize::size(path).ok()
    } else {
        None
    };

    let metadata = ImageMetadata {
        size_bytes,
        mime_type: file_mime(path),
        width: dimension(record, "width", dims.as_ref()),
        height: dimension(record, "height", dims.as_ref()),
    };
    let caption = Caption {
        caption: field(record, "text"),
        text_length: field(record, "text_length"),
        word_count: field(record, "word_count"),
        token_count_gpt: field(record, "num_tokens_gpt"),
        token_count_bert: field(record, "num_tokens_bert"),
    };
    let scores = SCORE_FIELDS
        .iter()
        .map(|(name, _)| (name.to_string(), field(record, name).unwrap_or(Value::Null)))
        .collect();

    Some(Sample {
        id: record.id,
        filepath,
        metadata,
        caption,
        scores,
    })
}

pub fn build_export(records: &[Record]) -> SampleExport {
    let mut samples = Vec::with_capacity(records.len());
    for record in records {
        match sample_from_record(record) {
            Some(sample) => samples.push(sample),
            None => tracing::warn!(id = record.id, "record has no image_path; not exported"),
        }
    }
    SampleExport {
        name: DATASET_NAME,
        tags: DATASET_TAGS.to_vec(),
        fields: SCORE_FIELDS
            .iter()
            .map(|&(name, description)| FieldSchema { name, description })
            .collect(),
        samples,
    }
}

/// Writes the export as pretty JSON to `out`, creating parent directories.
pub fn write_export(out: &Path, export: &SampleExport) -> Result<()> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(out).with_context(|| format!("create {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, export)?;
    writer.flush()?;
    tracing::info!(
        samples = export.samples.len(),
        path = %out.display(),
        "sample export written"
    );
    Ok(())
}

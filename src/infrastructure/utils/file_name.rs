use std::path::Path;

use crate::entities::{image::ImageRecord, transformation::TransformationDescriptor};

const FALLBACK_SLUG: &str = "image";
const MIN_INDEX_DIGITS: usize = 3;

/// Lowercase slug of a display name with its extension stripped.
/// Runs of non-alphanumeric characters collapse into a single `-`.
pub fn name_slug(original_name: &str) -> String {
    let stem = Path::new(original_name.trim())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original_name);

    let slug = slug::slugify(stem);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Output size for a record: descriptor target size first, then the
/// record's natural size.
pub fn output_size(record: &ImageRecord, descriptor: &TransformationDescriptor) -> Option<(u32, u32)> {
    descriptor.target_size().or_else(|| record.natural_size())
}

/// `{slug}-{w}x{h}.{ext}`, or `{slug}.{ext}` when the size is unknown.
pub fn rendition_file_name(record: &ImageRecord, descriptor: &TransformationDescriptor) -> String {
    let slug = name_slug(&record.original_name);
    let ext = descriptor.output_format.extension();

    match output_size(record, descriptor) {
        Some((w, h)) => format!("{slug}-{w}x{h}.{ext}"),
        None => format!("{slug}.{ext}"),
    }
}

/// Digits used for archive sequence numbers given the entry count.
pub fn index_width(total: usize) -> usize {
    total.to_string().len().max(MIN_INDEX_DIGITS)
}

/// Archive entry name prefixed with a zero-padded, 1-based sequence number,
/// which keeps names unique when slugs collide.
pub fn archive_entry_name(
    index: usize,
    width: usize,
    record: &ImageRecord,
    descriptor: &TransformationDescriptor,
) -> String {
    format!("{index:0width$}-{}", rendition_file_name(record, descriptor))
}

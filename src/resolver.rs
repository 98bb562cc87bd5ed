//! Destination filename resolution for image URLs

use crate::utils::is_safe_component;

/// Resolve the on-disk filename for an image URL
///
/// Takes the last path segment of the URL, ignoring query string and
/// fragment. Percent-encoded segments are decoded when the decoded name is a
/// safe single path component; otherwise the raw segment is used. If the
/// segment is empty (e.g. a trailing slash), `image_<sequence_index>.jpg` is
/// synthesized. Never fails and never returns an empty string.
///
/// # Examples
///
/// ```
/// use csv_image_dl::resolver::resolve_filename;
///
/// assert_eq!(resolve_filename("http://x/img/a.jpg?w=200#top", 1), "a.jpg");
/// assert_eq!(resolve_filename("http://x/dir/", 1), "image_1.jpg");
/// assert_eq!(resolve_filename("http://x/my%20photo.png", 3), "my photo.png");
/// ```
#[must_use]
pub fn resolve_filename(url: &str, sequence_index: usize) -> String {
    let segment = last_path_segment(url);

    if let Some(name) = decoded_name(&segment) {
        return name;
    }
    if is_safe_component(&segment) {
        return segment;
    }

    fallback_filename(sequence_index)
}

/// Filename used when a URL has no usable last segment
#[must_use]
pub fn fallback_filename(sequence_index: usize) -> String {
    format!("image_{}.jpg", sequence_index)
}

fn last_path_segment(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url)
        && let Some(mut segments) = parsed.path_segments()
    {
        return segments.next_back().unwrap_or_default().to_string();
    }

    // Not an absolute hierarchical URL: strip query/fragment by hand
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default().to_string()
}

fn decoded_name(segment: &str) -> Option<String> {
    let decoded = urlencoding::decode(segment).ok()?;
    is_safe_component(&decoded).then(|| decoded.into_owned())
}

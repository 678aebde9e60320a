//! Media URLs served by the extraction backend.

/// URL of a file stored for `batch_id`, optionally below `sub_path`.
/// Dataset batches are served from the dataset media tree.
pub fn batch_media_url(
    backend_url: &str,
    batch_id: &str,
    sub_path: Option<&str>,
    file_name: &str,
    is_dataset_batch: bool,
) -> String {
    let base = backend_url.trim_end_matches('/');
    let mut url = if is_dataset_batch {
        format!("{}/dataset-batch-media/batches", base)
    } else {
        format!("{}/batch-media", base)
    };
    if let Some(sub_path) = sub_path.filter(|s| !s.is_empty()) {
        url.push('/');
        url.push_str(sub_path);
    }
    url.push_str(&format!("/{}/{}", batch_id, file_name));
    url
}

pub fn classification_media_url(backend_url: &str, file_path: &str) -> String {
    format!("{}/batch-media/{}", backend_url.trim_end_matches('/'), file_path)
}

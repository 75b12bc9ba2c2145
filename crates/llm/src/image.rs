use aws_sdk_bedrockruntime::types::ImageFormat;
use log::{error, info};
use plugin_core::NodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    /// Picks the format from the response content type, falling back to the URL
    /// extension and finally to JPEG.
    pub fn detect(content_type: &str, url: &str) -> Self {
        let content_type = content_type.to_ascii_lowercase();
        let url = url.to_ascii_lowercase();
        if content_type.contains("png") || url.contains(".png") {
            ImageKind::Png
        } else if content_type.contains("webp") || url.contains(".webp") {
            ImageKind::Webp
        } else if content_type.contains("gif") || url.contains(".gif") {
            ImageKind::Gif
        } else {
            ImageKind::Jpeg
        }
    }

    pub fn to_sdk(self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Webp => ImageFormat::Webp,
            ImageKind::Gif => ImageFormat::Gif,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

pub async fn fetch_image(http: &reqwest::Client, url: &str) -> Result<FetchedImage, NodeError> {
    info!("Including image URL in message: {}", url);

    let response = http.get(url).send().await.map_err(|e| {
        error!("Failed to fetch image from {}: {}", url, e);
        NodeError::ImageFetch(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        error!("Image fetch for {} returned {}", url, status);
        return Err(NodeError::ImageFetch(format!(
            "Failed to fetch image: {}",
            status
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| NodeError::ImageFetch(e.to_string()))?
        .to_vec();

    let kind = ImageKind::detect(&content_type, url);
    info!(
        "Image fetched: {} bytes, content type '{}', detected {:?}",
        bytes.len(),
        content_type,
        kind
    );

    Ok(FetchedImage { kind, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_detect_format_from_content_type() {
        assert_eq!(ImageKind::detect("image/png", "https://x/y"), ImageKind::Png);
        assert_eq!(ImageKind::detect("image/webp", "https://x/y"), ImageKind::Webp);
        assert_eq!(ImageKind::detect("image/gif", "https://x/y"), ImageKind::Gif);
    }

    #[test]
    fn should_fall_back_to_url_extension() {
        assert_eq!(
            ImageKind::detect("application/octet-stream", "https://cdn/x/photo.PNG"),
            ImageKind::Png
        );
        assert_eq!(ImageKind::detect("", "https://cdn/anim.gif?v=2"), ImageKind::Gif);
    }

    #[test]
    fn should_default_to_jpeg() {
        assert_eq!(ImageKind::detect("", "https://cdn/photo"), ImageKind::Jpeg);
        assert_eq!(
            ImageKind::detect("image/jpeg", "https://cdn/photo.jpg"),
            ImageKind::Jpeg
        );
    }

    #[test]
    fn should_map_to_sdk_format() {
        assert_eq!(ImageKind::Webp.to_sdk(), ImageFormat::Webp);
        assert_eq!(ImageKind::Jpeg.to_sdk(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn should_report_unreachable_image_url() {
        let http = reqwest::Client::new();
        let result = fetch_image(&http, "http://127.0.0.1:1/missing.png").await;
        assert!(matches!(result, Err(NodeError::ImageFetch(_))));
    }
}

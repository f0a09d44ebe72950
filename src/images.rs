//! Image store collaborator used to enrich messages with alert screenshots.
//!
//! Image lookups are best-effort. A failing store never blocks or aborts a
//! notification.

use async_trait::async_trait;

use crate::alert::AlertBatch;
use crate::error::ImageError;

/// Annotation carrying the token of the image stored for an alert.
pub const IMAGE_TOKEN_ANNOTATION: &str = "__alertImageToken__";

/// An image stored for an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub token: String,
    /// Public URL of the image, empty when the image was only stored on disk.
    pub url: String,
}

/// Looks up stored images by token.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn get_image(&self, token: &str) -> Result<Image, ImageError>;
}

/// Store for deployments without image rendering. Every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageStore;

#[async_trait]
impl ImageStore for NoImageStore {
    async fn get_image(&self, token: &str) -> Result<Image, ImageError> {
        Err(ImageError::NotFound(token.to_string()))
    }
}

/// Call `f` with the index of each alert in `batch` that has a stored image,
/// together with that image.
///
/// Alerts without an image token are skipped. Lookup errors are logged at
/// debug level and skipped too.
pub async fn with_stored_images<F>(store: &dyn ImageStore, batch: &AlertBatch, mut f: F)
where
    F: FnMut(usize, &Image),
{
    for (index, alert) in batch.iter().enumerate() {
        let Some(token) = alert.annotations.get(IMAGE_TOKEN_ANNOTATION) else {
            continue;
        };
        if token.is_empty() {
            continue;
        }
        match store.get_image(token).await {
            Ok(image) => f(index, &image),
            Err(e) => {
                tracing::debug!(alert_index = index, error = %e, "Skipping unavailable image");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alert;
    use std::collections::HashMap;

    struct MapImageStore(HashMap<String, Image>);

    #[async_trait]
    impl ImageStore for MapImageStore {
        async fn get_image(&self, token: &str) -> Result<Image, ImageError> {
            if token == "broken" {
                return Err(ImageError::Unavailable("disk error".to_string()));
            }
            self.0
                .get(token)
                .cloned()
                .ok_or_else(|| ImageError::NotFound(token.to_string()))
        }
    }

    fn image(token: &str, url: &str) -> Image {
        Image {
            token: token.to_string(),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn visits_only_alerts_with_available_images() {
        let store = MapImageStore(HashMap::from([
            ("t1".to_string(), image("t1", "https://img.test/1.png")),
            ("t3".to_string(), image("t3", "https://img.test/3.png")),
        ]));
        let batch = AlertBatch::new(vec![
            Alert::firing().with_annotation(IMAGE_TOKEN_ANNOTATION, "t1"),
            Alert::firing(),
            Alert::firing().with_annotation(IMAGE_TOKEN_ANNOTATION, "broken"),
            Alert::firing().with_annotation(IMAGE_TOKEN_ANNOTATION, "missing"),
            Alert::firing().with_annotation(IMAGE_TOKEN_ANNOTATION, "t3"),
        ]);

        let mut seen = Vec::new();
        with_stored_images(&store, &batch, |index, image| {
            seen.push((index, image.url.clone()));
        })
        .await;

        assert_eq!(
            seen,
            vec![
                (0, "https://img.test/1.png".to_string()),
                (4, "https://img.test/3.png".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn no_image_store_never_calls_back() {
        let batch = AlertBatch::new(vec![
            Alert::firing().with_annotation(IMAGE_TOKEN_ANNOTATION, "t1"),
        ]);
        let mut calls = 0;
        with_stored_images(&NoImageStore, &batch, |_, _| calls += 1).await;
        assert_eq!(calls, 0);
    }
}

use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Seam for turning an uploaded file into plain text. PDF or OCR pipelines
/// plug in here; the default build ships plain text only.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ApiError>;
}

pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain_text"
    }

    async fn extract(&self, _filename: &str, bytes: &[u8]) -> Result<String, ApiError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn utf8_bytes_pass_through() {
        let extractor = PlainTextExtractor;
        let text = extractor
            .extract("notes.txt", "warranty covers two years".as_bytes())
            .await
            .unwrap();
        assert_eq!(text, "warranty covers two years");
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_rejected() {
        let extractor = PlainTextExtractor;
        let text = extractor
            .extract("notes.txt", &[0x68, 0x69, 0xFF, 0x21])
            .await
            .unwrap();
        assert!(text.starts_with("hi"));
        assert!(text.ends_with('!'));
    }
}

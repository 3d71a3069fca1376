//! Byte acquisition for binary leaves.
//!
//! The encoder never reads payloads itself. It hands each [`Payload`] to a
//! [`ByteSource`] and awaits the bytes, so sources backed by files, object
//! stores or network fetches plug in without the codec knowing about them.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::model::Payload;

/// Turns a binary leaf's payload into raw bytes.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use jsonsca::codec::ByteSource;
/// use jsonsca::error::SourceError;
/// use jsonsca::model::Payload;
///
/// struct Static;
///
/// #[async_trait]
/// impl ByteSource for Static {
///     async fn read_bytes(&self, payload: &Payload) -> Result<Vec<u8>, SourceError> {
///         match payload {
///             Payload::Inline(bytes) => Ok(bytes.clone()),
///             Payload::External(locator) => Ok(locator.as_bytes().to_vec()),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Reads the bytes behind `payload`.
    async fn read_bytes(&self, payload: &Payload) -> Result<Vec<u8>, SourceError>;
}

/// Source for payloads already held in memory.
///
/// External locators fail: resolving them needs a source that knows where
/// they point.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineSource;

#[async_trait]
impl ByteSource for InlineSource {
    async fn read_bytes(&self, payload: &Payload) -> Result<Vec<u8>, SourceError> {
        match payload {
            Payload::Inline(bytes) => Ok(bytes.clone()),
            Payload::External(locator) => Err(SourceError::new(format!(
                "no source for external payload {:?}",
                locator
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inline_source() {
        let bytes = InlineSource.read_bytes(&Payload::Inline(vec![1, 2, 3])).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_inline_source_rejects_external() {
        let err = InlineSource
            .read_bytes(&Payload::External("s3://bucket/key".to_string()))
            .await
            .unwrap_err();
        assert!(err.message.contains("s3://bucket/key"));
    }
}

use plume_crypto::verify_author;
use plume_store::{CONTENT_MAX_CHARS, TOPIC_MAX_CHARS};

use crate::error::ErrorCode;
use crate::instruction::CreatePost;

/// Check topic and content against the field rules.
///
/// Order is fixed and the first violation wins: topic length, content
/// length, blank topic, blank content.
pub fn validate_fields(topic: &str, content: &str) -> Result<(), ErrorCode> {
    if topic.chars().count() > TOPIC_MAX_CHARS {
        return Err(ErrorCode::TopicTooLong);
    }
    if content.chars().count() > CONTENT_MAX_CHARS {
        return Err(ErrorCode::ContentTooLong);
    }
    if topic.trim().is_empty() {
        return Err(ErrorCode::TopicEmpty);
    }
    if content.trim().is_empty() {
        return Err(ErrorCode::ContentEmpty);
    }
    Ok(())
}

/// Check that `ix.author` actually signed `ix`.
pub fn verify_signer(ix: &CreatePost) -> Result<(), ErrorCode> {
    verify_author(&ix.author, &ix.signing_message(), &ix.signature)
        .map_err(|_| ErrorCode::Unauthorized)
}

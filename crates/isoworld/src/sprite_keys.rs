use thiserror::Error;

/// Sheet keys address files under `assets/sheets/`, so they are held to a
/// conservative relative-path shape: lowercase ascii segments joined by `/`,
/// with `-` and `_` allowed inside a segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must not start or end with '/'")]
    EdgeSlash,
    #[error("sprite key must not contain '\\\\'")]
    Backslash,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key must not contain an empty path segment")]
    EmptySegment,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

pub(crate) fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(SpriteKeyError::EdgeSlash);
    }
    if key.contains('\\') {
        return Err(SpriteKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }

    for segment in key.split('/') {
        if segment.is_empty() {
            return Err(SpriteKeyError::EmptySegment);
        }
        let invalid = segment
            .chars()
            .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-')));
        if let Some(character) = invalid {
            return Err(SpriteKeyError::InvalidCharacter { character });
        }
    }

    Ok(())
}

//! Frame decoding for incoming websocket messages.

// ============================================================================
// Imports
// ============================================================================

use tokio_tungstenite::tungstenite::Message;

use crate::error::{Error, Result};

// ============================================================================
// Decoding
// ============================================================================

/// Decodes one websocket frame into observer text.
///
/// Returns `Ok(None)` for a close frame and an empty string for control
/// frames. Payloads are cut to `max_chars` characters.
///
/// # Errors
///
/// Returns [`Error::Decode`] if a binary frame is not valid UTF-8.
pub fn decode_message(message: Message, max_chars: usize) -> Result<Option<String>> {
    let text = match message {
        Message::Text(text) => text.to_string(),
        Message::Binary(data) => std::str::from_utf8(&data)
            .map_err(|e| Error::decode(format!("binary frame is not valid UTF-8: {e}")))?
            .to_string(),
        Message::Close(_) => return Ok(None),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => String::new(),
    };

    Ok(Some(truncate_chars(text, max_chars)))
}

/// Cuts `text` to at most `max_chars` characters.
fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(index);
    }
    text
}

// ============================================================================
// Tests
// ============================================================================

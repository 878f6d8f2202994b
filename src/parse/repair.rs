use serde::de::DeserializeOwned;

use crate::error::{CrawlError, CrawlResult};

/// Turn a run of concatenated JSON objects (`{..}{..}`) into a JSON array.
///
/// A comma is inserted after every top-level closing brace that is followed by
/// more non-whitespace input. Braces inside string literals are not counted.
pub fn repair(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / 16 + 2);
    out.push(b'[');

    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in input.iter().enumerate() {
        out.push(b);

        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 && input[i + 1..].iter().any(|c| !c.is_ascii_whitespace()) {
                    out.push(b',');
                }
            }
            _ => {}
        }
    }

    out.push(b']');
    out
}

/// Decode an upstream payload that is either a proper JSON array or a run of
/// concatenated objects.
pub fn decode_objects<T: DeserializeOwned>(body: &[u8]) -> CrawlResult<Vec<T>> {
    let start = body.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(body.len());
    let trimmed = &body[start..];
    let parsed = if trimmed.first() == Some(&b'[') {
        serde_json::from_slice(trimmed)
    } else {
        serde_json::from_slice(&repair(trimmed))
    };
    parsed.map_err(|e| CrawlError::Repair(format!("upstream payload is not valid JSON: {}", e)))
}

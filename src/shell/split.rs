//! Command line splitting

use crate::error::ApiError;

/// Split `line` into words at whitespace, keeping double-quoted runs
/// together. The quotes themselves are dropped; `""` yields an empty word.
pub fn split_line(line: &str) -> Result<Vec<String>, ApiError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;

    for c in line.chars() {
        if c == '"' {
            quoted = !quoted;
            started = true;
        } else if !quoted && c.is_whitespace() {
            if started {
                words.push(std::mem::take(&mut current));
                started = false;
            }
        } else {
            current.push(c);
            started = true;
        }
    }

    if quoted {
        return Err(ApiError::Usage("unterminated quote".to_string()));
    }
    if started {
        words.push(current);
    }
    Ok(words)
}

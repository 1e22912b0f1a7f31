/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Left-pad an all-digit code with zeros up to `width`.
///
/// Anything that is not purely ASCII digits (including the empty string) is
/// returned unchanged, as is a code that is already `width` or longer.
pub fn zero_pad(code: &str, width: usize) -> String {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return code.to_string();
    }
    format!("{:0>width$}", code, width = width)
}

/// Decode a raw field as UTF-8, falling back to Latin-1 for older Census files.
pub fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

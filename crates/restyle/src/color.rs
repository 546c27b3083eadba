//! Computed color normalization.

/// Normalize a computed color value.
///
/// Transparent sentinels become `None`. Opaque `rgb()`/`rgba()` values are
/// rewritten as lowercase `#rrggbb`; anything else is kept as given.
pub fn normalize_color(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || is_transparent(value) {
        return None;
    }
    Some(rgb_to_hex(value).unwrap_or_else(|| value.to_string()))
}

pub(crate) fn is_transparent(value: &str) -> bool {
    if value.eq_ignore_ascii_case("transparent") {
        return true;
    }
    matches!(parse_rgb(value), Some((_, _, _, alpha)) if alpha == 0.0)
}

fn rgb_to_hex(value: &str) -> Option<String> {
    let (r, g, b, alpha) = parse_rgb(value)?;
    if alpha < 1.0 {
        return None;
    }
    Some(format!("#{r:02x}{g:02x}{b:02x}"))
}

/// Parse `rgb(r, g, b)` or `rgba(r, g, b, a)` with integer channels.
fn parse_rgb(value: &str) -> Option<(u8, u8, u8, f32)> {
    let lower = value.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let channel = |s: &str| s.parse::<u8>().ok();
    match parts.as_slice() {
        [r, g, b] => Some((channel(r)?, channel(g)?, channel(b)?, 1.0)),
        [r, g, b, a] => Some((channel(r)?, channel(g)?, channel(b)?, a.parse().ok()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_hex() {
        assert_eq!(normalize_color("rgb(255, 0, 0)").as_deref(), Some("#ff0000"));
        assert_eq!(
            normalize_color("rgba(3, 105, 161, 1)").as_deref(),
            Some("#0369a1")
        );
    }

    #[test]
    fn test_transparent_is_absent() {
        assert_eq!(normalize_color("rgba(0, 0, 0, 0)"), None);
        assert_eq!(normalize_color("transparent"), None);
        assert_eq!(normalize_color(""), None);
    }

    #[test]
    fn test_translucent_and_named_kept() {
        assert_eq!(
            normalize_color("rgba(59, 130, 246, 0.1)").as_deref(),
            Some("rgba(59, 130, 246, 0.1)")
        );
        assert_eq!(normalize_color("red").as_deref(), Some("red"));
    }
}

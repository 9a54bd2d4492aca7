//! Filename conventions for ID-tagged icon assets.
//!
//! Asset filenames carry a hexadecimal identifier suffix:
//! `<group>_<name>_0x<HEX>.<ext>`, where HEX is 1-4 hex digits. The
//! normalized form renders the identifier as four uppercase digits
//! (`0x08C0`), separated from the name by a single underscore.

use crate::error::{PressError, Result};

/// A parsed hexadecimal identifier suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HexSuffix {
    value: u32,
    /// Digit count as written, used to re-render at the same width.
    digits: usize,
}

/// The semantic segments of a normalized asset stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedName<'a> {
    /// Category prefix, e.g. `spellbook`.
    pub group: &'a str,
    /// Human-readable identifier segment, e.g. `fire_bolt`.
    pub canonical: &'a str,
    /// Numeric identifier decoded from the hex suffix.
    pub id: u32,
}

/// Split a filename into stem and extension at the last dot.
///
/// A leading dot is part of the stem, so dotfiles have no extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}

/// Find the identifier suffix in a stem: the last `0x`/`0X` marker
/// followed by 1-4 hex digits running to the end of the stem.
///
/// Returns the head (trailing underscores stripped) and the suffix.
/// Anything malformed after the marker means there is no suffix.
fn split_suffix(stem: &str) -> Option<(&str, HexSuffix)> {
    let bytes = stem.as_bytes();
    let mut marker = None;
    for i in 0..bytes.len().saturating_sub(1) {
        if bytes[i] == b'0' && (bytes[i + 1] == b'x' || bytes[i + 1] == b'X') {
            marker = Some(i);
        }
    }
    let marker = marker?;
    let digits = &stem[marker + 2..];
    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    let head = stem[..marker].trim_end_matches('_');
    Some((
        head,
        HexSuffix {
            value,
            digits: digits.len(),
        },
    ))
}

/// First run of consecutive decimal digits in a stem.
fn first_decimal_run(stem: &str) -> Option<&str> {
    let start = stem.find(|c: char| c.is_ascii_digit())?;
    let rest = &stem[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Render an identifier in the normalized suffix form.
fn render_id(value: u32) -> String {
    format!("0x{value:04X}")
}

/// Normalize a filename's identifier suffix.
///
/// - An existing suffix is re-rendered as four uppercase hex digits.
/// - A stem without a suffix gets one appended, derived from the first
///   decimal run in the stem (interpreted as a decimal number).
/// - A stem with neither yields no change.
///
/// Returns `Some(new_name)` only when the result differs from the
/// input, so applying this twice is always a no-op the second time.
pub fn normalize(filename: &str) -> Option<String> {
    let (stem, ext) = split_extension(filename);
    let new_stem = if let Some((head, suffix)) = split_suffix(stem) {
        let rendered = render_id(suffix.value);
        if head.is_empty() {
            rendered
        } else {
            format!("{head}_{rendered}")
        }
    } else {
        let run = first_decimal_run(stem)?;
        let value: u32 = run.parse().ok()?;
        format!("{stem}_{}", render_id(value))
    };
    if new_stem == stem {
        return None;
    }
    Some(match ext {
        Some(ext) => format!("{new_stem}.{ext}"),
        None => new_stem,
    })
}

/// Apply a fixed offset to a filename's identifier.
///
/// The shifted identifier is re-rendered at the same digit width as the
/// input (widening when the value no longer fits). `Ok(None)` means the
/// filename carries no identifier to shift.
pub fn shift_filename(filename: &str, delta: i64) -> Result<Option<String>> {
    let (stem, ext) = split_extension(filename);
    let Some((head, suffix)) = split_suffix(stem) else {
        return Ok(None);
    };
    let shifted = i64::from(suffix.value) + delta;
    let shifted = u32::try_from(shifted).map_err(|_| PressError::Naming {
        message: format!(
            "offset {delta:+#x} takes 0x{:X} out of range in '{filename}'",
            suffix.value
        ),
        help: None,
    })?;
    let rendered = format!("0x{shifted:0width$X}", width = suffix.digits);
    let new_stem = if head.is_empty() {
        rendered
    } else {
        format!("{head}_{rendered}")
    };
    Ok(Some(match ext {
        Some(ext) => format!("{new_stem}.{ext}"),
        None => new_stem,
    }))
}

/// Parse a stem into group, canonical name, and identifier.
///
/// Requires a valid suffix and at least one underscore splitting a
/// non-empty group from a non-empty canonical name. The canonical name
/// keeps any internal underscores.
pub fn parse_stem(stem: &str) -> Option<ParsedName<'_>> {
    let (head, suffix) = split_suffix(stem)?;
    let (group, canonical) = head.split_once('_')?;
    if group.is_empty() || canonical.is_empty() {
        return None;
    }
    Some(ParsedName {
        group,
        canonical,
        id: suffix.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_pads_short_suffix() {
        assert_eq!(normalize("0x8c0.bmp"), Some("0x08C0.bmp".to_string()));
    }

    #[test]
    fn test_normalize_uppercases_with_head() {
        assert_eq!(
            normalize("spellbook_fire_bolt_0x8c0.bmp"),
            Some("spellbook_fire_bolt_0x08C0.bmp".to_string())
        );
    }

    #[test]
    fn test_normalize_inserts_separator() {
        assert_eq!(
            normalize("spellbook_fire0x8c0.png"),
            Some("spellbook_fire_0x08C0.png".to_string())
        );
    }

    #[test]
    fn test_normalize_already_normalized_is_no_change() {
        assert_eq!(normalize("spellbook_fire_bolt_0x08C0.bmp"), None);
    }

    #[test]
    fn test_normalize_appends_from_decimal_run() {
        assert_eq!(
            normalize("icons_arrow_12.bmp"),
            Some("icons_arrow_12_0x000C.bmp".to_string())
        );
    }

    #[test]
    fn test_normalize_without_digits_is_no_change() {
        assert_eq!(normalize("spellbook_fire.bmp"), None);
        assert_eq!(normalize("readme"), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in ["0x8c0.bmp", "spellbook_fire_0xA.png", "icons_arrow_12.bmp"] {
            let once = normalize(name).unwrap();
            assert_eq!(normalize(&once), None, "second pass changed {once}");
        }
    }

    #[test]
    fn test_normalize_decimal_overflow_is_no_change() {
        assert_eq!(normalize("icons_arrow_4294967296.bmp"), None);
    }

    #[test]
    fn test_normalize_without_extension() {
        assert_eq!(normalize("items_sword_0x1b"), Some("items_sword_0x001B".to_string()));
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a_b_0x01.bmp"), ("a_b_0x01", Some("bmp")));
        assert_eq!(split_extension("no_suffix"), ("no_suffix", None));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
    }

    #[test]
    fn test_shift_derives_target_id() {
        // Offset derived from a known before/after identifier pair.
        let delta = 0x1B58 - 0x8C0;
        assert_eq!(
            shift_filename("items_sword_0x8C0.bmp", delta).unwrap(),
            Some("items_sword_0x1B58.bmp".to_string())
        );
    }

    #[test]
    fn test_shift_round_trips_identifier() {
        let delta = 0x1298;
        let forward = shift_filename("items_sword_0x8C0.bmp", delta)
            .unwrap()
            .unwrap();
        let back = shift_filename(&forward, -delta).unwrap().unwrap();
        let (stem, _) = split_extension(&back);
        assert_eq!(parse_stem(stem).unwrap().id, 0x8C0);
    }

    #[test]
    fn test_shift_round_trips_exactly_at_full_width() {
        let forward = shift_filename("items_sword_0x08C0.bmp", 0x100)
            .unwrap()
            .unwrap();
        assert_eq!(forward, "items_sword_0x09C0.bmp");
        let back = shift_filename(&forward, -0x100).unwrap().unwrap();
        assert_eq!(back, "items_sword_0x08C0.bmp");
    }

    #[test]
    fn test_shift_preserves_input_width() {
        assert_eq!(
            shift_filename("a_b_0x1.png", 1).unwrap(),
            Some("a_b_0x2.png".to_string())
        );
    }

    #[test]
    fn test_shift_without_suffix() {
        assert_eq!(shift_filename("a_plain_name.png", 5).unwrap(), None);
    }

    #[test]
    fn test_shift_out_of_range_is_an_error() {
        assert!(shift_filename("a_b_0x0001.bmp", -2).is_err());
        assert!(shift_filename("a_b_0xFFFF.bmp", i64::from(u32::MAX)).is_err());
    }

    #[test]
    fn test_parse_stem() {
        let parsed = parse_stem("spellbook_fire_bolt_0x08C0").unwrap();
        assert_eq!(parsed.group, "spellbook");
        assert_eq!(parsed.canonical, "fire_bolt");
        assert_eq!(parsed.id, 0x8C0);
    }

    #[test]
    fn test_parse_stem_accepts_unnormalized_suffix() {
        let parsed = parse_stem("items_sword_0x8c0").unwrap();
        assert_eq!(parsed.id, 0x8C0);
    }

    #[test]
    fn test_parse_stem_rejects_incomplete_names() {
        assert!(parse_stem("sword_0x01").is_none());
        assert!(parse_stem("_sword_0x01").is_none());
        assert!(parse_stem("items_sword").is_none());
        assert!(parse_stem("items_sword_0xZZZ").is_none());
        assert!(parse_stem("items_sword_0x12345").is_none());
    }
}

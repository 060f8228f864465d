//! Canonical slug derivation.
//!
//! The slug is the catalog's uniqueness key and public address for a ring.
//! It is derived from three user-entered fields and must be deterministic
//! and idempotent: slugifying a slug yields the same slug.

/// Separator between words and between the three source fields.
const SEPARATOR: char = '-';

/// Derive the canonical slug from the three metadata fields.
///
/// Fields are lowercased, latin diacritics are folded to ASCII, anything
/// outside `[a-z0-9]` becomes a separator, and runs of separators collapse.
/// Empty fields (a missing variant label) simply drop out.
pub fn derive_slug(media_title: &str, ring_title: &str, variant_label: &str) -> String {
    let mut out = String::new();
    for field in [media_title, ring_title, variant_label] {
        let part = slugify(field);
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(SEPARATOR);
        }
        out.push_str(&part);
    }
    out
}

/// Slugify a single field.
fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        let folded = fold_latin(c);
        if let Some(s) = folded {
            if pending_sep && !out.is_empty() {
                out.push(SEPARATOR);
            }
            pending_sep = false;
            out.push_str(s);
        } else if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push(SEPARATOR);
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Fold a lowercase latin character with diacritics to its ASCII base.
///
/// Characters outside this table that are not ASCII alphanumeric are
/// treated as separators by the caller.
fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => "i",
        'ľ' | 'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'ŕ' | 'ř' => "r",
        'ś' | 'š' => "s",
        'ť' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

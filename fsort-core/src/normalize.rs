//! File name normalization
//!
//! Transliterates Cyrillic letters to ASCII and collapses every run of
//! non-word characters into a single `_`. The extension is left untouched so
//! a normalized name still classifies the same way.

/// Lower-case Cyrillic letters (Russian and Ukrainian) and their Latin spelling.
const CYRILLIC: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "yo"),
    ('ж', "zh"),
    ('з', "z"),
    ('и', "i"),
    ('й', "y"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "kh"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "shch"),
    ('ъ', "'"),
    ('ы', "y"),
    ('ь', "'"),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ya"),
    ('є', "ye"),
    ('і', "i"),
    ('ї', "yi"),
    ('ґ', "g"),
];

/// Archive suffixes stripped when naming an unpack folder, longest first.
const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".zip", ".tar", ".gz"];

/// Split a file name into stem and extension.
///
/// The extension starts at the last dot and includes it. Leading dots never
/// start an extension, so `.gitignore` is all stem.
pub fn split_ext(name: &str) -> (&str, &str) {
    let lead = name.len() - name.trim_start_matches('.').len();
    match name[lead..].rfind('.') {
        Some(idx) => name.split_at(lead + idx),
        None => (name, ""),
    }
}

/// Extension of a file name without the dot, as written.
pub fn extension_of(name: &str) -> &str {
    let (_, ext) = split_ext(name);
    ext.strip_prefix('.').unwrap_or(ext)
}

/// Normalize a file name, keeping its extension byte-for-byte.
pub fn normalize(name: &str) -> String {
    let (stem, ext) = split_ext(name);
    let mut out = normalize_part(stem);
    out.push_str(ext);
    out
}

/// Normalized folder name for an archive: archive suffix stripped, rest
/// normalized as a plain stem.
pub fn normalize_stem(name: &str) -> String {
    normalize_part(archive_stem(name))
}

/// Strip a known archive suffix (case-insensitive), falling back to the
/// regular extension split.
pub fn archive_stem(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    for suffix in ARCHIVE_SUFFIXES {
        if lower.len() > suffix.len() && lower.ends_with(suffix) {
            return &name[..name.len() - suffix.len()];
        }
    }
    split_ext(name).0
}

fn normalize_part(part: &str) -> String {
    let mut transliterated = String::with_capacity(part.len());
    for c in part.chars() {
        match transliterate(c) {
            Some(latin) => transliterated.push_str(&latin),
            None => transliterated.push(c),
        }
    }

    let mut out = String::with_capacity(transliterated.len());
    let mut in_gap = false;
    for c in transliterated.chars() {
        if is_word_char(c) {
            out.push(c);
            in_gap = false;
        } else if !in_gap {
            out.push('_');
            in_gap = true;
        }
    }
    out
}

fn transliterate(c: char) -> Option<String> {
    if let Some((_, latin)) = CYRILLIC.iter().find(|(cyr, _)| *cyr == c) {
        return Some((*latin).to_string());
    }
    if c.is_uppercase() {
        let lower = c.to_lowercase().next()?;
        return CYRILLIC
            .iter()
            .find(|(cyr, _)| *cyr == lower)
            .map(|(_, latin)| latin.to_uppercase());
    }
    None
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

//! File categories and the fixed extension table

use serde::{Deserialize, Serialize};

/// Category a file is sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Audio,
    Video,
    Document,
    Archive,
    Other,
}

/// Extension table, keys upper-case without the dot.
const EXTENSION_TABLE: &[(&str, Category)] = &[
    ("JPEG", Category::Image),
    ("JPG", Category::Image),
    ("PNG", Category::Image),
    ("SVG", Category::Image),
    ("MP3", Category::Audio),
    ("OGG", Category::Audio),
    ("WAV", Category::Audio),
    ("AMR", Category::Audio),
    ("AVI", Category::Video),
    ("MP4", Category::Video),
    ("MOV", Category::Video),
    ("MKV", Category::Video),
    ("DOC", Category::Document),
    ("DOCX", Category::Document),
    ("TXT", Category::Document),
    ("PDF", Category::Document),
    ("XLSX", Category::Document),
    ("PPTX", Category::Document),
    ("ZIP", Category::Archive),
    ("GZ", Category::Archive),
    ("TAR", Category::Archive),
];

impl Category {
    /// Number of categories
    pub const COUNT: usize = 6;

    /// All categories in dispatch order
    pub const ALL: [Category; Category::COUNT] = [
        Category::Image,
        Category::Audio,
        Category::Video,
        Category::Document,
        Category::Archive,
        Category::Other,
    ];

    /// Position of this category in [`Category::ALL`], for array-indexed buckets
    pub fn index(self) -> usize {
        match self {
            Category::Image => 0,
            Category::Audio => 1,
            Category::Video => 2,
            Category::Document => 3,
            Category::Archive => 4,
            Category::Other => 5,
        }
    }

    /// Default output folder name
    pub fn default_folder(self) -> &'static str {
        match self {
            Category::Image => "images",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Document => "documents",
            Category::Archive => "archives",
            Category::Other => "other",
        }
    }

    /// Archives are unpacked, everything else is moved
    pub fn is_archive(self) -> bool {
        self == Category::Archive
    }

    /// Look up a known extension (without the dot, any case).
    /// Returns `None` for extensions not in the table.
    pub fn from_extension(ext: &str) -> Option<Category> {
        let upper = ext.to_ascii_uppercase();
        EXTENSION_TABLE
            .iter()
            .find(|(known, _)| *known == upper)
            .map(|(_, category)| *category)
    }

    /// Extensions that map to this category
    pub fn extensions(self) -> impl Iterator<Item = &'static str> {
        EXTENSION_TABLE
            .iter()
            .filter(move |(_, category)| *category == self)
            .map(|(ext, _)| *ext)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_folder())
    }
}

/// Classify an extension; anything unknown or empty is [`Category::Other`].
pub fn classify(ext: &str) -> Category {
    if ext.is_empty() {
        return Category::Other;
    }
    Category::from_extension(ext).unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(classify("mp3"), Category::Audio);
        assert_eq!(classify("MP3"), Category::Audio);
        assert_eq!(classify("Mp3"), Category::Audio);
    }

    #[test]
    fn test_every_table_entry_round_trips_case() {
        for (ext, category) in EXTENSION_TABLE {
            assert_eq!(classify(ext), *category);
            assert_eq!(classify(&ext.to_lowercase()), *category);
        }
    }

    #[test]
    fn test_classify_groups() {
        assert_eq!(classify("jpeg"), Category::Image);
        assert_eq!(classify("svg"), Category::Image);
        assert_eq!(classify("amr"), Category::Audio);
        assert_eq!(classify("mkv"), Category::Video);
        assert_eq!(classify("pptx"), Category::Document);
        assert_eq!(classify("gz"), Category::Archive);
        assert_eq!(classify("tar"), Category::Archive);
    }

    #[test]
    fn test_unknown_and_empty_are_other() {
        assert_eq!(classify("exe"), Category::Other);
        assert_eq!(classify(""), Category::Other);
        assert_eq!(Category::from_extension("exe"), None);
        assert_eq!(Category::from_extension(""), None);
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_default_folders_unique() {
        let mut names: Vec<_> = Category::ALL.iter().map(|c| c.default_folder()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Category::COUNT);
    }

    #[test]
    fn test_extensions_listing() {
        let docs: Vec<_> = Category::Document.extensions().collect();
        assert_eq!(docs, vec!["DOC", "DOCX", "TXT", "PDF", "XLSX", "PPTX"]);
        assert_eq!(Category::Other.extensions().count(), 0);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Category::Document).unwrap();
        assert_eq!(json, "\"document\"");
    }
}

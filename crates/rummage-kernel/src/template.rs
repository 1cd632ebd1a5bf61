//! Name templates used to filter discovered entities.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// A predicate over an entity's full name.
///
/// Only two real kinds exist: an exact name or a regex over the name.
/// `Any` is what callers get when they pass neither, and it matches
/// everything.
#[derive(Clone, Default)]
pub enum Template {
    #[default]
    Any,
    Exact(String),
    Pattern(Regex),
}

impl Template {
    /// Compile `pattern` into a [`Template::Pattern`].
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Template::Pattern(Regex::new(pattern)?))
    }

    pub fn exact(name: impl Into<String>) -> Self {
        Template::Exact(name.into())
    }

    pub fn matches(&self, full_name: &str) -> bool {
        match self {
            Template::Any => true,
            Template::Exact(name) => name == full_name,
            Template::Pattern(regex) => regex.is_match(full_name),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Template::Any)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Any => f.write_str("Any"),
            Template::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            Template::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
        }
    }
}

impl From<&str> for Template {
    fn from(name: &str) -> Self {
        Template::Exact(name.to_string())
    }
}

impl From<String> for Template {
    fn from(name: String) -> Self {
        Template::Exact(name)
    }
}

impl From<Regex> for Template {
    fn from(regex: Regex) -> Self {
        Template::Pattern(regex)
    }
}

impl<T: Into<Template>> From<Option<T>> for Template {
    fn from(template: Option<T>) -> Self {
        template.map(Into::into).unwrap_or_default()
    }
}

/// File categories with a baked-in extension pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCategory {
    Audio,
    Image,
    Video,
    Json,
    Text,
}

// Audio and images also ship in packaged form with a trailing `_`.
static AUDIO: LazyLock<Regex> = LazyLock::new(|| compile(r"\.(?:ogg|ogg_)$"));
static IMAGE: LazyLock<Regex> = LazyLock::new(|| compile(r"\.(?:png|png_)$"));
static VIDEO: LazyLock<Regex> = LazyLock::new(|| compile(r"\.(?:webm|mp4)$"));
static JSON: LazyLock<Regex> = LazyLock::new(|| compile(r"\.json$"));
static TEXT: LazyLock<Regex> = LazyLock::new(|| compile(r"\.txt$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in category pattern is valid")
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 5] = [
        MediaCategory::Audio,
        MediaCategory::Image,
        MediaCategory::Video,
        MediaCategory::Json,
        MediaCategory::Text,
    ];

    pub fn regex(self) -> &'static Regex {
        match self {
            MediaCategory::Audio => &AUDIO,
            MediaCategory::Image => &IMAGE,
            MediaCategory::Video => &VIDEO,
            MediaCategory::Json => &JSON,
            MediaCategory::Text => &TEXT,
        }
    }

    pub fn matches(self, full_name: &str) -> bool {
        self.regex().is_match(full_name)
    }

    pub fn name(self) -> &'static str {
        match self {
            MediaCategory::Audio => "audio",
            MediaCategory::Image => "image",
            MediaCategory::Video => "video",
            MediaCategory::Json => "json",
            MediaCategory::Text => "txt",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_whole_name_only() {
        let template = Template::from("a.txt");
        assert!(template.matches("a.txt"));
        assert!(!template.matches("aa.txt"));
        assert!(!template.matches("a.txt.bak"));
    }

    #[test]
    fn pattern_matches_substring_rules() {
        let template = Template::pattern(r"\.txt$").unwrap();
        assert!(template.matches("notes.txt"));
        assert!(!template.matches("notes.txt.bak"));
    }

    #[test]
    fn missing_template_matches_everything() {
        let template: Template = None::<&str>.into();
        assert!(template.is_any());
        assert!(template.matches(""));
        assert!(template.matches("anything.at.all"));
    }

    #[test]
    fn packaged_extensions_count_for_media() {
        assert!(MediaCategory::Audio.matches("Battle1.ogg"));
        assert!(MediaCategory::Audio.matches("Battle1.ogg_"));
        assert!(!MediaCategory::Audio.matches("Battle1.ogg.bak"));
        assert!(MediaCategory::Image.matches("Actor1.png"));
        assert!(MediaCategory::Image.matches("Actor1.png_"));
        assert!(!MediaCategory::Image.matches("Actor1.jpg"));
        assert!(MediaCategory::Video.matches("intro.webm"));
        assert!(MediaCategory::Json.matches("System.json"));
        assert!(MediaCategory::Text.matches("credits.txt"));
    }

    #[test]
    fn category_names_round_trip() {
        for category in MediaCategory::ALL {
            assert_eq!(MediaCategory::from_name(category.name()), Some(category));
        }
        assert_eq!(MediaCategory::from_name("midi"), None);
    }
}

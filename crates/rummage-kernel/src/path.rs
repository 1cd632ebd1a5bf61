//! Entity path handling.
//!
//! Nothing in here touches the filesystem.

use std::path::{Path, PathBuf};

/// Normalize a raw path.
///
/// Backslashes become `/`, runs of separators collapse, `.` segments and a
/// trailing separator are dropped. The root stays `/`; an empty relative
/// path becomes `.`. `..` segments are kept as written since resolving them
/// lexically would be wrong across symlinks.
///
/// Normalizing an already-normalized path returns it unchanged.
pub fn normalize(raw: &str) -> String {
    let unified = raw.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let segments: Vec<&str> = unified
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    match (absolute, segments.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", segments.join("/")),
        (false, true) => ".".to_string(),
        (false, false) => segments.join("/"),
    }
}

/// The raw and normalized forms of an entity's path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityPath {
    raw: String,
    full: String,
}

impl EntityPath {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let full = normalize(&raw);
        Self { raw, full }
    }

    /// The path exactly as given at construction.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The normalized path.
    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.full)
    }

    pub fn is_absolute(&self) -> bool {
        self.full.starts_with('/')
    }

    /// `full` resolved against `root` unless it is already absolute.
    pub fn absolute(&self, root: &Path) -> PathBuf {
        if self.is_absolute() {
            PathBuf::from(&self.full)
        } else if self.full == "." {
            root.to_path_buf()
        } else {
            root.join(&self.full)
        }
    }

    /// Last path segment, extension included.
    pub fn full_name(&self) -> &str {
        match self.full.as_str() {
            "/" => "",
            full => full.rsplit('/').next().unwrap_or(full),
        }
    }

    /// Full name without its last extension.
    pub fn base_name(&self) -> &str {
        let name = self.full_name();
        match extension_start(name) {
            Some(dot) => &name[..dot],
            None => name,
        }
    }

    /// Text after the last `.` of the full name, without the dot.
    ///
    /// Empty when there is none. A name that only starts with a dot
    /// (`.gitignore`) has no extension.
    pub fn extension(&self) -> &str {
        let name = self.full_name();
        match extension_start(name) {
            Some(dot) => &name[dot + 1..],
            None => "",
        }
    }

    /// The path of a direct child called `name`.
    pub fn join(&self, name: &str) -> Self {
        let raw = match self.full.as_str() {
            "." => name.to_string(),
            "/" => format!("/{name}"),
            full => format!("{full}/{name}"),
        };
        Self::new(raw)
    }

    /// The containing path. The parent of `.` is `..`; the root is its own
    /// parent.
    pub fn parent(&self) -> Self {
        let full = self.full.as_str();
        match full {
            "/" => Self::new("/"),
            "." => Self::new(".."),
            _ if full == ".." || full.ends_with("/..") => Self::new(format!("{full}/..")),
            _ => match full.rfind('/') {
                Some(0) => Self::new("/"),
                Some(idx) => Self::new(&full[..idx]),
                None => Self::new("."),
            },
        }
    }
}

fn extension_start(name: &str) -> Option<usize> {
    if name == ".." {
        return None;
    }
    name.rfind('.').filter(|&idx| idx > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators_and_dots() {
        assert_eq!(normalize("img//pictures/"), "img/pictures");
        assert_eq!(normalize("./data/./Map001.json"), "data/Map001.json");
        assert_eq!(normalize("audio\\bgm\\Battle1.ogg"), "audio/bgm/Battle1.ogg");
        assert_eq!(normalize("//"), "/");
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("./"), ".");
        assert_eq!(normalize("../save"), "../save");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["", "/", "a//b/", "./x/./y", "..\\up", "/abs//path/", "save/file1.rmmzsave"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "raw = {raw:?}");
        }
    }

    #[test]
    fn name_queries() {
        let path = EntityPath::new("img/pictures/Actor1.png_");
        assert_eq!(path.full_name(), "Actor1.png_");
        assert_eq!(path.base_name(), "Actor1");
        assert_eq!(path.extension(), "png_");

        let path = EntityPath::new("data/archive.tar.gz");
        assert_eq!(path.base_name(), "archive.tar");
        assert_eq!(path.extension(), "gz");

        let path = EntityPath::new(".gitignore");
        assert_eq!(path.base_name(), ".gitignore");
        assert_eq!(path.extension(), "");

        let path = EntityPath::new("README");
        assert_eq!(path.extension(), "");
    }

    #[test]
    fn absolute_resolution() {
        let root = Path::new("/games/quest");
        assert_eq!(EntityPath::new("data").absolute(root), PathBuf::from("/games/quest/data"));
        assert_eq!(EntityPath::new(".").absolute(root), PathBuf::from("/games/quest"));
        assert_eq!(EntityPath::new("/tmp/x").absolute(root), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn join_and_parent() {
        let root = EntityPath::new(".");
        let data = root.join("data");
        assert_eq!(data.full(), "data");
        assert_eq!(data.join("Map001.json").full(), "data/Map001.json");
        assert_eq!(data.parent().full(), ".");
        assert_eq!(EntityPath::new("/save").parent().full(), "/");
        assert_eq!(EntityPath::new("/").join("save").full(), "/save");
        assert_eq!(EntityPath::new("a/b/c").parent().full(), "a/b");
        assert_eq!(EntityPath::new(".").parent().full(), "..");
        assert_eq!(EntityPath::new("..").parent().full(), "../..");
    }

    #[test]
    fn raw_is_preserved() {
        let path = EntityPath::new("img//faces/");
        assert_eq!(path.raw(), "img//faces/");
        assert_eq!(path.full(), "img/faces");
    }
}

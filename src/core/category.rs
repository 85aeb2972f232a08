//! The category classifier.
//!
//! A single static table maps lowercase dotted extensions to a [`Category`].
//! The same table decides which storage subfolder an imported file is written
//! to and which category a file found in that subfolder reports, so the two
//! directions can never drift apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One of the fixed classification buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Videos,
    /// Reported as `photos`, stored on disk under `images/`.
    Photos,
    Audio,
    Code,
    Folders,
    Icons,
    Notes,
    Ppt,
    Ae,
    Models,
}

/// Marker type for plain directories.
pub const FOLDER_MARKER: &str = "folder";
/// Marker type for directories recognized as code projects.
pub const PROJECT_MARKER: &str = ".project";

const EXTENSION_TABLE: &[(&str, Category)] = &[
    (".mp4", Category::Videos),
    (".avi", Category::Videos),
    (".mov", Category::Videos),
    (".jpg", Category::Photos),
    (".png", Category::Photos),
    (".gif", Category::Photos),
    (".mp3", Category::Audio),
    (".wav", Category::Audio),
    (".m4a", Category::Audio),
    (".ogg", Category::Audio),
    (".flac", Category::Audio),
    (".js", Category::Code),
    (".py", Category::Code),
    (".java", Category::Code),
    (".cpp", Category::Code),
    (".html", Category::Code),
    (".css", Category::Code),
    (".ico", Category::Icons),
    (".icns", Category::Icons),
    (".svg", Category::Icons),
    (".txt", Category::Notes),
    (".md", Category::Notes),
    (".doc", Category::Notes),
    (".docx", Category::Notes),
    (".pdf", Category::Notes),
    (".ppt", Category::Ppt),
    (".pptx", Category::Ppt),
    (".aep", Category::Ae),
    (".zip", Category::Ae),
    (".fbx", Category::Models),
    (".obj", Category::Models),
    (".max", Category::Models),
    (".c4d", Category::Models),
    (".blend", Category::Models),
    (".3ds", Category::Models),
    (".dae", Category::Models),
    (".pth", Category::Models),
    (".glb", Category::Models),
];

impl Category {
    /// All categories, in storage scan order.
    pub const ALL: [Category; 10] = [
        Category::Videos,
        Category::Photos,
        Category::Audio,
        Category::Code,
        Category::Folders,
        Category::Icons,
        Category::Notes,
        Category::Ppt,
        Category::Ae,
        Category::Models,
    ];

    /// Maps an extension (`.mp4`) or a directory marker (`folder`, `.project`)
    /// to its category. Unknown input yields `None`.
    pub fn classify(marker: &str) -> Option<Category> {
        let marker = marker.to_lowercase();
        match marker.as_str() {
            FOLDER_MARKER => Some(Category::Folders),
            PROJECT_MARKER => Some(Category::Code),
            ext => EXTENSION_TABLE
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, category)| *category),
        }
    }

    /// The identifier used in the UI and in tag sidecar file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Videos => "videos",
            Category::Photos => "photos",
            Category::Audio => "audio",
            Category::Code => "code",
            Category::Folders => "folders",
            Category::Icons => "icons",
            Category::Notes => "notes",
            Category::Ppt => "ppt",
            Category::Ae => "ae",
            Category::Models => "models",
        }
    }

    /// The subfolder name under the storage root.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Category::Photos => "images",
            other => other.as_str(),
        }
    }

    /// Inverse of [`Category::folder_name`].
    pub fn from_folder_name(name: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| category.folder_name() == name)
    }

    /// Extensions (without the leading dot) that classify into this category.
    pub fn extensions(&self) -> Vec<&'static str> {
        EXTENSION_TABLE
            .iter()
            .filter(|(_, category)| category == self)
            .map(|(ext, _)| ext.trim_start_matches('.'))
            .collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s || category.folder_name() == s)
            .ok_or_else(|| format!("Unknown category: '{s}'"))
    }
}

/// The type of a [`FileRecord`](super::FileRecord): a lowercase extension,
/// or one of the two directory markers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FileType {
    Folder,
    Project,
    /// Lowercase and dotted (`.png`), or empty for files without an extension.
    Extension(String),
}

impl FileType {
    /// Derives the extension type from a file name.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default();
        FileType::Extension(ext)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FileType::Folder => FOLDER_MARKER,
            FileType::Project => PROJECT_MARKER,
            FileType::Extension(ext) => ext,
        }
    }

    pub fn category(&self) -> Option<Category> {
        Category::classify(self.as_str())
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, FileType::Folder | FileType::Project)
    }
}

impl From<String> for FileType {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            FOLDER_MARKER => FileType::Folder,
            PROJECT_MARKER => FileType::Project,
            _ => FileType::Extension(value.to_lowercase()),
        }
    }
}

impl From<FileType> for String {
    fn from(value: FileType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The category selector of the filter pipeline: either every file, or the
/// files of a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn category(&self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(category) => Some(*category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value {
            CategoryFilter::All => "all".to_string(),
            CategoryFilter::Only(category) => category.as_str().to_string(),
        }
    }
}

/// A named group of extensions offered by the native "pick files" dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogFilter {
    pub name: &'static str,
    pub extensions: Vec<&'static str>,
}

/// Returns the file-dialog filters for importing into `category`.
///
/// Folder imports need no filter. For `None` (no specific category) a single
/// filter with every supported extension is returned.
pub fn dialog_filters(category: Option<Category>) -> Vec<DialogFilter> {
    let Some(category) = category else {
        return vec![DialogFilter {
            name: "All supported files",
            extensions: EXTENSION_TABLE
                .iter()
                .map(|(ext, _)| ext.trim_start_matches('.'))
                .collect(),
        }];
    };
    let name = match category {
        Category::Folders => return Vec::new(),
        Category::Videos => "Videos",
        Category::Photos => "Images",
        Category::Audio => "Audio",
        Category::Code => "Code",
        Category::Icons => "Icons",
        Category::Notes => "Notes",
        Category::Ppt => "Presentations",
        Category::Ae => "After Effects projects",
        Category::Models => "3D models",
    };
    vec![DialogFilter {
        name,
        extensions: category.extensions(),
    }]
}

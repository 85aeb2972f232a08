use crate::core::Category;
use std::path::Path;

/// Extensions that count towards the "several code files" rule of the
/// project detector.
const PROJECT_CODE_EXTENSIONS: &[&str] = &[
    "js", "html", "css", "py", "java", "cpp", "jsx", "ts", "tsx",
];

/// Source file extensions counted by the project statistics, with the
/// language they are reported as.
const LANGUAGE_TABLE: &[(&str, &str)] = &[
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("jsx", "React"),
    ("tsx", "React/TypeScript"),
    ("py", "Python"),
    ("java", "Java"),
    ("cpp", "C++"),
    ("c", "C"),
    ("h", "C"),
    ("hpp", "C++"),
    ("cs", "C#"),
    ("php", "PHP"),
    ("rb", "Ruby"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
    ("scala", "Scala"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("less", "Less"),
    ("vue", "Vue"),
];

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Whether the file counts as source code for project detection.
pub fn is_project_code_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| PROJECT_CODE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// The language name for a source file, `None` for anything else.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    let ext = lowercase_extension(path)?;
    LANGUAGE_TABLE
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, language)| *language)
}

/// Picks the dotted extension for an image MIME type, restricted to the
/// extensions that classify as photos (`image/jpeg` -> `.jpg`).
pub fn photo_extension_for_mime(mime: &str) -> Option<String> {
    let mime = mime.trim().to_lowercase();
    if !mime.starts_with("image/") {
        return None;
    }
    mime_guess::get_mime_extensions_str(&mime)?
        .iter()
        .map(|ext| format!(".{ext}"))
        .find(|ext| Category::classify(ext) == Some(Category::Photos))
}

//! Heuristics for recognizing code projects, and statistics about them.

use crate::utils::file_detection::{is_project_code_file, language_for_path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

/// Files or directories whose presence alone marks a directory as a project.
const PROJECT_MARKERS: &[&str] = &[
    "package.json",
    "composer.json",
    "requirements.txt",
    "pom.xml",
    "build.gradle",
    "CMakeLists.txt",
    ".git",
    ".svn",
    "Cargo.toml",
    "go.mod",
    "index.html",
    "webpack.config.js",
    "vite.config.js",
    "tsconfig.json",
    ".gitignore",
];

/// Conventional source-tree directory names.
const PROJECT_DIRS: &[&str] = &[
    "src",
    "test",
    "docs",
    "build",
    "dist",
    "node_modules",
    "public",
    "assets",
    "styles",
    "scripts",
    "components",
    "pages",
    "static",
];

/// Number of immediate code files that make a directory a project.
const MIN_CODE_FILES: usize = 2;

/// Directories skipped while collecting statistics.
const STATS_SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];

#[derive(Debug, PartialEq, Eq)]
enum ProjectEvidence {
    Marker(&'static str),
    SourceDir(String),
    CodeFiles(usize),
}

/// Decides whether `dir` looks like a code project.
///
/// Checks, in order: a known marker file, a conventional source directory,
/// then at least two code files directly inside `dir`. Never fails: any I/O
/// error means "not a project". Symlinks are not followed.
pub async fn is_code_project(dir: &Path) -> bool {
    match detect_project(dir).await {
        Ok(Some(evidence)) => {
            tracing::debug!("{} is a code project: {:?}", dir.display(), evidence);
            true
        }
        Ok(None) => {
            tracing::debug!("No project evidence in {}", dir.display());
            false
        }
        Err(e) => {
            tracing::warn!("Project check failed for {}: {}", dir.display(), e);
            false
        }
    }
}

async fn detect_project(dir: &Path) -> io::Result<Option<ProjectEvidence>> {
    for marker in PROJECT_MARKERS {
        if fs::symlink_metadata(dir.join(marker)).await.is_ok() {
            return Ok(Some(ProjectEvidence::Marker(marker)));
        }
    }

    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let file_type = entry.file_type().await?;
        entries.push((entry.path(), file_type));
    }

    for (path, file_type) in &entries {
        if !file_type.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if PROJECT_DIRS.contains(&name) {
                return Ok(Some(ProjectEvidence::SourceDir(name.to_string())));
            }
        }
    }

    let code_files = entries
        .iter()
        .filter(|(path, file_type)| file_type.is_file() && is_project_code_file(path))
        .count();
    if code_files >= MIN_CODE_FILES {
        return Ok(Some(ProjectEvidence::CodeFiles(code_files)));
    }

    Ok(None)
}

/// Source statistics of a project directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub file_count: usize,
    pub line_count: usize,
    /// Lines per language.
    pub languages: BTreeMap<String, usize>,
    pub main_language: String,
}

impl Default for ProjectStats {
    fn default() -> Self {
        Self {
            file_count: 0,
            line_count: 0,
            languages: BTreeMap::new(),
            main_language: "Unknown".to_string(),
        }
    }
}

/// Counts source files and lines per language below `dir`.
///
/// Dependency and build output directories are skipped. On any error the
/// empty statistics are returned.
pub async fn project_stats(dir: &Path) -> ProjectStats {
    let dir = dir.to_path_buf();
    let result = tokio::task::spawn_blocking(move || collect_stats(&dir)).await;
    match result {
        Ok(Ok(stats)) => stats,
        Ok(Err(e)) => {
            tracing::warn!("Failed to collect project statistics: {}", e);
            ProjectStats::default()
        }
        Err(e) => {
            tracing::error!("Project statistics task failed: {}", e);
            ProjectStats::default()
        }
    }
}

fn collect_stats(dir: &Path) -> io::Result<ProjectStats> {
    let mut stats = ProjectStats::default();

    let walker = WalkDir::new(dir).follow_links(false).into_iter();
    let walker = walker.filter_entry(|entry| {
        !(entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map(|name| STATS_SKIP_DIRS.contains(&name))
                .unwrap_or(false))
    });

    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(language) = language_for_path(entry.path()) else {
            continue;
        };
        let bytes = std::fs::read(entry.path())?;
        let lines = String::from_utf8_lossy(&bytes).split('\n').count();

        stats.file_count += 1;
        stats.line_count += lines;
        *stats.languages.entry(language.to_string()).or_insert(0) += lines;
    }

    let mut max_lines = 0;
    for (language, lines) in &stats.languages {
        if *lines > max_lines {
            max_lines = *lines;
            stats.main_language = language.clone();
        }
    }

    Ok(stats)
}

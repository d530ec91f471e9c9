//! Decides which walked files are worth scanning. Pattern matching on binary
//! blobs produces mostly garbage hits, so files with well-known binary
//! extensions are skipped up front.

use std::path::Path;

/// Checks if a file is likely to be binary based on its extension
pub fn is_likely_binary(path: &Path) -> bool {
    const BINARY_EXTENSIONS: &[&str] = &[
        "exe", "dll", "so", "dylib", "bin", "obj", "o", "class", "jar", "war", "ear", "png", "jpg",
        "jpeg", "gif", "bmp", "ico", "pdf", "doc", "docx", "xls", "xlsx", "zip", "tar", "gz", "7z",
        "rar",
    ];

    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return BINARY_EXTENSIONS
                .iter()
                .any(|&bin_ext| bin_ext.eq_ignore_ascii_case(ext_str));
        }
    }
    false
}

/// Checks if a path sits inside a `.git` directory
pub fn in_git_dir(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_str() == Some(".git"))
}

/// Determines if a walked file should be scanned
pub fn should_scan(path: &Path) -> bool {
    !is_likely_binary(path) && !in_git_dir(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_likely_binary() {
        assert!(is_likely_binary(Path::new("app.exe")));
        assert!(is_likely_binary(Path::new("lib.so")));
        assert!(is_likely_binary(Path::new("logo.PNG"))); // case insensitive
        assert!(!is_likely_binary(Path::new("main.rs")));
        assert!(!is_likely_binary(Path::new(".env")));
        assert!(!is_likely_binary(Path::new("README")));
    }

    #[test]
    fn test_in_git_dir() {
        assert!(in_git_dir(Path::new("repo/.git/config")));
        assert!(in_git_dir(Path::new(".git/HEAD")));
        assert!(!in_git_dir(Path::new(".gitignore")));
        assert!(!in_git_dir(Path::new("src/git/mod.rs")));
    }

    #[test]
    fn test_should_scan() {
        assert!(should_scan(Path::new("src/config.yaml")));
        assert!(should_scan(Path::new(".env")));
        assert!(!should_scan(Path::new("repo/.git/config")));
        assert!(!should_scan(Path::new("build/app.jar")));
    }
}

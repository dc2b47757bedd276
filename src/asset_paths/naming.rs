use std::path::{Path, PathBuf};

const MINIFIED_INFIXES: [&str; 2] = [".min.js", ".min.css"];

/// Whether the file name follows the `name.min.js` / `name.min.css` convention.
pub fn is_minified_name(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| MINIFIED_INFIXES.iter().any(|infix| name.contains(infix)))
}

/// Insert `.min` before the final extension: `app.js` becomes `app.min.js`.
///
/// Names without an extension (including dot-files) get a `.min` suffix.
pub fn minified_sibling_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(index) if index > 0 => {
            format!("{}.min{}", &file_name[..index], &file_name[index..])
        }
        _ => format!("{file_name}.min"),
    }
}

/// Path of the minified counterpart living next to `path`.
pub fn minified_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(minified_sibling_name(&name))
}

/// Render a relative path with forward slashes, as used inside HTML attributes.
pub fn to_url_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

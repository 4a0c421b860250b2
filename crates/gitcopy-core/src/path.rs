use crate::CopyError;

/// Strip leading and trailing slashes. The empty string is the repository root.
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// Replace the `src` prefix of `path` with `dest`, once.
///
/// The prefix only matches on a segment boundary, so `a/bc/x` is not under
/// `a/b`. A `path` equal to `src` maps to `dest` itself.
pub fn rewrite_path(path: &str, src: &str, dest: &str) -> Result<String, CopyError> {
    let path = normalize_path(path);
    let src = normalize_path(src);
    let dest = normalize_path(dest);

    let suffix = if src.is_empty() {
        Some(path)
    } else if path == src {
        Some("")
    } else {
        path.strip_prefix(src).and_then(|rest| rest.strip_prefix('/'))
    };

    let suffix = suffix.ok_or_else(|| CopyError::PathOutsideSource {
        path: path.to_string(),
        source_path: src.to_string(),
    })?;

    match (dest.is_empty(), suffix.is_empty()) {
        (true, true) => Err(CopyError::UnexpectedContent(format!(
            "cannot copy {path} onto the repository root"
        ))),
        (true, false) => Ok(suffix.to_string()),
        (false, true) => Ok(dest.to_string()),
        (false, false) => Ok(format!("{dest}/{suffix}")),
    }
}

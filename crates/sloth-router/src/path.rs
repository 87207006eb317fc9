//! Route-relative path helpers.
//!
//! All paths handled here are relative to the routes root and use `/`
//! as the separator. The routes root itself is spelled `"."`.

/// Normalize a route-relative directory path.
///
/// Strips leading `/` and `./`, trailing `/`, and collapses the empty
/// string to `"."`.
pub fn normalize_dir(dir: &str) -> String {
    let trimmed = dir
        .trim_start_matches("./")
        .trim_start_matches('/')
        .trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

/// The directory containing a route-relative file path, normalized.
pub fn parent_dir(file_path: &str) -> String {
    let trimmed = file_path.trim_start_matches("./").trim_start_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => normalize_dir(&trimmed[..idx]),
        None => ".".to_string(),
    }
}

/// File name without its final extension.
pub fn file_stem(file_path: &str) -> &str {
    let trimmed = file_path.trim_start_matches("./").trim_start_matches('/');
    let name = match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Ancestor directories of a normalized directory, root first.
///
/// `"a/b/c"` yields `".", "a", "a/b", "a/b/c"`. The root `"."` yields
/// just itself.
pub fn ancestor_dirs(dir: &str) -> Vec<String> {
    let normalized = normalize_dir(dir);
    let mut out = vec![".".to_string()];
    if normalized == "." {
        return out;
    }
    let mut acc = String::new();
    for segment in normalized.split('/') {
        if !acc.is_empty() {
            acc.push('/');
        }
        acc.push_str(segment);
        out.push(acc.clone());
    }
    out
}

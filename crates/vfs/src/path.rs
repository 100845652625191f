//! Unix path helpers.
//!
//! VFS paths always start with `/` and use `/` as separator. The root
//! is `"/"` and has no components.

/// Splits a unix path into its components.
pub fn components(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

/// First path component, if any.
pub fn first_component(path: &str) -> Option<&str> {
    components(path).next()
}

/// Last path component, if any.
pub fn file_name(path: &str) -> Option<&str> {
    components(path).next_back()
}

/// Joins a directory path and a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// File extension including the leading dot, e.g. `".png"`.
///
/// `None` if the file name contains no dot past the first character.
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path)?;
    match name.rfind('.') {
        Some(0) | None => None,
        Some(i) => Some(&name[i..]),
    }
}

/// Returns whether `prefix`'s components are a prefix of `path`'s.
pub fn starts_with(path: &str, prefix: &str) -> bool {
    let mut path_iter = components(path);
    for want in components(prefix) {
        match path_iter.next() {
            Some(got) if got == want => {}
            _ => return false,
        }
    }
    true
}

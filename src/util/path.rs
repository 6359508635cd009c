pub const DELIMITER: char = '/';

/// Parent of a delimiter-separated path, empty for top-level entries.
/// A trailing delimiter is ignored, so `folder/` has no parent and
/// `folder/sub/` has parent `folder`.
pub fn parent(path: &str) -> String {
    let path = path.trim_end_matches(DELIMITER);

    match path.rfind(DELIMITER) {
        Some(pos) => path[..pos].to_string(),
        None => String::new(),
    }
}

pub fn as_dir_prefix(path: &str) -> String {
    if path.is_empty() || path.ends_with(DELIMITER) {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

pub fn normalize_root(root: &str) -> String {
    let root = root.trim_matches(DELIMITER);

    if root.is_empty() {
        String::new()
    } else {
        format!("{}/", root)
    }
}

pub fn join_root(root: &str, path: &str) -> String {
    format!("{}{}", root, path.trim_start_matches(DELIMITER))
}

pub fn depth(path: &str) -> usize {
    path.matches(DELIMITER).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent() {
        let cases = vec![
            ("folder/file", "folder"),
            ("folder/subfolder/file", "folder/subfolder"),
            ("file", ""),
            ("folder/", ""),
            ("folder/subfolder/", "folder"),
            ("", ""),
        ];

        for (input, expected) in cases {
            let result = parent(input);
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_as_dir_prefix() {
        let cases = vec![("docs", "docs/"), ("docs/", "docs/"), ("", "")];

        for (input, expected) in cases {
            let result = as_dir_prefix(input);
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_normalize_root() {
        let cases = vec![("", ""), ("/", ""), ("root", "root/"), ("/root/", "root/")];

        for (input, expected) in cases {
            let result = normalize_root(input);
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_join_root() {
        let cases = vec![
            ("", "file", "file"),
            ("root/", "file", "root/file"),
            ("root/", "/file", "root/file"),
        ];

        for (root, path, expected) in cases {
            let result = join_root(root, path);
            assert_eq!(result, expected, "failed for case: {}/{}", root, path);
        }
    }

    #[test]
    fn test_depth() {
        let cases = vec![("docs", 0), ("docs/a.txt", 1), ("docs/sub/b.txt", 2)];

        for (input, expected) in cases {
            let result = depth(input);
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }
}

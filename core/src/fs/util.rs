use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

pub fn is_hidden(path: &Path) -> bool {
    path.file_name().and_then(OsStr::to_str).map(|name| name.starts_with('.')).unwrap_or(false)
}

/// Case-insensitive ordering that compares digit runs by value ("p2" < "p10").
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let a_chunks = chunks(&a_lower);
    let b_chunks = chunks(&b_lower);

    for (a_chunk, b_chunk) in a_chunks.iter().zip(b_chunks.iter()) {
        let order = match (a_chunk, b_chunk) {
            (Chunk::Digits(a_digits), Chunk::Digits(b_digits)) => {
                let a_trimmed = a_digits.trim_start_matches('0');
                let b_trimmed = b_digits.trim_start_matches('0');
                a_trimmed
                    .len()
                    .cmp(&b_trimmed.len())
                    .then_with(|| a_trimmed.cmp(b_trimmed))
                    .then_with(|| a_digits.len().cmp(&b_digits.len()))
            }
            (Chunk::Text(a_text), Chunk::Text(b_text)) => a_text.cmp(b_text),
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if order != Ordering::Equal {
            return order;
        }
    }

    a_chunks.len().cmp(&b_chunks.len()).then_with(|| a.cmp(b))
}

enum Chunk<'a> {
    Text(&'a str),
    Digits(&'a str),
}

fn chunks(input: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (idx, ch) in input.char_indices() {
        let is_digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                out.push(chunk(&input[start..idx], prev));
                start = idx;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(last) = in_digits {
        out.push(chunk(&input[start..], last));
    }
    out
}

fn chunk(text: &str, digits: bool) -> Chunk<'_> {
    if digits { Chunk::Digits(text) } else { Chunk::Text(text) }
}

/// Relative, traversal-free form of an entry name, or `None` if it escapes its container.
pub fn sanitize_entry_name(name: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => return None,
        }
    }

    if clean.as_os_str().is_empty() { None } else { Some(clean) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_escaping_names() {
        assert_eq!(sanitize_entry_name("../ComicInfo.xml"), None);
        assert_eq!(sanitize_entry_name("/etc/passwd"), None);
        assert_eq!(sanitize_entry_name(""), None);
        assert_eq!(sanitize_entry_name("./a/b.xml"), Some(PathBuf::from("a/b.xml")));
    }

    #[test]
    fn hidden_files_start_with_dot() {
        assert!(is_hidden(Path::new("dir/.DS_Store")));
        assert!(!is_hidden(Path::new("ComicInfo.xml")));
    }
}

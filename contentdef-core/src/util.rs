//! Contains a collection of useful utility functions.

use std::fs::{read, File};
use std::hash::Hasher;
use std::io::Read;
use std::path::Path;

use fnv::FnvHasher;

use crate::error::{Error, Result};

/// Reads a whole text file into a string.
pub fn read_text_file(file_path: &Path) -> Result<String> {
    debug!("reading text file: {:?}", file_path);
    let mut fd = File::open(file_path)?;
    let mut content = String::new();
    fd.read_to_string(&mut content)?;
    Ok(content)
}

/// Create a static deser object from given path using serde.
pub fn deser_struct_from_path<T>(file_path: &Path) -> Result<T>
where
    for<'de> T: serde::Deserialize<'de>,
{
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let bytes = read(file_path)?;
    let d: T = match extension.as_str() {
        "toml" => toml::from_slice(&bytes)?,
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yaml::from_slice(&bytes)?,
        _ => {
            return Err(Error::UnsupportedConfigFormat(
                file_path.to_string_lossy().to_string(),
            ))
        }
    };
    Ok(d)
}

/// Normalizes a relative path using forward slashes only.
///
/// `.` segments are dropped and `..` removes the component in front of it.
/// A `..` with nothing left to remove is kept. This is pure string handling,
/// the filesystem is never consulted.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ => parts.push(part),
            },
            _ => parts.push(part),
        }
    }
    parts.join("/")
}

/// Resolves `path` as written inside `file`.
///
/// Paths starting with a slash are relative to the content root, all other
/// paths are relative to the directory holding `file`.
pub fn resolve_path(file: &str, path: &str) -> String {
    if path.starts_with('/') || path.starts_with('\\') {
        return normalize_path(path);
    }
    let file = file.replace('\\', "/");
    match file.rfind('/') {
        Some(idx) => normalize_path(&format!("{}/{}", &file[..idx], path)),
        None => normalize_path(path),
    }
}

/// Joins a path relative to the content root onto the root itself.
pub fn compose_root(root: &Path, relative: &str) -> String {
    let root = root.to_string_lossy().replace('\\', "/");
    let joined = normalize_path(&format!("{}/{}", root, relative));
    if root.starts_with('/') {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// FNV-1a hash of the given string, stable across runs and platforms.
pub fn stable_hash(value: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(value.as_bytes());
    hasher.finish()
}

/// Get a similar name based on string similarity.
pub fn get_similar(original: &str, names: &[&str]) -> Option<String> {
    use strsim::normalized_damerau_levenshtein;
    let mut highest_sim = 0f64;
    let mut best = None;
    for name in names {
        let sim = normalized_damerau_levenshtein(name, original);
        if sim > highest_sim {
            highest_sim = sim;
            best = Some(*name);
        }
    }
    if highest_sim > 0.4f64 {
        best.map(|s| s.to_string())
    } else {
        None
    }
}

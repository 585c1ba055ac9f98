use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::io;

/// Reads a whole text file into memory.
///
/// Line breaks are kept; the tokenizer collapses them anyway.
pub(crate) fn read_corpus<P: AsRef<Path>>(filename: P) -> io::Result<String> {
    let mut contents = String::new();
    File::open(filename)?.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/alice.txt"` → `"alice"`
/// - `"alice.txt"` → `"alice"`
pub(crate) fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
    let stem = input_path
        .as_ref()
        .file_stem()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

    Ok(stem.to_string_lossy().to_string())
}

// src/input/file.rs
// Reads a text file line by line for file mode.

use super::InputError;
use tracing::debug;

// Returns every line of the file with its zero-based index, in file order
//
// Bytes that are not valid UTF-8 are replaced rather than rejected: a stray
// Latin-1 character should not stop us from finding the URLs around it.
pub async fn read_lines(path: &str) -> Result<Vec<(usize, String)>, InputError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| InputError::Io {
        path: path.to_string(),
        source,
    })?;

    let lines: Vec<(usize, String)> = String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .enumerate()
        .collect();

    debug!(path, lines = lines.len(), "read input file");
    Ok(lines)
}

use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Append-only command log: one line per command, no escaping.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    file_path: PathBuf,
}

impl HistoryLog {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Opens, appends and closes the file for every entry.
    pub fn append(&self, entry: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.file_path)?;

        file.write_all(format!("{}\n", entry).as_bytes())
    }

    /// Raw file content, or `None` when nothing has been logged yet.
    pub fn read_all(&self) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(&self.file_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn entries(&self) -> io::Result<Vec<String>> {
        let file = match File::open(&self.file_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                entries.push(line);
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("history.txt"));

        log.append("ls -la").unwrap();
        log.append("echo hi > out.txt").unwrap();

        assert_eq!(
            std::fs::read_to_string(log.path()).unwrap(),
            "ls -la\necho hi > out.txt\n"
        );
        assert_eq!(log.entries().unwrap(), vec!["ls -la", "echo hi > out.txt"]);
    }

    #[test]
    fn test_append_never_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        std::fs::write(&path, "older\n").unwrap();

        let log = HistoryLog::new(path);
        log.append("newer").unwrap();

        assert_eq!(log.read_all().unwrap().unwrap(), b"older\nnewer\n");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("absent.txt"));

        assert!(log.read_all().unwrap().is_none());
        assert!(log.entries().unwrap().is_empty());
    }
}

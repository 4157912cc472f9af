use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::CommandError;

/// Copies everything under `/proc/<pid>/map_files` into `memory_dump_<pid>.txt`.
#[derive(Clone, Debug)]
pub struct SnapshotCommand {
    proc_root: PathBuf,
    output_dir: PathBuf,
}

impl Default for SnapshotCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCommand {
    pub fn new() -> Self {
        Self::with_roots("/proc", ".")
    }

    pub fn with_roots(proc_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_name(pid: u32) -> String {
        format!("memory_dump_{}.txt", pid)
    }

    pub fn parse_pid(arg: &str) -> Result<u32, CommandError> {
        arg.parse()
            .map_err(|_| CommandError::InvalidArguments(format!("invalid pid: {}", arg)))
    }

    /// Returns the path of the written dump.
    pub fn capture(&self, pid: u32) -> Result<PathBuf, CommandError> {
        let source = self.proc_root.join(pid.to_string()).join("map_files");
        let entries = fs::read_dir(&source).map_err(|e| {
            CommandError::ExecutionError(format!("cannot open {}: {}", source.display(), e))
        })?;

        let output = self.output_dir.join(Self::output_name(pid));
        let file = File::create(&output).map_err(|e| {
            CommandError::ExecutionError(format!("cannot create {}: {}", output.display(), e))
        })?;
        let mut out = BufWriter::new(file);

        let mut regions: Vec<PathBuf> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
        regions.sort();

        for region in &regions {
            dump_region(region, &mut out)?;
        }
        out.flush()?;

        debug!(pid, regions = regions.len(), output = %output.display(), "snapshot written");
        Ok(output)
    }
}

fn dump_region(region: &Path, out: &mut impl Write) -> io::Result<()> {
    let mut file = match File::open(region) {
        Ok(file) => file,
        Err(e) => return writeln!(out, "cannot access {}: {}", region.display(), e),
    };

    writeln!(out, "### begin dump: {} ###", region.display())?;
    if let Err(e) = io::copy(&mut file, out) {
        warn!(region = %region.display(), error = %e, "region read interrupted");
        write!(out, "\nread error: {}", e)?;
    }
    writeln!(out, "\n### end dump: {} ###\n", region.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    fn fake_proc(pid: u32) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let map_files = dir.path().join("proc").join(pid.to_string()).join("map_files");
        fs::create_dir_all(&map_files).unwrap();
        (dir, map_files)
    }

    #[test]
    fn test_output_name() {
        assert_eq!(SnapshotCommand::output_name(1234), "memory_dump_1234.txt");
    }

    #[test]
    fn test_parse_pid() {
        assert_eq!(SnapshotCommand::parse_pid("42").unwrap(), 42);
        assert!(SnapshotCommand::parse_pid("abc").is_err());
        assert!(SnapshotCommand::parse_pid("-1").is_err());
    }

    #[test]
    fn test_capture_copies_each_region() {
        let (dir, map_files) = fake_proc(42);
        fs::write(map_files.join("7f00-7f10"), b"first region").unwrap();
        fs::write(map_files.join("7f10-7f20"), b"second region").unwrap();

        let command = SnapshotCommand::with_roots(dir.path().join("proc"), dir.path());
        let output = command.capture(42).unwrap();

        assert_eq!(output, dir.path().join("memory_dump_42.txt"));
        let dump = fs::read_to_string(output).unwrap();
        let first = map_files.join("7f00-7f10");
        assert!(dump.contains(&format!("### begin dump: {} ###\nfirst region\n", first.display())));
        assert!(dump.contains(&format!("### end dump: {} ###", first.display())));
        assert!(dump.contains("second region"));
        assert!(dump.find("first region") < dump.find("second region"));
    }

    #[test]
    fn test_unreadable_region_is_noted_inline() {
        let (dir, map_files) = fake_proc(7);
        symlink(dir.path().join("gone"), map_files.join("7f00-7f10")).unwrap();

        let command = SnapshotCommand::with_roots(dir.path().join("proc"), dir.path());
        let dump = fs::read_to_string(command.capture(7).unwrap()).unwrap();

        assert!(dump.starts_with("cannot access"));
    }

    #[test]
    fn test_missing_process_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let command = SnapshotCommand::with_roots(dir.path(), dir.path());

        assert!(matches!(
            command.capture(999_999),
            Err(CommandError::ExecutionError(_))
        ));
        assert!(!dir.path().join("memory_dump_999999.txt").exists());
    }
}

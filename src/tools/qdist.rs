// qdist.rs - External quartet-distance tool invocation

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use log::warn;

/// Runner for the external quartet-distance executable.
///
/// The tool is invoked as `<exe> <treeA> <treeB>` and prints a tabular
/// report to stdout. Output is captured through the child's own pipe, so
/// concurrent invocations never share an output channel. A hung child is
/// killed once the configured timeout expires and treated like any other
/// tool failure.
#[derive(Debug, Clone)]
pub struct QdistRunner {
    exe_path: PathBuf,
    timeout: Duration,
}

impl QdistRunner {
    pub fn new(exe_path: PathBuf, timeout: Duration) -> Self {
        Self { exe_path, timeout }
    }

    /// Quartet-agreement fraction `q` between two tree files.
    ///
    /// `None` covers every expected failure: the tool cannot be spawned,
    /// exits non-zero, times out, or prints a report the parser rejects.
    pub fn quartet_agreement(&self, tree_a: &Path, tree_b: &Path) -> Option<f64> {
        let mut child = match Command::new(&self.exe_path)
            .arg(tree_a)
            .arg(tree_b)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn quartet tool '{}': {}", self.exe_path.display(), e);
                return None;
            }
        };

        let status = self.wait_with_timeout(&mut child, tree_a, tree_b)?;
        if !status.success() {
            warn!(
                "Quartet tool failed on '{}' vs '{}' ({})",
                tree_a.display(),
                tree_b.display(),
                status
            );
            return None;
        }

        let mut report = String::new();
        child.stdout.take()?.read_to_string(&mut report).ok()?;
        let q = parse_report(&report);
        if q.is_none() {
            warn!(
                "Quartet tool produced a malformed report on '{}' vs '{}'",
                tree_a.display(),
                tree_b.display()
            );
        }
        q
    }

    fn wait_with_timeout(
        &self,
        child: &mut std::process::Child,
        tree_a: &Path,
        tree_b: &Path,
    ) -> Option<std::process::ExitStatus> {
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) => {
                    if start.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        warn!(
                            "Quartet tool timed out after {:?} on '{}' vs '{}'",
                            self.timeout,
                            tree_a.display(),
                            tree_b.display()
                        );
                        return None;
                    }
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(e) => {
                    warn!("Failed to wait for quartet tool: {}", e);
                    return None;
                }
            }
        }
    }
}

/// Parse the quartet tool report: line 2, tab-separated, third-from-last
/// field holds the quartet-agreement fraction.
///
/// Fewer than two lines means the tool reported an error; a short or
/// non-numeric field means the report format is not the expected one.
pub fn parse_report(report: &str) -> Option<f64> {
    let line = report.lines().nth(1)?;
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 3 {
        return None;
    }
    fields[fields.len() - 3].trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_extracts_agreement() {
        let report = "leaves\tquartets\tagree\tdisagree\tunresolved\n\
                      12\t495\t0.8\t99\t0\n";
        assert_eq!(parse_report(report), Some(0.8));
    }

    #[test]
    fn test_parse_report_third_from_last_field() {
        let report = "header\n0\t1\t2\t0.25\tx\ty\n";
        assert_eq!(parse_report(report), Some(0.25));
    }

    #[test]
    fn test_parse_report_short_output() {
        // A single line is the tool's error signature.
        assert_eq!(parse_report("error: no trees\n"), None);
        assert_eq!(parse_report(""), None);
    }

    #[test]
    fn test_parse_report_malformed_field() {
        assert_eq!(parse_report("h\na\tb\tnot-a-number\tc\td\n"), None);
        assert_eq!(parse_report("h\ntoo\tshort\n"), None);
    }

    #[test]
    fn test_missing_executable_yields_none() {
        let runner = QdistRunner::new(
            PathBuf::from("/nonexistent/qdist"),
            Duration::from_secs(5),
        );
        let d = runner.quartet_agreement(Path::new("a.nwk"), Path::new("b.nwk"));
        assert_eq!(d, None);
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let exe = dir.join("qdist.sh");
        std::fs::write(&exe, script).unwrap();
        let mut perms = std::fs::metadata(&exe).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&exe, perms).unwrap();
        exe
    }

    #[cfg(unix)]
    #[test]
    fn test_agreement_from_tool_stdout() {
        let dir = tempfile::TempDir::new().unwrap();
        let exe = fake_tool(dir.path(), "#!/bin/sh\nprintf 'h\\n12\\t495\\t0.8\\t99\\t0\\n'\n");
        let runner = QdistRunner::new(exe, Duration::from_secs(10));
        let q = runner.quartet_agreement(Path::new("a.nwk"), Path::new("b.nwk"));
        assert_eq!(q, Some(0.8));
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_tool_times_out() {
        let dir = tempfile::TempDir::new().unwrap();
        let exe = fake_tool(dir.path(), "#!/bin/sh\nsleep 30\n");
        let runner = QdistRunner::new(exe, Duration::from_millis(200));
        let q = runner.quartet_agreement(Path::new("a.nwk"), Path::new("b.nwk"));
        assert_eq!(q, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_tool_yields_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let exe = fake_tool(dir.path(), "#!/bin/sh\nexit 3\n");
        let runner = QdistRunner::new(exe, Duration::from_secs(10));
        let q = runner.quartet_agreement(Path::new("a.nwk"), Path::new("b.nwk"));
        assert_eq!(q, None);
    }
}

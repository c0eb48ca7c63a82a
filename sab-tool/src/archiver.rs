use anyhow::{Context, Result, anyhow};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Narrow view of the archiver capabilities this tool needs, so the
/// subprocess backend can be swapped out (for tests, or a native
/// format writer) without touching the folder pipeline.
pub trait Archiver {
    /// Member names currently stored in `archive`.
    fn list(&self, archive: &Path) -> Result<BTreeSet<String>>;
    /// Create a fresh archive from `files`, with a member index.
    fn create(&self, archive: &Path, files: &[PathBuf]) -> Result<()>;
    /// Replace or append `files` into an existing archive, refresh its
    /// index, and drop members whose backing file is gone.
    fn update(&self, archive: &Path, files: &[PathBuf]) -> Result<()>;
}

const AR: &str = "ar";

/// The system `ar` binary from binutils, driven as a subprocess.
pub struct SystemAr;

impl SystemAr {
    /// Pre-flight check that `ar` can be spawned at all. Run once before
    /// any folder is touched; a missing binary is fatal for the whole run.
    pub fn ensure_available() -> Result<()> {
        match Command::new(AR).arg("--version").output() {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(anyhow!(
                "'{AR}' utility not found. Please install the binutils package"
            )),
            Err(e) => Err(e).with_context(|| format!("failed to probe for the '{AR}' utility")),
        }
    }

    /// Runs one `ar` invocation, failing with the captured stderr when the
    /// exit status is non-zero.
    fn run_checked<S: AsRef<std::ffi::OsStr>>(
        &self,
        flags: &str,
        archive: &Path,
        extra: &[S],
    ) -> Result<Output> {
        debug!(flags, archive = %archive.display(), args = extra.len(), "invoking {AR}");

        let output = Command::new(AR)
            .arg(flags)
            .arg(archive)
            .args(extra)
            .output()
            .with_context(|| format!("failed to spawn '{AR} {flags} {}'", archive.display()))?;

        if output.status.success() {
            Ok(output)
        } else {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(anyhow!(stderr).context(format!(
                "'{AR} {flags} {}' exited with code {code}",
                archive.display()
            )))
        }
    }
}

impl Archiver for SystemAr {
    fn list(&self, archive: &Path) -> Result<BTreeSet<String>> {
        let output = self.run_checked::<&str>("t", archive, &[])?;
        Ok(parse_member_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    fn create(&self, archive: &Path, files: &[PathBuf]) -> Result<()> {
        self.run_checked("rcs", archive, files)?;
        Ok(())
    }

    fn update(&self, archive: &Path, files: &[PathBuf]) -> Result<()> {
        self.run_checked("rus", archive, files)?;

        // `ar r` never drops anything on its own; members with no backing
        // file left in the folder are deleted so the archive keeps tracking
        // the folder contents.
        let stale = stale_members(&self.list(archive)?, files);
        if !stale.is_empty() {
            debug!(count = stale.len(), "pruning stale members");
            self.run_checked("ds", archive, &stale)?;
        }
        Ok(())
    }
}

/// Splits `ar t` output into a member-name set. Blank lines and
/// surrounding whitespace are dropped.
pub fn parse_member_listing(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Members present in the archive with no corresponding file in the
/// collected set. `ar` stores members under their base name, so the
/// comparison is by base name as well.
fn stale_members(members: &BTreeSet<String>, files: &[PathBuf]) -> Vec<String> {
    let keep: BTreeSet<String> = files
        .iter()
        .filter_map(|f| f.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();
    members
        .iter()
        .filter(|m| !keep.contains(*m))
        .cloned()
        .collect()
}

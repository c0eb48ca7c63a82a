use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Every archive this tool writes starts with this prefix.
pub const ARCHIVE_PREFIX: &str = "xrt_smi_";
/// Extension used for archives; files carrying it are never collected
/// as members.
pub const ARCHIVE_SUFFIX: &str = "a";

/// Derives the archive file name for a folder, e.g. `phx` -> `xrt_smi_phx.a`.
pub fn archive_file_name(folder: &Path) -> Result<String> {
    let base = folder
        .file_name()
        .with_context(|| format!("cannot derive an archive name from {folder:?}"))?
        .to_string_lossy();
    Ok(format!("{ARCHIVE_PREFIX}{base}.{ARCHIVE_SUFFIX}"))
}

/// Full path of a folder's archive. The archive always lives inside the
/// folder it summarizes.
pub fn archive_path(folder: &Path) -> Result<PathBuf> {
    Ok(folder.join(archive_file_name(folder)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_uses_folder_base_name() {
        assert_eq!(
            archive_file_name(Path::new("phx")).unwrap(),
            "xrt_smi_phx.a"
        );
        assert_eq!(
            archive_file_name(Path::new("work/drivers/ve2")).unwrap(),
            "xrt_smi_ve2.a"
        );
    }

    #[test]
    fn archive_lives_inside_its_folder() {
        let path = archive_path(Path::new("work/phx")).unwrap();
        assert_eq!(path, Path::new("work/phx/xrt_smi_phx.a"));
    }

    #[test]
    fn nameless_paths_are_rejected() {
        assert!(archive_file_name(Path::new("/")).is_err());
        assert!(archive_file_name(Path::new("..")).is_err());
    }
}

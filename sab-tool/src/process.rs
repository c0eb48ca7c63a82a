use anyhow::{Context, Result, bail};
use glob::Pattern;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use sab_lib::ArchiveOutcome;

use crate::archiver::Archiver;
use crate::fs_utils::collect_files;
use crate::naming;

/// Builds or refreshes one folder's archive and prints the per-folder
/// report.
///
/// The pipeline is strictly linear: collect eligible files, snapshot the
/// prior archive state, run the archiver, re-list, and report the diff.
/// The only branch is whether the archive already existed, which picks
/// the create or update call and decides how the report reads.
pub fn process_folder(
    ar: &dyn Archiver,
    folder: &Path,
    skip: &[Pattern],
) -> Result<ArchiveOutcome> {
    if !folder.is_dir() {
        bail!("folder {} does not exist", folder.display());
    }

    let files = collect_files(folder, skip)?;
    if files.is_empty() {
        bail!("folder {} has no eligible files", folder.display());
    }
    debug!(folder = %folder.display(), files = files.len(), "collected eligible files");

    let archive = naming::archive_path(folder)?;
    let archive_name = naming::archive_file_name(folder)?;

    // Snapshot the prior state before anything rewrites the archive.
    let existed = archive.is_file();
    let (old_members, prior_mtime) = if existed {
        let mtime = fs::metadata(&archive)
            .and_then(|m| m.modified())
            .with_context(|| format!("reading mtime of {}", archive.display()))?;
        (ar.list(&archive)?, Some(mtime))
    } else {
        (BTreeSet::new(), None)
    };

    // A member counts as updated when it was already archived and its
    // source file is newer than the archive was before this run. This is
    // coarser than what `ar` itself decides to rewrite and exists for
    // reporting only.
    let updated = match prior_mtime {
        Some(mtime) => updated_members(&old_members, &files, mtime)?,
        None => Vec::new(),
    };

    println!(
        "{} {} from {} files...",
        if existed { "Updating" } else { "Creating" },
        archive_name,
        files.len()
    );

    let absolute: Vec<PathBuf> = files
        .iter()
        .map(|f| std::path::absolute(f).with_context(|| format!("resolving {}", f.display())))
        .collect::<Result<_>>()?;

    if existed {
        ar.update(&archive, &absolute)?;
    } else {
        ar.create(&archive, &absolute)?;
    }

    let new_members = ar.list(&archive)?;
    let added: Vec<String> = new_members.difference(&old_members).cloned().collect();
    let removed: Vec<String> = old_members.difference(&new_members).cloned().collect();

    let outcome = ArchiveOutcome {
        archive: archive_name,
        folder: folder.to_path_buf(),
        created: !existed,
        added,
        removed,
        updated,
    };
    print_report(&outcome, &archive);
    Ok(outcome)
}

/// Lists what `process_folder` would do, without touching any archive.
pub fn dry_run(folder: &Path, skip: &[Pattern]) -> Result<()> {
    if !folder.is_dir() {
        bail!("folder {} does not exist", folder.display());
    }

    let files = collect_files(folder, skip)?;
    if files.is_empty() {
        bail!("folder {} has no eligible files", folder.display());
    }

    let archive = naming::archive_path(folder)?;
    let action = if archive.is_file() { "update" } else { "create" };
    println!(
        "Dry run - would {action} {} from {} files",
        naming::archive_file_name(folder)?,
        files.len()
    );
    for f in &files {
        println!("  {}", f.display());
    }
    Ok(())
}

/// Previously archived members whose source file is strictly newer than
/// the archive's pre-run mtime. Compared by base name, since that is how
/// `ar` stores members.
fn updated_members(
    old_members: &BTreeSet<String>,
    files: &[PathBuf],
    archive_mtime: SystemTime,
) -> Result<Vec<String>> {
    let mut updated = BTreeSet::new();
    for file in files {
        let Some(name) = file.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if !old_members.contains(&name) {
            continue;
        }
        let mtime = fs::metadata(file)
            .and_then(|m| m.modified())
            .with_context(|| format!("reading mtime of {}", file.display()))?;
        if mtime > archive_mtime {
            updated.insert(name);
        }
    }
    Ok(updated.into_iter().collect())
}

fn print_report(outcome: &ArchiveOutcome, archive: &Path) {
    if outcome.created {
        println!("✓ Created: {}", archive.display());
        println!("  Members added to new archive ({}):", outcome.added.len());
        for name in &outcome.added {
            println!("    + {name}");
        }
        return;
    }

    println!("✓ Updated: {}", archive.display());
    let categories = [
        (&outcome.added, "+", "New members added"),
        (&outcome.removed, "-", "Members removed"),
        (&outcome.updated, "~", "Members updated"),
    ];
    for (names, symbol, label) in categories {
        if !names.is_empty() {
            println!("  {label} ({}):", names.len());
            for name in names {
                println!("    {symbol} {name}");
            }
        }
    }
    if !outcome.has_changes() {
        println!("  No changes detected");
    }
}

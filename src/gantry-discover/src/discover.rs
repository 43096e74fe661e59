//! Discovery entry point.

use tracing::{debug, info};

use crate::config::DiscoverOptions;
use crate::error::DiscoverResult;
use crate::fs::FileSystem;
use crate::model::PackageModel;
use crate::scanner::PackageScan;
use crate::walker::{TaggedDir, walk};

/// Walk from `options.start_dir` and build one model per tagged directory,
/// in breadth-first order.
///
/// Finding no tagged files is not an error. The first failure aborts the run.
pub fn discover(
    fs: &dyn FileSystem,
    options: &DiscoverOptions,
) -> DiscoverResult<Vec<PackageModel>> {
    let dirs = walk(fs, &options.start_dir, &options.walk_options())?;
    if dirs.is_empty() {
        info!(
            "No files tagged '{}' under {:?}",
            options.build_tag, options.start_dir
        );
        return Ok(Vec::new());
    }

    dirs.into_iter().map(build_package).collect()
}

/// Scan and assemble a single tagged directory.
pub fn build_package(dir: TaggedDir) -> DiscoverResult<PackageModel> {
    debug!("Building package in {:?} ({} files)", dir.path, dir.files.len());
    let mut scan = PackageScan::new(dir.path);
    for file in &dir.files {
        scan.scan_file(file)?;
    }
    scan.finish()
}

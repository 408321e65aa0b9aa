// utils/health.rs

use std::path::Path;

use tracing::{
    debug,
    error,
    info,
    warn,
};

use crate::server::{
    assets::{
        INDEX,
        SCRIPT,
    },
    core::UPLOAD_FILE,
};

#[derive(Copy, Clone)]
enum CheckKind {
    Required,
    Recommended,
}

/// Something the site directory should have, used for checking health
struct Check {
    kind:    CheckKind,
    name:    &'static str,
    /// The message to display if the check fails
    message: &'static str,
    test:    fn(&Path, &str) -> bool,
}

impl Check {
    /// Runs the check, logging if it fails
    fn check(&self, site_dir: &Path) -> bool {
        debug!("Checking '{}' in {site_dir:?}", self.name);
        let ok = (self.test)(site_dir, self.name);
        if !ok {
            match self.kind {
                | CheckKind::Required => {
                    error!("Required check '{}' failed", self.name);
                    error!("{}", self.message);
                },
                | CheckKind::Recommended => {
                    warn!("Recommended check '{}' failed", self.name);
                    warn!("{}", self.message);
                },
            }
        }
        ok
    }
}

fn is_file(dir: &Path, name: &str) -> bool { dir.join(name).is_file() }

fn is_writable(dir: &Path, name: &str) -> bool {
    let path = dir.join(name);
    if path.exists() {
        return std::fs::OpenOptions::new().append(true).open(&path).is_ok()
    }
    tempfile::tempfile_in(dir).is_ok()
}

const CHECKS: &[Check] = &[
    Check {
        kind:    CheckKind::Required,
        name:    INDEX,
        message: "The server cannot start without its upload form",
        test:    is_file,
    },
    Check {
        kind:    CheckKind::Required,
        name:    SCRIPT,
        message: "The server cannot start without its script",
        test:    is_file,
    },
    Check {
        kind:    CheckKind::Recommended,
        name:    UPLOAD_FILE,
        message: "Uploads will fail to save",
        test:    is_writable,
    },
];

/// # Checks the site directory
///
/// Returns the number of failed checks that matter
pub fn check_health<P: AsRef<Path>>(site_dir: P) -> u8 {
    let site_dir = site_dir.as_ref();
    info!("Checking health of {site_dir:?}");
    let mut n = 0;

    for check in CHECKS {
        if !check.check(site_dir) {
            n += 1
        }
    }

    if n == 0 {
        info!("Site directory looks healthy")
    } else {
        warn!("Site directory has problems")
    }

    n
}

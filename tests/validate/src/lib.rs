use std::path::PathBuf;
use std::sync::Once;

use alog_region::{reserve_block, Clock, LogRegion, Severity, Stage, TickVTable, Writer, HEADER_LEN};
use tempfile::TempDir;

/// A command for the dump binary, built on first use.
///
/// Running the tests alone does not build the binaries of sibling packages, so
/// the first caller triggers that build explicitly before resolving the path.
pub fn dump_command() -> assert_cmd::Command {
    static BUILD: Once = Once::new();
    BUILD.call_once(|| {
        let status = std::process::Command::new(env!("CARGO"))
            .args(["build", "--package", "alog-dump"])
            .current_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/../.."))
            .status()
            .expect("failed to run cargo");
        assert!(status.success(), "failed to build the dump binary");
    });

    assert_cmd::Command::cargo_bin("alog-dump").expect("the dump binary was just built")
}

pub struct Env {
    dir: TempDir,
}

impl Env {
    pub fn new() -> Self {
        Env {
            dir: tempfile::tempdir().expect("failed to create a scratch directory"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a region image under `name`: a live region of `capacity` data bytes
    /// holding `entries`, captured the way a firmware capture tool would.
    pub fn image_with(
        &self,
        name: &str,
        capacity: usize,
        entries: &[(Severity, Stage, &[u8])],
    ) -> PathBuf {
        let region = LogRegion::init(reserve_block(HEADER_LEN + capacity), 0)
            .expect("capacity leaves room for the header");
        let clock = Clock::from_vtable(TickVTable { ticks: || 1_000 });

        for &(severity, stage, payload) in entries {
            Writer::new(region, stage, clock.clone()).write(severity, payload);
        }

        let path = self.path(name);
        std::fs::write(&path, region.image()).expect("scratch directory is writable");
        path
    }
}

impl Default for Env {
    fn default() -> Self {
        Env::new()
    }
}

//! Shared fixtures for the update cycle tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::Compression;
use flate2::write::GzEncoder;
use selfup_updater::{
    DownloadProgress, InstallerTiming, Launcher, PathAnchor, Result, UpdateChannel,
    UpdateDescriptor, UpdateRepository, UpdaterConfig, Version,
    steps::script::InstallerScript,
};
use serde_json::json;

/// Writes a `.tar.gz` with the given files and returns its size.
pub fn write_archive(path: &Path, files: &[(&str, &[u8])]) -> u64 {
    let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, name, *contents).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
    fs::metadata(path).unwrap().len()
}

/// A profile directory with the anchors pointing into it.
pub struct Profile {
    pub temp: tempfile::TempDir,
    pub config: UpdaterConfig,
}

impl Profile {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let home = temp.path().join("home");
        let scratch = temp.path().join("scratch");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&scratch).unwrap();

        let config = UpdaterConfig::new(
            PathAnchor::new("SELFUP_TEST_HOME", &home),
            PathAnchor::new("SELFUP_TEST_TMP", &scratch),
            "my_app",
        )
        .unwrap()
        .with_entry_point("main.exe")
        .with_progress_delay(Duration::ZERO)
        .with_handoff_settle(Duration::ZERO)
        .with_timing(InstallerTiming {
            initial_wait: Duration::ZERO,
            attempts: 1,
            ..InstallerTiming::default()
        });

        Self { temp, config }
    }

    /// Install directory holding the "running" version.
    pub fn install_current(&self) -> PathBuf {
        let install = self.config.install_dir().resolve();
        fs::create_dir_all(&install).unwrap();
        fs::write(install.join("main.exe"), b"version 1").unwrap();
        install
    }

    pub fn archive_path(&self) -> PathBuf {
        self.temp.path().join("my_app-2.0.0.tar.gz")
    }
}

pub fn descriptor(archive: &Path, length: u64) -> UpdateDescriptor {
    UpdateDescriptor {
        version: Version::new(2, 0, 0),
        archive_name: archive.file_name().unwrap().to_string_lossy().into_owned(),
        length,
        custom: Some(json!({"changes": ["Faster startup", "New icon"]})),
        locator: format!("file://{}", archive.display()),
        digest: None,
    }
}

/// Repository serving one prepared archive.
pub struct FakeRepository {
    pub update: Option<UpdateDescriptor>,
    pub archive: PathBuf,
    pub downloads: u32,
    pub channels: Vec<UpdateChannel>,
}

impl FakeRepository {
    pub fn serving(archive: PathBuf, length: u64) -> Self {
        Self {
            update: Some(descriptor(&archive, length)),
            archive,
            downloads: 0,
            channels: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            update: None,
            archive: PathBuf::new(),
            downloads: 0,
            channels: Vec::new(),
        }
    }
}

impl UpdateRepository for FakeRepository {
    fn check_for_updates(&mut self, channel: UpdateChannel) -> Result<Option<UpdateDescriptor>> {
        self.channels.push(channel);
        Ok(self.update.clone())
    }

    fn download(
        &mut self,
        update: &UpdateDescriptor,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<PathBuf> {
        self.downloads += 1;
        progress(DownloadProgress::new(update.length / 2, update.length));
        progress(DownloadProgress::new(update.length, update.length));
        Ok(self.archive.clone())
    }
}

/// Records launches instead of spawning processes.
#[derive(Default)]
pub struct RecordingLauncher {
    pub launches: RefCell<Vec<(PathBuf, Vec<String>)>>,
}

impl Launcher for RecordingLauncher {
    fn launch_detached(&self, script: &InstallerScript, anchors: &[&PathAnchor]) -> Result<()> {
        let vars = anchors.iter().map(|a| a.var().to_string()).collect();
        self.launches.borrow_mut().push((script.path.clone(), vars));
        Ok(())
    }
}

//! # wslbash Shared-Read File Access (`common::fs::shared`)
//!
//! File: cli/src/common/fs/shared.rs
//! Author: Christi Mahu
//!
//! The relay reads the staging file while the interpreter is still appending
//! to it. On Windows the default share mode of `std::fs::File::open` would
//! refuse to coexist with a writer, so the reader explicitly allows
//! concurrent read, write and delete access. Unix has no mandatory share
//! modes and a plain read-only open suffices.
//!
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

#[cfg(windows)]
const FILE_SHARE_READ: u32 = 0x0000_0001;
#[cfg(windows)]
const FILE_SHARE_WRITE: u32 = 0x0000_0002;
#[cfg(windows)]
const FILE_SHARE_DELETE: u32 = 0x0000_0004;

/// Opens `path` read-only without conflicting with a concurrent writer.
pub fn open_shared_read(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        options.share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE);
    }
    options.open(path)
}

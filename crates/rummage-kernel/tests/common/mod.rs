//! Shared fixtures for the integration tests: instrumented filesystems
//! and seeded trees.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rummage_kernel::vfs::{DirEntry, Filesystem, MemoryFs, Metadata};
use rummage_kernel::{Host, TrustLevel};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fresh, empty directory under the system temp dir.
pub fn temp_dir(tag: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("rummage-{tag}-{}-{}", std::process::id(), id));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Counts every host call made through it.
#[derive(Debug, Default)]
pub struct CountingFs {
    inner: MemoryFs,
    pub calls: AtomicUsize,
    pub lists: AtomicUsize,
}

impl CountingFs {
    pub fn new(inner: MemoryFs) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Filesystem for CountingFs {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.hit();
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.hit();
        self.inner.write(path, data).await
    }

    async fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.hit();
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list(path).await
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        self.hit();
        self.inner.stat(path).await
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        self.hit();
        self.inner.mkdir(path).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.hit();
        self.inner.remove(path).await
    }

    fn read_only(&self) -> bool {
        self.inner.read_only()
    }
}

/// Listing misbehaviour injected per directory.
#[derive(Debug, Default)]
pub struct Faults {
    /// `list` fails with an I/O error after a short delay.
    pub broken: HashSet<PathBuf>,
    /// `list` never completes.
    pub stalled: HashSet<PathBuf>,
    /// `stat` reports not-found although the parent lists the entry.
    pub vanished: HashSet<PathBuf>,
}

/// Memory filesystem with injected faults, tracking stalled listings.
#[derive(Debug)]
pub struct FaultyFs {
    inner: MemoryFs,
    faults: Faults,
    pub stalls_entered: AtomicUsize,
    pub stalls_dropped: AtomicUsize,
}

impl FaultyFs {
    pub fn new(inner: MemoryFs, faults: Faults) -> Arc<Self> {
        Arc::new(Self {
            inner,
            faults,
            stalls_entered: AtomicUsize::new(0),
            stalls_dropped: AtomicUsize::new(0),
        })
    }
}

/// Counts the drop of a listing that was still waiting.
struct StallGuard<'a>(&'a AtomicUsize);

impl Drop for StallGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Filesystem for FaultyFs {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.inner.write(path, data).await
    }

    async fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        if self.faults.broken.contains(path) {
            tokio::time::sleep(Duration::from_millis(20)).await;
            return Err(io::Error::other("listing failed"));
        }
        if self.faults.stalled.contains(path) {
            self.stalls_entered.fetch_add(1, Ordering::SeqCst);
            let _guard = StallGuard(&self.stalls_dropped);
            std::future::pending::<()>().await;
        }
        self.inner.list(path).await
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        if self.faults.vanished.contains(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "vanished"));
        }
        self.inner.stat(path).await
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        self.inner.mkdir(path).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.inner.remove(path).await
    }

    fn read_only(&self) -> bool {
        self.inner.read_only()
    }
}

/// A host over a shared instrumented filesystem.
pub fn host_over(fs: Arc<dyn Filesystem>, trust: TrustLevel) -> Host {
    Host::with_shared_fs(fs, trust, "/project")
}

/// `a.txt`, `b.png`, `sub/c.txt`.
pub fn small_tree() -> MemoryFs {
    let fs = MemoryFs::new();
    fs.insert_file("a.txt", "a").unwrap();
    fs.insert_file("b.png", "b").unwrap();
    fs.insert_file("sub/c.txt", "c").unwrap();
    fs
}

/// A game-like layout with packaged assets and nested directories.
pub fn game_tree() -> MemoryFs {
    let fs = MemoryFs::new();
    for file in [
        "www/index.html",
        "www/audio/bgm/Theme1.ogg",
        "www/audio/bgm/Theme2.ogg_",
        "www/audio/se/Cursor1.ogg",
        "www/audio/se/readme.txt",
        "www/img/titles1/Castle.png",
        "www/img/titles1/Castle.png_",
        "www/img/faces/Actor1.png",
        "www/movies/Opening.webm",
        "www/movies/Ending.mp4",
        "www/data/Actors.json",
        "www/data/Map001.json",
        "www/data/notes.txt",
    ] {
        fs.insert_file(file, file.as_bytes()).unwrap();
    }
    fs.insert_dir("www/save").unwrap();
    fs
}

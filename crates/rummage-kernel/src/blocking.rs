//! Blocking forms of entity operations.
//!
//! `dir.blocking().get_all(..)` returns the same [`OpResult`] that
//! `dir.get_all(..).await` resolves to. The call drives the future to
//! completion through [`bridge::wait`], so it may be used from plain
//! synchronous code as well as from inside a tokio runtime.

use std::ops::Deref;

use rummage_types::Status;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::bridge;
use crate::directory::{Directory, FindOptions, ListOptions};
use crate::entity::{Entity, Node};
use crate::error::{FsError, OpResult};
use crate::file::{Content, FileHandle, ReadOptions, WriteOptions};
use crate::loader::ResourceLoader;
use crate::template::MediaCategory;
use crate::vfs::Metadata;

/// A borrowed entity whose operations block.
#[derive(Debug)]
pub struct Blocking<'a, E> {
    entity: &'a E,
}

impl<'a, E> Blocking<'a, E> {
    pub(crate) fn new(entity: &'a E) -> Self {
        Self { entity }
    }
}

impl<E: Deref<Target = Node> + Sync> Blocking<'_, E> {
    pub fn exists(&self) -> Result<bool, FsError> {
        bridge::block_on(self.entity.exists())
    }

    pub fn is_file(&self) -> Result<bool, FsError> {
        bridge::block_on(self.entity.is_file())
    }

    pub fn is_directory(&self) -> Result<bool, FsError> {
        bridge::block_on(self.entity.is_directory())
    }

    pub fn metadata(&self) -> Result<Metadata, FsError> {
        bridge::block_on(self.entity.metadata())?
    }
}

impl Blocking<'_, Directory> {
    pub fn get_all(&self, options: Option<&ListOptions>) -> OpResult<Vec<Entity>> {
        bridge::wait(self.entity.get_all(options))
    }

    pub fn get_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        bridge::wait(self.entity.get_files(options))
    }

    pub fn get_directories(&self, options: Option<&ListOptions>) -> OpResult<Vec<Directory>> {
        bridge::wait(self.entity.get_directories(options))
    }

    pub fn get_category(&self, category: MediaCategory, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        bridge::wait(self.entity.get_category(category, options))
    }

    pub fn get_audio_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Audio, options)
    }

    pub fn get_image_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Image, options)
    }

    pub fn get_video_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Video, options)
    }

    pub fn get_json_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Json, options)
    }

    pub fn get_txt_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Text, options)
    }

    /// Runs the whole walk before returning.
    pub fn find_files(&self, options: Option<&FindOptions>) -> OpResult<Vec<FileHandle>> {
        bridge::wait(self.entity.find_files(options))
    }

    pub fn find_directories(&self, options: Option<&FindOptions>) -> OpResult<Vec<Directory>> {
        bridge::wait(self.entity.find_directories(options))
    }

    pub fn create(&self) -> OpResult<()> {
        bridge::wait(self.entity.create())
    }

    pub fn create_directory(&self, name: &str) -> OpResult<Directory> {
        bridge::wait(self.entity.create_directory(name))
    }

    pub fn remove(&self) -> OpResult<()> {
        bridge::wait(self.entity.remove())
    }
}

impl Blocking<'_, FileHandle> {
    pub fn read(&self, options: Option<&ReadOptions>) -> OpResult<Content> {
        bridge::wait(self.entity.read(options))
    }

    pub fn read_json<T>(&self, options: Option<&ReadOptions>) -> OpResult<T>
    where
        T: DeserializeOwned + Send,
    {
        bridge::wait(self.entity.read_json(options))
    }

    pub fn write(&self, data: &[u8], options: Option<&WriteOptions>) -> OpResult<()> {
        bridge::wait(self.entity.write(data, options))
    }

    pub fn write_json<T>(&self, value: &T, options: Option<&WriteOptions>) -> OpResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        bridge::wait(self.entity.write_json(value, options))
    }

    pub fn remove(&self) -> OpResult<()> {
        bridge::wait(self.entity.remove())
    }

    pub fn load_image<L: ResourceLoader>(&self, loader: &L) -> OpResult<L::Media> {
        bridge::wait(self.entity.load_image(loader))
    }

    pub fn load_audio<L: ResourceLoader>(&self, loader: &L) -> OpResult<L::Media> {
        bridge::wait(self.entity.load_audio(loader))
    }
}

/// Blocking form of a callback-style starter: run it and wait for the
/// callback it settles.
///
/// A synchronous refusal (`MISSING_OPTIONS`, `NOT_PERMITTED`, ...) comes
/// back as an envelope carrying that status.
pub fn settle<T, S>(start: S) -> OpResult<T>
where
    T: Send + 'static,
    S: FnOnce(bridge::Callbacks<T>) -> Status + Send,
{
    bridge::wait(bridge::promisify(start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Host, TrustLevel};
    use crate::vfs::MemoryFs;

    fn host() -> Host {
        let fs = MemoryFs::new();
        fs.insert_file("www/data/Actors.json", "[]").unwrap();
        fs.insert_file("www/img/pictures/cg1.png", "png").unwrap();
        Host::new(fs, TrustLevel::Local, "/game")
    }

    #[test]
    fn blocking_from_sync_code() {
        let host = host();
        let www = host.directory("www");
        let env = www.blocking().get_directories(Some(&ListOptions::new())).unwrap();
        let names: Vec<_> = env
            .into_data()
            .unwrap()
            .iter()
            .map(|d| d.full_name().to_string())
            .collect();
        assert_eq!(names, ["data", "img"]);
        assert!(www.blocking().is_directory().unwrap());
    }

    #[tokio::test]
    async fn blocking_inside_a_runtime() {
        let host = host();
        let env = host
            .directory("www")
            .blocking()
            .find_files(Some(&FindOptions::new().search_limit(10)))
            .unwrap();
        assert_eq!(env.data().map(Vec::len), Some(2));
    }

    #[test]
    fn settle_waits_for_callback_form() {
        let host = host();
        let www = host.directory("www");
        let env = settle(|callbacks| www.get_all_with(Some(ListOptions::new()), callbacks)).unwrap();
        assert_eq!(env.data().map(Vec::len), Some(2));

        let env = settle(|callbacks| www.get_all_with(None, callbacks)).unwrap();
        assert_eq!(env.status_code(), Status::MissingOptions);
    }
}

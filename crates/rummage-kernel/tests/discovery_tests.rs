//! Enumeration, typed discovery and bounded search against seeded trees.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{CountingFs, game_tree, host_over, small_tree};
use rstest::rstest;
use rummage_kernel::vfs::{Filesystem, MemoryFs};
use rummage_kernel::{
    Callbacks, Directory, Entity, FindOptions, Host, ListOptions, MediaCategory, Status, Template,
    TrustLevel,
};

fn host(fs: MemoryFs) -> Host {
    Host::new(fs, TrustLevel::Local, "/project")
}

fn paths<E: std::ops::Deref<Target = rummage_kernel::Node>>(items: &[E]) -> BTreeSet<String> {
    items.iter().map(|e| e.full_path().to_string()).collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn find_files_with_limit_two_reaches_one_level_down() {
    let host = host(small_tree());
    let options = FindOptions::new()
        .template(Template::pattern(r"\.txt$").unwrap())
        .search_limit(2);

    let env = host.directory(".").find_files(Some(&options)).await.unwrap();
    assert_eq!(env.status_code(), Status::Ok);
    assert_eq!(paths(env.data().unwrap()), set(&["a.txt", "sub/c.txt"]));
}

#[tokio::test]
async fn limit_one_returns_matching_direct_children_only() {
    let host = host(game_tree());
    let options = FindOptions::new().template(Template::pattern(r"^[a-z]").unwrap());

    let found = host
        .directory("www")
        .find_files(Some(&options))
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(paths(&found), set(&["www/index.html"]));
}

#[tokio::test]
async fn empty_root_yields_empty_ok() {
    let fs = MemoryFs::new();
    fs.insert_dir("empty").unwrap();
    let host = host(fs);

    let env = host
        .directory("empty")
        .find_directories(Some(&FindOptions::new().search_limit(50)))
        .await
        .unwrap();
    assert!(env.is_ok());
    assert_eq!(env.data().map(Vec::len), Some(0));
}

#[rstest]
#[case::one(1)]
#[case::two(2)]
#[case::three(3)]
#[case::five(5)]
#[case::plenty(100)]
#[tokio::test]
async fn find_directories_examines_at_most_limit(#[case] limit: usize) {
    let fs = CountingFs::new(game_tree());
    let host = host_over(fs.clone(), TrustLevel::Local);

    let env = host
        .directory("www")
        .find_directories(Some(&FindOptions::new().search_limit(limit)))
        .await
        .unwrap();
    assert!(env.is_ok());
    // www + audio, bgm, se, img, titles1, faces, movies, data, save
    assert_eq!(fs.lists(), limit.min(10));
}

#[tokio::test]
async fn find_directories_collects_matches_beyond_non_matching_parents() {
    let host = host(game_tree());
    let options = FindOptions::new()
        .template(Template::pattern("^(se|faces)$").unwrap())
        .search_limit(100);

    let found = host
        .directory("www")
        .find_directories(Some(&options))
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(paths(&found), set(&["www/audio/se", "www/img/faces"]));
}

#[tokio::test]
async fn files_and_directories_partition_get_all() {
    let host = host(game_tree());
    let www = host.directory("www");
    let options = ListOptions::new();

    let all = www.get_all(Some(&options)).await.unwrap().into_data().unwrap();
    let files = www.get_files(Some(&options)).await.unwrap().into_data().unwrap();
    let dirs = www.get_directories(Some(&options)).await.unwrap().into_data().unwrap();

    assert_eq!(files.len() + dirs.len(), all.len());
    let mut union = paths(&files);
    union.extend(paths(&dirs));
    assert_eq!(union, paths(&all));
    assert!(paths(&files).is_disjoint(&paths(&dirs)));
}

#[rstest]
#[case::audio(MediaCategory::Audio, "www/audio/bgm", &["www/audio/bgm/Theme1.ogg", "www/audio/bgm/Theme2.ogg_"])]
#[case::audio_skips_text(MediaCategory::Audio, "www/audio/se", &["www/audio/se/Cursor1.ogg"])]
#[case::image(MediaCategory::Image, "www/img/titles1", &["www/img/titles1/Castle.png", "www/img/titles1/Castle.png_"])]
#[case::video(MediaCategory::Video, "www/movies", &["www/movies/Ending.mp4", "www/movies/Opening.webm"])]
#[case::json(MediaCategory::Json, "www/data", &["www/data/Actors.json", "www/data/Map001.json"])]
#[case::txt(MediaCategory::Text, "www/data", &["www/data/notes.txt"])]
#[case::no_directories(MediaCategory::Json, "www", &[])]
#[tokio::test]
async fn typed_discovery(#[case] category: MediaCategory, #[case] dir: &str, #[case] expected: &[&str]) {
    let host = host(game_tree());
    let files = host
        .directory(dir)
        .get_category(category, Some(&ListOptions::new()))
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(paths(&files), set(expected));
}

#[tokio::test]
async fn typed_helpers_match_their_category() {
    let host = host(game_tree());
    let bgm = host.directory("www/audio/bgm");
    let options = ListOptions::new();

    let via_helper = bgm.get_audio_files(Some(&options)).await.unwrap();
    let via_category = bgm.get_category(MediaCategory::Audio, Some(&options)).await.unwrap();
    assert_eq!(via_helper, via_category);
}

#[tokio::test]
async fn get_all_without_trust_leaves_host_untouched() {
    let fs = CountingFs::new(game_tree());
    let host = host_over(fs.clone(), TrustLevel::Sandboxed);

    let env = host.directory("www").get_all(Some(&ListOptions::new())).await.unwrap();
    assert_eq!(env.status_code(), Status::NotPermitted);
    assert!(env.data().is_none());
    assert_eq!(fs.calls(), 0);
}

#[tokio::test]
async fn missing_options_takes_precedence() {
    let fs = CountingFs::new(MemoryFs::new());
    let host = host_over(fs.clone(), TrustLevel::Sandboxed);

    // Neither options, nor trust, nor the path: options are checked first.
    let env = host.directory("nowhere").get_all(None).await.unwrap();
    assert_eq!(env.status_code(), Status::MissingOptions);

    let status = host.directory("nowhere").get_all_with(None, Callbacks::new());
    assert_eq!(status, Status::MissingOptions);

    // With options, trust is next; then the callback; only then the path.
    let status = host
        .directory("nowhere")
        .get_all_with(Some(ListOptions::new()), Callbacks::new());
    assert_eq!(status, Status::NotPermitted);

    let local = host.with_trust(TrustLevel::Local);
    let status = local
        .directory("nowhere")
        .get_all_with(Some(ListOptions::new()), Callbacks::new());
    assert_eq!(status, Status::MissingCallback);
    assert_eq!(fs.calls(), 0);
}

#[tokio::test]
async fn missing_callback_is_synchronous_and_silent() {
    let fs = CountingFs::new(game_tree());
    let host = host_over(fs.clone(), TrustLevel::Local);
    let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = fired.clone();

    let callbacks = Callbacks::<Vec<Entity>>::new().on_failure(move |_| {
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
    });
    let status = host.directory("www").get_all_with(Some(ListOptions::new()), callbacks);
    assert_eq!(status, Status::MissingCallback);

    tokio::task::yield_now().await;
    assert_eq!(fs.calls(), 0);
    assert!(!fired.load(std::sync::atomic::Ordering::SeqCst));
}

#[tokio::test]
async fn nonexistent_path_reports_before_mutating() {
    let fs = CountingFs::new(game_tree());
    let host = host_over(fs.clone(), TrustLevel::Local);

    let env = host.directory("www/nowhere").create_directory("child").await.unwrap();
    assert_eq!(env.status_code(), Status::PathNotFound);
    assert!(!fs.exists(std::path::Path::new("www/nowhere/child")).await);

    let env = host.directory("www/nowhere").remove().await.unwrap();
    assert_eq!(env.status_code(), Status::PathNotFound);

    let env = host
        .directory("www/nowhere")
        .find_files(Some(&FindOptions::new().search_limit(4)))
        .await
        .unwrap();
    assert_eq!(env.status_code(), Status::PathNotFound);
}

#[tokio::test]
async fn removing_non_empty_directory_leaves_tree_intact() {
    let host = host(game_tree());
    let data = host.directory("www/data");
    let before = data.get_all(Some(&ListOptions::new())).await.unwrap();

    let env = data.remove().await.unwrap();
    assert_eq!(env.status_code(), Status::NotEmpty);

    let after = data.get_all(Some(&ListOptions::new())).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn save_slots_lifecycle() {
    let host = host(game_tree());
    let save = host.directory("www/save");

    let slot: Directory = save.create_directory("slot1").await.unwrap().into_data().unwrap();
    assert!(slot.is_directory().await);
    assert_eq!(slot.parent(), save);

    assert!(slot.remove().await.unwrap().is_ok());
    assert!(save.remove().await.unwrap().is_ok());
    assert!(!save.exists().await);
}

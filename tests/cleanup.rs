#[path = "common/mod.rs"]
mod common;

use common::*;
use rharvest::{AllowList, Cleaner, RemovalLog, RemovalReason, RetentionRule};
use std::fs;

/// Demonstrates the content rule over three post directories:
/// - `0001_blank` has whitespace-only selftext and no image;
/// - `0002_text` has selftext, `0003_image` has an image file.
/// Outcome: only the blank one is removed, with its title in the report.
#[test]
fn has_content_keeps_text_and_image_posts() {
    let root = tempfile::tempdir().unwrap();
    let root = root.path();
    make_post_dir(root, "0001_blank", "   ", None);
    make_post_dir(root, "0002_text", "hello", None);
    make_post_dir(root, "0003_image", "", Some("image.png"));

    let report = Cleaner::new(root, RetentionRule::HasContent).run().unwrap();
    assert_eq!(report.visited, 3);
    assert_eq!(report.kept, 2);
    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.removed[0].dir, "0001_blank");
    assert_eq!(report.removed[0].reason, RemovalReason::NoContent);
    assert_eq!(report.removed[0].title, "title 0001_blank");
    assert!(report.removed_bytes > 0);

    assert!(!root.join("0001_blank").exists());
    assert!(root.join("0002_text").exists());
    assert!(root.join("0003_image").exists());
}

/// The image file on disk decides, not the `has_image` flag.
#[test]
fn has_image_flag_without_file_is_removed() {
    let root = tempfile::tempdir().unwrap();
    let dir = make_post_dir(root.path(), "0001_lost_image", "", Some("image.png"));
    fs::remove_file(dir.join("image.png")).unwrap();

    let report = Cleaner::new(root.path(), RetentionRule::HasContent).run().unwrap();
    assert_eq!(report.removed.len(), 1);
    assert!(!dir.exists());
}

/// Broken or missing `post_data.json` removes the directory under both rules,
/// even when the allow-list names it or an image is present.
#[test]
fn unreadable_metadata_is_removed_under_either_rule() {
    for rule in [
        RetentionRule::HasContent,
        RetentionRule::AllowList(AllowList::from_dirs(["0001_broken"])),
    ] {
        let root = tempfile::tempdir().unwrap();
        let broken = root.path().join("0001_broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("post_data.json"), "{ truncated").unwrap();
        fs::write(broken.join("image.jpg"), [0xFF, 0xD8, 0xFF, 0x00]).unwrap();
        let empty = root.path().join("0002_empty");
        fs::create_dir_all(&empty).unwrap();

        let report = Cleaner::new(root.path(), rule).run().unwrap();
        assert_eq!(report.kept, 0);
        assert!(report.removed.iter().all(|e| e.reason == RemovalReason::UnreadableMetadata));
        assert!(!broken.exists());
        assert!(!empty.exists());
    }
}

/// Demonstrates the allow-list rule:
/// - the list names `0001_safe` only (extra entry fields are ignored);
/// - `0002_unsafe` has both text and an image.
/// Outcome: content does not matter; only the listed directory survives.
#[test]
fn allow_list_keeps_only_listed_dirs() {
    let root = tempfile::tempdir().unwrap();
    make_post_dir(root.path(), "0001_safe", "", None);
    make_post_dir(root.path(), "0002_unsafe", "lots of text", Some("image.png"));

    let list_path = root.path().join("safe_posts.json");
    fs::write(&list_path, r#"{"posts":[{"dir":"0001_safe","note":"reviewed"}]}"#).unwrap();
    let list = AllowList::load(&list_path).unwrap();
    assert_eq!(list.len(), 1);

    let posts = root.path().join("posts");
    fs::create_dir_all(&posts).unwrap();
    fs::rename(root.path().join("0001_safe"), posts.join("0001_safe")).unwrap();
    fs::rename(root.path().join("0002_unsafe"), posts.join("0002_unsafe")).unwrap();

    let report = Cleaner::new(&posts, RetentionRule::AllowList(list)).run().unwrap();
    assert_eq!(report.kept, 1);
    assert_eq!(report.removed[0].dir, "0002_unsafe");
    assert_eq!(report.removed[0].reason, RemovalReason::NotAllowListed);
    assert!(posts.join("0001_safe").exists());
    assert!(!posts.join("0002_unsafe").exists());
}

/// A missing allow-list file is an error naming the path, never an empty list.
#[test]
fn missing_allow_list_is_an_error() {
    let root = tempfile::tempdir().unwrap();
    let err = AllowList::load(&root.path().join("nope.json")).unwrap_err();
    assert!(format!("{err:#}").contains("nope.json"));
}

/// The removal log records each removed directory with a snake_case reason,
/// the count and the bytes left behind.
#[test]
fn removal_log_lists_removed_dirs() {
    let root = tempfile::tempdir().unwrap();
    let posts = root.path().join("posts");
    make_post_dir(&posts, "0001_blank", "", None);
    make_post_dir(&posts, "0002_text", "kept", None);

    let report = Cleaner::new(&posts, RetentionRule::HasContent).run().unwrap();
    let log_path = root.path().join("removal_log.json");
    report.write_log(&log_path).unwrap();

    let log: RemovalLog = serde_json::from_slice(&fs::read(&log_path).unwrap()).unwrap();
    assert_eq!(log.count, 1);
    assert_eq!(log.removed[0].dir, "0001_blank");
    assert_eq!(log.remaining_bytes, report.remaining_bytes);
    assert!(!log.generated_at.is_empty());

    let raw: serde_json::Value = serde_json::from_slice(&fs::read(&log_path).unwrap()).unwrap();
    assert_eq!(raw["removed"][0]["reason"], "no_content");
}

/// Cleaning a posts root that does not exist visits nothing.
#[test]
fn missing_root_is_an_empty_pass() {
    let root = tempfile::tempdir().unwrap();
    let report = Cleaner::new(root.path().join("absent"), RetentionRule::HasContent).run().unwrap();
    assert_eq!(report.visited, 0);
    assert!(report.removed.is_empty());
}

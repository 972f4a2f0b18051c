#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Write a compressed `.zst` file containing the provided JSONL lines.
/// Mirrors the monthly RS_/RC_ dumps but with tiny content.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Read a text file line-by-line into strings (skips empty lines).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}

/// Read a JSONL file into `serde_json::Value`s.
pub fn read_jsonl_values(path: &Path) -> Vec<Value> {
    read_lines(path).iter().map(|s| serde_json::from_str(s).unwrap()).collect()
}

/// A submission line with the fields the pipeline cares about.
pub fn submission(id: &str, sub: &str, score: i64, title: &str, selftext: &str, url: &str) -> String {
    json!({
        "id": id, "title": title, "score": score, "subreddit": sub, "url": url,
        "selftext": selftext, "author": "bob", "created_utc": 1672531200,
        "num_comments": 3, "over_18": false, "permalink": format!("/r/{sub}/comments/{id}/"),
        "link_flair_text": null
    })
    .to_string()
}

pub fn comment(id: &str, sub: &str, score: i64, body: &str) -> String {
    json!({
        "id": id, "body": body, "score": score, "subreddit": sub, "author": "alice",
        "created_utc": 1672531300, "link_id": "t3_s1", "parent_id": "t3_s1"
    })
    .to_string()
}

/// Tiny dump tree for January 2023:
/// - RS_2023-01.zst: s1 (rust, 500), s2 (rust, 1500, image url), s3 (cooking, 900),
///   s4 (Rust, 1500, text), s5 (rust, [deleted] title), one malformed line.
/// - RC_2023-01.zst: c1 (rust, 40), c2 (rust, 90), c3 (rust, [removed]), c4 (cooking, 10).
pub fn make_dumps_basic() -> PathBuf {
    let base = tempfile::tempdir().unwrap().into_path();

    let rs = vec![
        submission("s1", "rust", 500, "Ownership explained", "", "https://example.com/a"),
        submission("s2", "rust", 1500, "Ferris in the wild", "", "https://i.redd.it/ferris.png"),
        submission("s3", "cooking", 900, "Bread", "flour water salt", "https://example.com/b"),
        "{not json".to_string(),
        submission("s4", "Rust", 1500, "Borrowck tips", "use scopes", "https://www.reddit.com/r/rust/s4"),
        submission("s5", "rust", 2000, "[deleted]", "", "https://example.com/c"),
    ];
    write_zst_lines(&base.join("dumps").join("RS_2023-01.zst"), &rs);

    let rc = vec![
        comment("c1", "rust", 40, "nice"),
        comment("c2", "rust", 90, "great post"),
        comment("c3", "rust", 500, "[removed]"),
        comment("c4", "cooking", 10, "yum"),
    ];
    write_zst_lines(&base.join("dumps").join("RC_2023-01.zst"), &rc);

    fs::write(base.join("subreddits.txt"), "# targets\nrust\n\n  R/Programming \n").unwrap();
    base
}

/// Create a post directory with metadata and an optional image file.
pub fn make_post_dir(root: &Path, name: &str, selftext: &str, image: Option<&str>) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    let meta = json!({
        "id": name, "title": format!("title {name}"), "score": 10, "subreddit": "rust",
        "url": "https://example.com", "selftext": selftext, "author": "bob",
        "created_utc": 0, "num_comments": 0, "over_18": false, "permalink": "",
        "link_flair_text": null, "has_image": image.is_some(), "image_path": image
    });
    fs::write(dir.join("post_data.json"), serde_json::to_vec_pretty(&meta).unwrap()).unwrap();
    if let Some(img) = image {
        fs::write(dir.join(img), b"\x89PNG\r\n\x1a\n....").unwrap();
    }
    dir
}

/// Minimal valid PNG header bytes, enough for content sniffing.
pub fn png_bytes() -> Vec<u8> {
    let mut v = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    v.extend_from_slice(&[0u8; 16]);
    v
}

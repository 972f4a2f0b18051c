#[path = "common/mod.rs"]
mod common;

use common::*;
use rharvest::{
    post_dir_name, post_dirs, top_k, ContentPool, Harvest, MapFetcher, Materializer, NoImages, PostMeta, Record,
    Sources, TopK,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn rec(id: &str, score: i64) -> Record {
    Record { id: id.to_string(), title: format!("post {id}"), score, ..Record::default() }
}

fn ids(v: &[Record]) -> Vec<&str> {
    v.iter().map(|r| r.id.as_str()).collect()
}

/// Every file under `root`, relative path -> bytes.
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().into_owned();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

/// Ranking over a tiny list:
/// - `b` and `c` tie on 1500 and both beat `a`; `b` was seen first.
/// Outcome: top-2 is `[b, c]`; asking for more than exist returns everything; K = 0 keeps nothing.
#[test]
fn top_k_orders_by_score_then_encounter() {
    let top = top_k(vec![rec("a", 500), rec("b", 1500), rec("c", 1500)], 2, |r| r.score);
    assert_eq!(ids(&top), ["b", "c"]);

    // fewer than K: everything, best first
    let top = top_k(vec![rec("x", 1), rec("y", 3)], 10, |r| r.score);
    assert_eq!(ids(&top), ["y", "x"]);

    assert!(top_k(vec![rec("x", 1)], 0, |r| r.score).is_empty());
}

/// The bounded heap agrees with a stable descending sort truncated to K.
#[test]
fn bounded_heap_matches_stable_sort() {
    // small LCG so the test needs no rng dependency of its own
    let mut state: u64 = 0x2545_F491;
    let scores: Vec<i64> = (0..400)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % 50) as i64 - 10
        })
        .collect();

    for k in [1usize, 7, 50, 399, 400, 1000] {
        let mut heap = TopK::new(k);
        for (i, s) in scores.iter().enumerate() {
            heap.push(*s, i);
        }
        assert_eq!(heap.seen(), scores.len() as u64);

        let mut expected: Vec<usize> = (0..scores.len()).collect();
        expected.sort_by(|a, b| scores[*b].cmp(&scores[*a]));
        expected.truncate(k);

        assert_eq!(heap.into_sorted_vec(), expected, "k = {k}");
    }
}

/// Directory names are `{rank:04}_{slug}`, with the id and then `post` as fallbacks
/// and the slug cut to 60 characters.
#[test]
fn dir_names_are_ranked_slugs() {
    let mut r = rec("abc", 1);
    r.title = "Hello, World!  Rust 2023?".to_string();
    assert_eq!(post_dir_name(1, &r), "0001_hello_world_rust_2023");

    r.title = "[???]".to_string();
    assert_eq!(post_dir_name(12, &r), "0012_abc");

    r.id.clear();
    assert_eq!(post_dir_name(3, &r), "0003_post");

    r.title = "x".repeat(200);
    assert_eq!(post_dir_name(1, &r).len(), "0001_".len() + 60);
}

/// filter -> rank -> materialize -> clean over the basic dumps.
#[test]
fn pipeline_end_to_end() {
    let base = make_dumps_basic();
    let harvest = Harvest::new()
        .dumps_dir(base.join("dumps"))
        .work_dir(base.join("work"))
        .sources(Sources::Both)
        .subreddits_file(base.join("subreddits.txt"))
        .progress(false);
    harvest.filter_dumps().unwrap();

    let fetcher = MapFetcher::default().with("https://i.redd.it/ferris.png", png_bytes());
    let report = harvest.extract_top_posts(&fetcher).unwrap();
    assert_eq!(report.written, 3);
    assert_eq!(report.with_image, 1);
    assert_eq!(report.text_only, 1);
    assert_eq!(report.empty, 1);
    assert_eq!(report.image_failures, 0);

    let posts = &harvest.options().posts_dir;
    let image_dir = posts.join("0001_ferris_in_the_wild");
    assert_eq!(fs::read(image_dir.join("image.png")).unwrap(), png_bytes());
    let meta = PostMeta::read(&image_dir).unwrap();
    assert!(meta.has_image);
    assert_eq!(meta.image_path.as_deref(), Some("image.png"));
    assert_eq!(meta.record.score, 1500);

    let text = PostMeta::read(&posts.join("0002_borrowck_tips")).unwrap();
    assert!(!text.has_image);
    assert_eq!(text.record.selftext, "use scopes");
    assert!(posts.join("0003_ownership_explained").is_dir());

    let n = harvest.extract_top_comments().unwrap();
    assert_eq!(n, 2);
    let top: Vec<_> = read_jsonl_values(&harvest.options().top_comments)
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(top, ["c2", "c1"]);

    let cleanup = harvest.clean(rharvest::RetentionRule::HasContent).unwrap();
    assert_eq!(cleanup.visited, 3);
    assert_eq!(cleanup.kept, 2);
    assert_eq!(cleanup.removed.len(), 1);
    assert_eq!(cleanup.removed[0].dir, "0003_ownership_explained");
    assert!(!posts.join("0003_ownership_explained").exists());
    assert!(harvest.options().removal_log.exists());
}

/// Materializing the same ranked list twice yields a byte-identical tree.
#[test]
fn materialize_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    let mut img = rec("img", 10);
    img.url = "https://i.imgur.com/abc".to_string();
    let mut text = rec("txt", 9);
    text.selftext = "body".to_string();
    let ranked = vec![img, text, rec("bare", 8)];

    let fetcher = MapFetcher::default().with("https://i.imgur.com/abc", png_bytes());
    let m = Materializer::new(root.path(), &fetcher);
    let first = m.materialize(&ranked).unwrap();
    let before = snapshot(root.path());
    let second = m.materialize(&ranked).unwrap();

    assert_eq!(first, second);
    assert_eq!(before, snapshot(root.path()));
    // extensionless imgur URL: the type comes from the bytes
    assert!(before.keys().any(|k| k.ends_with("image.png")));
    assert!(!before.keys().any(|k| k.ends_with(".tmp")));
}

/// A failed fetch is counted, not fatal; the post keeps whatever text it has.
#[test]
fn failed_image_fetch_is_not_fatal() {
    let root = tempfile::tempdir().unwrap();
    let mut r = rec("gone", 5);
    r.url = "https://i.redd.it/missing.jpg".to_string();

    let report = Materializer::new(root.path(), &NoImages).materialize(&[r]).unwrap();
    assert_eq!(report.image_failures, 1);
    assert_eq!(report.empty, 1);

    let meta = PostMeta::read(&root.path().join("0001_post_gone")).unwrap();
    assert!(!meta.has_image);
    assert_eq!(meta.image_path, None);

    // an HTML error page from an extensionless URL is not an image
    let mut r = rec("html", 5);
    r.url = "https://i.redd.it/abc".to_string();
    r.selftext = "caption".to_string();
    let fetcher = MapFetcher::default().with(r.url.clone(), b"<html>nope</html>".to_vec());
    let report = Materializer::new(root.path(), &fetcher).materialize(&[r]).unwrap();
    assert_eq!(report.image_failures, 1);
    assert_eq!(report.text_only, 1);
    assert_eq!(report.pruned, 1, "the earlier `gone` directory is not in this ranking");
    assert!(rharvest::image_files(&root.path().join("0001_post_html")).is_empty());
}

/// Re-ranking between runs:
/// - First run keeps `[alpha, beta]`; the second keeps `[gamma, alpha]`.
/// - `alpha` moves from rank 1 to rank 2 and `beta` drops out.
/// Outcome: exactly the two directories of the second run remain, and the pool
/// built from them serves two posts.
#[test]
fn rerun_with_new_ranking_leaves_one_dir_per_record() {
    let root = tempfile::tempdir().unwrap();
    let mut alpha = rec("a", 10);
    alpha.title = "Alpha".into();
    alpha.selftext = "first".into();
    let mut beta = rec("b", 9);
    beta.title = "Beta".into();
    beta.selftext = "second".into();
    let mut gamma = rec("c", 20);
    gamma.title = "Gamma".into();
    gamma.selftext = "third".into();

    let m = Materializer::new(root.path(), &NoImages);
    let first = m.materialize(&[alpha.clone(), beta]).unwrap();
    assert_eq!(first.pruned, 0);

    let second = m.materialize(&[gamma, alpha]).unwrap();
    assert_eq!(second.written, 2);
    assert_eq!(second.pruned, 2);

    let names: Vec<String> = post_dirs(root.path())
        .iter()
        .map(|d| d.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["0001_gamma", "0002_alpha"]);

    let pool = ContentPool::load(root.path(), None).unwrap();
    let mut ids: Vec<&str> = pool.posts().iter().map(|p| p.id()).collect();
    ids.sort();
    assert_eq!(ids, ["a", "c"]);
}

#[path = "common/mod.rs"]
mod common;

use common::*;
use rharvest::{
    dump_file_name, is_image_url, parse_record_line, plan_dumps, read_records, sniff_image_ext, url_image_ext,
    DumpKind, NdjsonWriter, ParsedLine, Sources, YearMonth,
};
use std::fs;

/// Demonstrates lenient decoding of a dump line with mixed types:
/// - numeric strings, float timestamps, `1` for a flag and a `null` title.
/// Outcome: every field decodes; blank and broken lines come back as `Blank` / `Malformed`.
#[test]
fn lenient_record_decoding() {
    let line = r#"{"id":"x1","title":null,"score":"42","created_utc":"1672531200.0","over_18":1,"num_comments":3.0}"#;
    let ParsedLine::Record(r) = parse_record_line(line) else { panic!("expected a record") };
    assert_eq!(r.title, "");
    assert_eq!(r.score, 42);
    assert_eq!(r.created_utc, 1672531200);
    assert!(r.over_18);
    assert_eq!(r.num_comments, 3);
    assert!(!r.is_comment());
    assert_eq!(r.fullname(), "t3_x1");

    assert!(matches!(parse_record_line("   "), ParsedLine::Blank));
    assert!(matches!(parse_record_line("{\"id\":"), ParsedLine::Malformed(_)));
    assert!(matches!(parse_record_line("[1,2]"), ParsedLine::Malformed(_)));
}

/// A comment is recognised by its `body`, which also serves as its headline,
/// so a `[Deleted]` body (any case) is not live.
#[test]
fn comments_use_their_body_as_headline() {
    let ParsedLine::Record(c) = parse_record_line(&comment("c9", "rust", 3, "[Deleted]")) else { panic!() };
    assert!(c.is_comment());
    assert_eq!(c.fullname(), "t1_c9");
    assert!(!c.has_live_headline());
}

/// Dump discovery over a directory with out-of-order months, an invalid month
/// (`13`) and an unrelated file.
/// Outcome: submissions first then comments, each chronological, bounded by the
/// inclusive range; a missing directory plans nothing.
#[test]
fn plan_dumps_orders_and_bounds_months() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["RS_2023-02.zst", "RS_2022-12.zst", "RC_2023-01.zst", "RS_2023-13.zst", "notes.txt"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    let names = |jobs: Vec<rharvest::DumpFile>| -> Vec<String> {
        jobs.iter().map(|j| j.path.file_name().unwrap().to_string_lossy().into_owned()).collect()
    };

    let all = plan_dumps(dir.path(), Sources::Both, None, None);
    assert_eq!(names(all), ["RS_2022-12.zst", "RS_2023-02.zst", "RC_2023-01.zst"]);

    let jan_on = plan_dumps(dir.path(), Sources::Submissions, Some(YearMonth::new(2023, 1)), None);
    assert_eq!(names(jan_on), ["RS_2023-02.zst"]);

    let comments = plan_dumps(dir.path(), Sources::Comments, None, Some(YearMonth::new(2022, 12)));
    assert!(comments.is_empty());

    assert!(plan_dumps(&dir.path().join("absent"), Sources::Both, None, None).is_empty());
    assert_eq!(dump_file_name(DumpKind::Comments, "2024-03".parse().unwrap()), "RC_2024-03.zst");
    assert!("2024-13".parse::<YearMonth>().is_err());
}

/// Image URLs are recognised by extension or by host, including hosts written
/// with a port or userinfo; content type comes from magic bytes.
#[test]
fn image_detection() {
    assert!(is_image_url("https://i.redd.it/abc.jpeg?width=100"));
    assert!(is_image_url("https://i.imgur.com/xyz"));
    assert!(is_image_url("http://example.com/cat.GIF"));
    assert!(!is_image_url("https://www.reddit.com/r/rust/comments/1"));
    assert!(!is_image_url("not a url.png"));
    assert!(is_image_url("https://i.redd.it:443/x"));
    assert!(is_image_url("https://someone@i.imgur.com/abc"));
    assert!(!is_image_url("https://example.com:8080/page"));
    assert_eq!(url_image_ext("https://cdn.example.com:8443/a.png"), Some("png"));
    assert_eq!(url_image_ext("https://x.org/a/b.webp#frag"), Some("webp"));

    assert_eq!(sniff_image_ext(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("jpg"));
    assert_eq!(sniff_image_ext(&png_bytes()), Some("png"));
    assert_eq!(sniff_image_ext(b"GIF89a...."), Some("gif"));
    assert_eq!(sniff_image_ext(b"RIFF\0\0\0\0WEBPVP8 "), Some("webp"));
    assert_eq!(sniff_image_ext(b"<!doctype html>"), None);
}

/// The destination only appears on `finish`; a dropped writer never publishes it.
#[test]
fn ndjson_writer_is_atomic() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out").join("records.jsonl");

    let mut w = NdjsonWriter::create(&dest, 8 * 1024).unwrap();
    w.write_line(&submission("a", "rust", 1, "A", "", "")).unwrap();
    drop(w);
    assert!(!dest.exists());

    let mut w = NdjsonWriter::create(&dest, 8 * 1024).unwrap();
    w.write_line(&submission("a", "rust", 1, "A", "", "")).unwrap();
    w.write_line("{oops").unwrap();
    w.write_line(&submission("b", "rust", 2, "B", "", "")).unwrap();
    w.finish().unwrap();

    let loaded = read_records(&dest, 8 * 1024).unwrap();
    assert_eq!(loaded.malformed, 1);
    let ids: Vec<_> = loaded.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
}

/// Flair text is as loosely typed as the other fields: a number becomes its text,
/// `null` stays absent, and neither turns the line into `Malformed`.
#[test]
fn non_string_flair_does_not_reject_the_line() {
    let ParsedLine::Record(r) = parse_record_line(r#"{"id":"f1","subreddit":"rust","link_flair_text":12}"#) else {
        panic!("numeric flair should still decode")
    };
    assert_eq!(r.link_flair_text.as_deref(), Some("12"));

    let ParsedLine::Record(r) = parse_record_line(r#"{"id":"f2","link_flair_text":null}"#) else { panic!() };
    assert_eq!(r.link_flair_text, None);
}

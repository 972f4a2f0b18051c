use anyhow::Result;
use rharvest::{
    download_dump, dump_file_name, init_tracing_once, quick_validate_zst, DumpKind, Harvest, HttpImageFetcher,
    ImageFetcher, NoImages, RetentionRule, Sources, YearMonth,
};
use std::path::PathBuf;
use std::time::Duration;

const DUMPS_DIR: &str = "./dumps";
const WORK_DIR: &str = "./harvest";
const SUBREDDITS_FILE: &str = "./subreddits.txt";
const DUMP_BASE_URL: &str = "https://files.pushshift.io/reddit";
const USER_AGENT: &str = "rharvest/0.1 (image fetch)";

fn main() -> Result<()> {
    init_tracing_once();

    let month = YearMonth::new(2023, 1);
    let dumps_dir = PathBuf::from(DUMPS_DIR);

    for (kind, sub) in [(DumpKind::Submissions, "submissions"), (DumpKind::Comments, "comments")] {
        let name = dump_file_name(kind, month);
        let dest = dumps_dir.join(&name);
        download_dump(&format!("{DUMP_BASE_URL}/{sub}/{name}"), &dest, true)?;
        quick_validate_zst(&dest, 64 * 1024 * 1024)?;
    }

    let harvest = Harvest::new()
        .dumps_dir(&dumps_dir)
        .work_dir(WORK_DIR)
        .sources(Sources::Both)
        .date_range(Some(month), Some(month))
        .subreddits_file(SUBREDDITS_FILE)
        .min_score(Some(100))
        .live_title(true)
        .top_k(500)
        .progress(true);

    let stats = harvest.filter_dumps()?;
    println!(
        "Filtered {} lines: {} kept, {} malformed",
        stats.lines, stats.kept, stats.malformed
    );

    let http;
    let fetcher: &dyn ImageFetcher = if harvest.options().fetch_images {
        http = HttpImageFetcher::new(USER_AGENT, Duration::from_secs(30));
        &http
    } else {
        &NoImages
    };
    let report = harvest.extract_top_posts(fetcher)?;
    println!(
        "Materialized {} posts ({} with image, {} text-only, {} empty, {} stale removed)",
        report.written, report.with_image, report.text_only, report.empty, report.pruned
    );

    let comments = harvest.extract_top_comments()?;
    println!("Kept {comments} top comments");

    let cleanup = harvest.clean(RetentionRule::HasContent)?;
    println!(
        "Removed {} of {} post directories; log at {}",
        cleanup.removed.len(),
        cleanup.visited,
        harvest.options().removal_log.display()
    );

    Ok(())
}

use anyhow::Result;
use rharvest::{init_tracing_once, AllowList, Harvest, RetentionRule};
use std::path::Path;

const WORK_DIR: &str = "./harvest";
const ALLOW_LIST_FILE: &str = "./harvest/safe_posts.json";

fn main() -> Result<()> {
    init_tracing_once();

    // A missing allow-list aborts here, before any directory is touched.
    let allow = AllowList::load(Path::new(ALLOW_LIST_FILE))?;
    let harvest = Harvest::new().work_dir(WORK_DIR);
    let report = harvest.clean(RetentionRule::AllowList(allow))?;

    for entry in &report.removed {
        println!("removed {}  r/{}  {}", entry.dir, entry.subreddit, entry.title);
    }
    println!(
        "Kept {} of {} post directories; log at {}",
        report.kept,
        report.visited,
        harvest.options().removal_log.display()
    );
    Ok(())
}

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rharvest::{init_tracing_once, Bot, ContentPool, Credentials, RedditClient, ServeOptions};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const CREDENTIALS_FILE: &str = "./reddit_credentials.json";
const TARGET_SUBREDDIT: &str = "test";

fn main() -> Result<()> {
    init_tracing_once();

    let opts = ServeOptions::default()
        .with_target_subreddit(TARGET_SUBREDDIT)
        .with_post_ratio(0.6)
        .with_interval(Duration::from_secs(15 * 60));

    let creds = Credentials::load(Path::new(CREDENTIALS_FILE))?;
    let mut client = RedditClient::new(creds);
    client.authenticate()?;

    let pool = ContentPool::load(&opts.posts_dir, opts.top_comments.as_deref())?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    ctrlc::set_handler(move || {
        eprintln!("\n[bot] interrupt received, finishing current iteration...");
        flag.store(true, Ordering::SeqCst);
    })?;

    let mut bot = Bot::new(pool, client, StdRng::from_entropy(), opts);
    bot.run(&stop)?;
    bot.stats().write_summary(&mut std::io::stdout())?;
    Ok(())
}

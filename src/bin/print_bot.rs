use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rharvest::{init_tracing_once, Bot, ConsolePublisher, ContentPool, ServeOptions};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    init_tracing_once();

    let opts = ServeOptions::default()
        .with_comment_thread("console")
        .with_interval(Duration::from_secs(10));
    let pool = ContentPool::load(&opts.posts_dir, opts.top_comments.as_deref())?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let mut bot = Bot::new(pool, ConsolePublisher::new(io::stdout()), StdRng::from_entropy(), opts);
    bot.run(&stop)?;
    bot.stats().write_summary(&mut io::stdout())?;
    Ok(())
}

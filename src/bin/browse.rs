use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rharvest::{init_tracing_once, Browser, ContentPool, ServeOptions};
use std::io;

fn main() -> Result<()> {
    init_tracing_once();

    let opts = ServeOptions::default();
    let pool = ContentPool::load(&opts.posts_dir, opts.top_comments.as_deref())?;

    // Ctrl-C ends the process; print a parting line instead of a raw signal exit.
    ctrlc::set_handler(|| {
        println!("\nbye");
        std::process::exit(0);
    })?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    Browser::new(&pool, StdRng::from_entropy(), opts.post_ratio).run(stdin.lock(), &mut stdout)
}

mod config;
mod date;
mod paths;
mod record;
mod zstd_jsonl;
mod targets;

mod filters;
mod progress;
mod streaming;
mod util;
mod ndjson;
mod pipeline;

mod topk;
mod image;
mod materialize;
mod cleanup;
mod download;

mod pool;
mod publisher;
mod reddit_api;
mod bot;

pub use crate::config::{Credentials, HarvestOptions, ServeOptions, Sources};
pub use crate::date::{rfc3339_from_epoch, YearMonth};
pub use crate::pipeline::Harvest;
pub use crate::record::{parse_record_line, ParsedLine, Record};

// Dump naming and post-directory layout.
pub use crate::paths::{
    dump_file_name, image_files, plan_dumps, post_dir_name, post_dirs, DumpFile, DumpKind, IMAGE_EXTS, IMAGE_STEM,
    METADATA_FILE,
};

// Line sources (injectable) and the streaming filter.
pub use crate::zstd_jsonl::{quick_validate_zst, JsonlFile, LineSource, ReaderLines, ZstdDump};
pub use crate::filters::FilterSpec;
pub use crate::targets::{normalize_sub, TargetSet};
pub use crate::streaming::{filter_stream, FilterStats};
pub use crate::progress::{make_progress_bar_labeled, LineTicker};

// Ranking, materialization, retention.
pub use crate::topk::{top_k, TopK};
pub use crate::image::{
    is_image_url, sniff_image_ext, url_image_ext, HttpImageFetcher, ImageFetcher, MapFetcher, NoImages,
};
pub use crate::materialize::{MaterializeReport, Materializer, PostMeta};
pub use crate::cleanup::{
    retain, AllowList, Cleaner, CleanupReport, RemovalLog, RemovalReason, RemovedEntry, RetentionRule,
};
pub use crate::download::download_dump;

// NDJSON helpers and robust file ops.
pub use crate::ndjson::{read_records, LoadedRecords, NdjsonReader, NdjsonWriter};
pub use crate::util::{dir_size, init_tracing_once, write_file_atomic};

// Serving.
pub use crate::pool::{ContentPool, Pick, PoolPost};
pub use crate::publisher::{render_comment, render_post, ConsolePublisher, PostDraft, Publisher, Submitted};
pub use crate::reddit_api::{submission_result, RedditClient};
pub use crate::bot::{Bot, Browser, ServeStats, StepOutcome};

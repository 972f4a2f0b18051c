//! Image URL detection, content sniffing, and fetchers.

use crate::paths::image_ext;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::time::Duration;

const IMAGE_HOSTS: [&str; 2] = ["i.redd.it", "i.imgur.com"];
const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

// Host without userinfo or port, and the path without query or fragment.
fn split_host_path(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = host.split_once(':').map_or(host, |(h, _)| h);
    if host.is_empty() {
        return None;
    }
    Some((host, path))
}

/// Extension from the URL path, if it names an accepted image type.
pub fn url_image_ext(url: &str) -> Option<&'static str> {
    let (_, path) = split_host_path(url)?;
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    image_ext(ext)
}

/// True when `url` points straight at an image (by extension or known image host).
pub fn is_image_url(url: &str) -> bool {
    let Some((host, _)) = split_host_path(url) else { return false };
    let host = host.to_ascii_lowercase();
    url_image_ext(url).is_some() || IMAGE_HOSTS.iter().any(|h| host == *h)
}

/// Extension from magic bytes.
pub fn sniff_image_ext(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Content first, URL second. `None` means the bytes are not a usable image.
pub fn resolve_image_ext(bytes: &[u8], url: &str) -> Option<&'static str> {
    sniff_image_ext(bytes).or_else(|| if bytes.is_empty() { None } else { url_image_ext(url) })
}

/// Fetches image bytes for a URL.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Skips every image; the materializer then keeps only text posts' content.
pub struct NoImages;

impl ImageFetcher for NoImages {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(anyhow!("image fetching disabled ({url})"))
    }
}

/// In-memory fetcher keyed by URL.
#[derive(Default)]
pub struct MapFetcher {
    pub images: HashMap<String, Vec<u8>>,
}

impl MapFetcher {
    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.images.insert(url.into(), bytes.into());
        self
    }
}

impl ImageFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.images.get(url).cloned().ok_or_else(|| anyhow!("no image for {url}"))
    }
}

/// Blocking HTTP fetcher. Non-2xx responses and bodies over 20 MiB are errors.
pub struct HttpImageFetcher {
    agent: ureq::Agent,
}

impl HttpImageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .user_agent(user_agent)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut resp = self.agent.get(url).call().with_context(|| format!("GET {url}"))?;
        let bytes = resp
            .body_mut()
            .with_config()
            .limit(MAX_IMAGE_BYTES)
            .read_to_vec()
            .with_context(|| format!("read body {url}"))?;
        Ok(bytes)
    }
}

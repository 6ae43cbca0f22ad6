//! Per-navigation disguise and pacing

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

/// Fixed pool of realistic desktop browser signatures.
const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

/// Header set sent with every navigation alongside the rotating user agent.
const BASE_HEADERS: [(&str, &str); 10] = [
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Accept-Encoding", "gzip, deflate, br"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Cache-Control", "max-age=0"),
];

/// Runs before any page script; masks the automation-detection surfaces.
const STEALTH_SCRIPT: &str = "\
Object.defineProperty(navigator, 'webdriver', { get: () => false });\n\
Object.defineProperty(navigator, 'platform', { get: () => 'Linux x86_64' });\n";

/// Everything the browser engine needs to dress one navigation
#[derive(Debug, Clone)]
pub struct Disguise {
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub init_script: String,
}

impl Disguise {
    /// Draws a fresh disguise with a uniformly random user agent.
    pub fn draw() -> Self {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
            .to_string();

        Self {
            user_agent,
            headers: BASE_HEADERS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            init_script: STEALTH_SCRIPT.to_string(),
        }
    }
}

/// Uniformly randomized inter-request pacing, so requests carry no
/// fixed-interval fingerprint
#[derive(Debug, Clone, Copy)]
pub struct DelayPolicy {
    min: Duration,
    max: Duration,
}

impl DelayPolicy {
    /// Builds a policy over `[min_ms, max_ms]`; a reversed interval
    /// collapses onto its lower bound.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let min = Duration::from_millis(min_ms);
        let max = Duration::from_millis(max_ms.max(min_ms));
        Self { min, max }
    }

    /// Sleeps for a duration drawn uniformly from the interval.
    pub async fn pause(&self) {
        tokio::time::sleep(self.draw_delay()).await;
    }

    fn draw_delay(&self) -> Duration {
        let span = self.max.saturating_sub(self.min).as_millis() as u64;
        if span == 0 {
            return self.min;
        }
        self.min + Duration::from_millis(rand::thread_rng().gen_range(0..=span))
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::new(2000, 5000)
    }
}

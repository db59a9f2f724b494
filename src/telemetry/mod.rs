//! In-process telemetry for pipeline stages
//!
//! Collects stage events and counters; `ask`/`eval` print a summary in
//! verbose mode.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Pipeline stage events
#[derive(Debug, Clone)]
pub enum StageEvent {
    IngestCompleted {
        files: usize,
        chunks: usize,
        duration: Duration,
    },
    EmbedCompleted {
        chunks: usize,
        duration: Duration,
    },
    SearchCompleted {
        hits: usize,
        dropped: usize,
        duration: Duration,
    },
    GenerateCompleted {
        refused: bool,
        citations: usize,
        duration: Duration,
    },
}

/// Aggregated counters
#[derive(Debug, Clone, Default)]
pub struct StageStats {
    pub files_ingested: usize,
    pub chunks_indexed: usize,
    pub searches: usize,
    pub passages_dropped: usize,
    pub answers: usize,
    pub refusals: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<StageEvent>>>,
    stats: Arc<Mutex<StageStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(StageStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: StageEvent) {
        {
            let mut stats = self.stats.lock().unwrap();
            match &event {
                StageEvent::IngestCompleted { files, .. } => {
                    stats.files_ingested += files;
                }
                StageEvent::EmbedCompleted { chunks, .. } => {
                    stats.chunks_indexed += chunks;
                }
                StageEvent::SearchCompleted { dropped, .. } => {
                    stats.searches += 1;
                    stats.passages_dropped += dropped;
                }
                StageEvent::GenerateCompleted { refused, .. } => {
                    stats.answers += 1;
                    if *refused {
                        stats.refusals += 1;
                    }
                }
            }
        }

        let mut events = self.events.lock().unwrap();
        events.push(event);
    }

    pub fn stats(&self) -> StageStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// One-line summary for verbose output
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let mut out = String::new();
        if stats.chunks_indexed > 0 {
            out.push_str(&format!(
                "indexed: {} chunks from {} files, ",
                stats.chunks_indexed, stats.files_ingested
            ));
        }
        out.push_str(&format!(
            "searches: {}, dropped passages: {}, answers: {} ({} refused), elapsed: {:.1}s",
            stats.searches,
            stats.passages_dropped,
            stats.answers,
            stats.refusals,
            self.elapsed().as_secs_f32()
        ));
        out
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

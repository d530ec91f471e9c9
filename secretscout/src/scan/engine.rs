use crossbeam_channel::{bounded, Receiver, SendError, Sender};
use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

use super::matcher::PatternSet;
use super::reader::{LineReader, DEFAULT_CHUNK_SIZE};
use crate::errors::{ScanError, ScanResult};
use crate::input::InputSource;
use crate::results::{MatchEvent, ScanEvent, ScanSummary};

/// Result channel capacity. Bounds memory when workers outpace the sink
/// while still absorbing production bursts.
const RESULT_CHANNEL_CAPACITY: usize = 1000;

/// Knobs the dispatcher honors for one scan session.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Match display cap in characters; 0 disables truncation.
    pub truncate: usize,
    /// Number of concurrent workers.
    pub thread_count: NonZeroUsize,
    /// Read size per I/O operation.
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            truncate: 400,
            thread_count: default_thread_count(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

/// Cooperative cancellation signal, observed by every worker at each queue
/// pull and each line boundary. Per-source state is worker-local, so a
/// cancelled worker just stops and drops it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Scans every source with a pool of workers, writing one rendered event per
/// match (or per source failure) to `out`.
///
/// Fan-out/fan-in pipeline: a pre-filled work queue is drained by N workers,
/// each reading its source as chunked lines and matching every pattern per
/// line; events funnel through a bounded result channel into a single sink
/// that owns `out`. The result channel closes only once every worker has
/// exited, and this function returns only after the sink has drained every
/// event, so no event is lost and no thread outlives the call.
///
/// One source's open or read failure is reported as an event and never stops
/// the other sources.
pub fn run_scan<W: Write + Send>(
    sources: Vec<InputSource>,
    patterns: &PatternSet,
    options: &ScanOptions,
    out: W,
) -> ScanResult<ScanSummary> {
    run_scan_with_cancel(sources, patterns, options, &CancelToken::new(), out)
}

/// [`run_scan`] with an externally owned cancellation token.
pub fn run_scan_with_cancel<W: Write + Send>(
    sources: Vec<InputSource>,
    patterns: &PatternSet,
    options: &ScanOptions,
    cancel: &CancelToken,
    out: W,
) -> ScanResult<ScanSummary> {
    let source_count = sources.len();
    let workers = options.thread_count.get();
    info!(
        "Scanning {} sources with {} workers and {} patterns",
        source_count,
        workers,
        patterns.len()
    );

    // Pre-fill the work queue, then close it so workers drain and exit.
    let (work_tx, work_rx) = bounded(source_count.max(1));
    for source in sources {
        if work_tx.send(source).is_err() {
            break;
        }
    }
    drop(work_tx);

    let (result_tx, result_rx) = bounded::<ScanEvent>(RESULT_CHANNEL_CAPACITY);
    let processed = AtomicUsize::new(0);

    let mut summary = thread::scope(|s| -> ScanResult<ScanSummary> {
        let sink = s.spawn(move || -> std::io::Result<ScanSummary> {
            let mut out = out;
            let mut summary = ScanSummary::new();
            for event in result_rx.iter() {
                summary.record(&event);
                writeln!(out, "{event}")?;
            }
            out.flush()?;
            Ok(summary)
        });

        for id in 0..workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let processed = &processed;
            s.spawn(move || {
                worker_loop(id, &work_rx, &result_tx, patterns, options, cancel, processed)
            });
        }
        // The workers hold the only remaining senders; once the last one
        // exits, the sink sees the channel close and finishes.
        drop(result_tx);
        drop(work_rx);

        match sink.join() {
            Ok(summary) => Ok(summary?),
            Err(_) => Err(ScanError::config_error("result sink thread panicked")),
        }
    })?;

    summary.sources_scanned = processed.load(Ordering::Relaxed);
    info!(
        "Scan complete: {} matches across {} sources ({} source errors)",
        summary.matches_found, summary.sources_scanned, summary.source_errors
    );
    Ok(summary)
}

fn worker_loop(
    id: usize,
    work: &Receiver<InputSource>,
    results: &Sender<ScanEvent>,
    patterns: &PatternSet,
    options: &ScanOptions,
    cancel: &CancelToken,
    processed: &AtomicUsize,
) {
    for source in work.iter() {
        if cancel.is_cancelled() {
            debug!("Worker {id} stopping: cancelled");
            return;
        }
        processed.fetch_add(1, Ordering::Relaxed);
        debug!("Worker {id} scanning {source}");
        if scan_source(&source, patterns, options, cancel, results).is_err() {
            // Sink is gone; nothing left to report to.
            return;
        }
    }
}

/// Scans one source sequentially, sending its events in line order. The file
/// handle is dropped on every exit path before the worker takes more work.
fn scan_source(
    source: &InputSource,
    patterns: &PatternSet,
    options: &ScanOptions,
    cancel: &CancelToken,
    results: &Sender<ScanEvent>,
) -> Result<(), SendError<ScanEvent>> {
    let label = source.label();
    let reader = match source.open() {
        Ok(reader) => reader,
        Err(e) => {
            return results.send(ScanEvent::SourceError {
                source: label,
                message: e.to_string(),
            });
        }
    };

    for item in LineReader::with_chunk_size(reader, options.chunk_size) {
        if cancel.is_cancelled() {
            return Ok(());
        }
        match item {
            Ok((line, number)) => {
                for m in patterns.match_line(&line, options.truncate) {
                    results.send(ScanEvent::Match(MatchEvent {
                        source: label.clone(),
                        line: number,
                        pattern: m.pattern,
                        confidence: m.confidence,
                        text: m.text,
                        offset: m.offset,
                    }))?;
                }
            }
            Err(e) => {
                // Lines completed before the failure were already sent.
                return results.send(ScanEvent::SourceError {
                    source: label,
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{Confidence, PatternSpec};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn patterns(specs: &[(&str, &str, Confidence)]) -> PatternSet {
        let specs: Vec<PatternSpec> = specs
            .iter()
            .map(|(name, regex, confidence)| PatternSpec {
                name: name.to_string(),
                regex: regex.to_string(),
                confidence: *confidence,
            })
            .collect();
        PatternSet::compile(&specs).unwrap()
    }

    fn options(threads: usize) -> ScanOptions {
        ScanOptions {
            truncate: 0,
            thread_count: NonZeroUsize::new(threads).unwrap(),
            chunk_size: 64,
        }
    }

    fn run_to_string(
        sources: Vec<InputSource>,
        set: &PatternSet,
        opts: &ScanOptions,
    ) -> (ScanSummary, String) {
        let mut out = Vec::new();
        let summary = run_scan(sources, set, opts, &mut out).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_more_sources_than_workers() {
        colored::control::set_override(false);
        let dir = tempdir().unwrap();
        let mut sources = Vec::new();
        for i in 0..8 {
            let path = dir.path().join(format!("file_{i}.txt"));
            std::fs::write(&path, format!("token_{i} here\nno hit\n")).unwrap();
            sources.push(InputSource::File(path));
        }

        let set = patterns(&[("token", r"token_\d+", Confidence::High)]);
        let (summary, output) = run_to_string(sources, &set, &options(3));

        assert_eq!(summary.sources_scanned, 8);
        assert_eq!(summary.matches_found, 8);
        assert_eq!(summary.source_errors, 0);
        for i in 0..8 {
            let needle = format!("token_{i}");
            assert_eq!(
                output.matches(&needle).count(),
                1,
                "source {i} should be scanned exactly once"
            );
        }
    }

    #[test]
    fn test_source_error_does_not_stop_others() {
        colored::control::set_override(false);
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "password=hunter2\n").unwrap();

        let sources = vec![
            InputSource::File(PathBuf::from("/no/such/file")),
            InputSource::File(good),
        ];
        let set = patterns(&[("password", "password=\\S+", Confidence::Medium)]);
        let (summary, output) = run_to_string(sources, &set, &options(2));

        assert_eq!(summary.sources_scanned, 2);
        assert_eq!(summary.matches_found, 1);
        assert_eq!(summary.source_errors, 1);
        assert!(output.contains("password=hunter2"));
        assert!(output.contains("/no/such/file: error:"));
    }

    #[test]
    fn test_line_order_preserved_within_source() {
        colored::control::set_override(false);
        let dir = tempdir().unwrap();
        let path = dir.path().join("multi.txt");
        let mut body = String::new();
        for i in 1..=50 {
            body.push_str(&format!("line {i} hit_{i}\n"));
        }
        std::fs::write(&path, body).unwrap();

        let set = patterns(&[("hit", r"hit_\d+", Confidence::Low)]);
        let (summary, output) = run_to_string(vec![InputSource::File(path)], &set, &options(4));

        assert_eq!(summary.matches_found, 50);
        let mut last_line = 0;
        for rendered in output.lines() {
            let line: u64 = rendered
                .split(':')
                .nth(1)
                .and_then(|s| s.parse().ok())
                .unwrap();
            assert!(line > last_line, "line numbers must increase: {rendered}");
            last_line = line;
        }
    }

    #[test]
    fn test_empty_source_list() {
        let set = patterns(&[("x", "x", Confidence::Low)]);
        let (summary, output) = run_to_string(Vec::new(), &set, &options(2));
        assert_eq!(summary, ScanSummary::new());
        assert!(output.is_empty());
    }

    #[test]
    fn test_unterminated_final_line_is_scanned() {
        colored::control::set_override(false);
        let dir = tempdir().unwrap();
        let path = dir.path().join("tail.txt");
        std::fs::write(&path, "nothing\napi_key=abc123").unwrap();

        let set = patterns(&[("api key", "api_key=\\w+", Confidence::High)]);
        let (summary, output) = run_to_string(vec![InputSource::File(path)], &set, &options(1));

        assert_eq!(summary.matches_found, 1);
        assert!(output.contains(":2: Found api key"));
    }

    #[test]
    fn test_cancelled_before_start_scans_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skip.txt");
        std::fs::write(&path, "token_1\n").unwrap();

        let set = patterns(&[("token", r"token_\d+", Confidence::High)]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut out = Vec::new();
        let summary = run_scan_with_cancel(
            vec![InputSource::File(path)],
            &set,
            &options(2),
            &cancel,
            &mut out,
        )
        .unwrap();
        assert_eq!(summary.matches_found, 0);
        assert!(out.is_empty());
    }
}

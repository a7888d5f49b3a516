// Orchestrator retry/fallback behavior, driven through a scripted engine.
// No network or subprocess is involved: the mock returns typed errors the
// way the real engine boundary does.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::rc::Rc;
use std::time::Duration;

use tempfile::TempDir;

use tubegrab::core::engine::{DownloadRequest, ExtractionEngine, MediaInfo, ProgressSink};
use tubegrab::core::tagger::{AudioTagger, TagSet};
use tubegrab::core::{FetchProfile, Fetcher, Platform};
use tubegrab::FetchError;

/// Outcome of one scripted download call
enum Outcome {
    /// Succeed and write the output file
    Ok,
    /// Report success but leave no file behind
    OkNoFile,
    /// Fail with a typed error
    Err(FetchError),
}

/// Extraction engine with a scripted sequence of download outcomes.
/// Once the script runs dry every further call succeeds.
struct MockEngine {
    info: MediaInfo,
    script: RefCell<VecDeque<Outcome>>,
    resolve_calls: Cell<u32>,
    download_calls: Cell<u32>,
    formats_seen: RefCell<Vec<String>>,
    urls_seen: RefCell<Vec<String>>,
}

impl MockEngine {
    fn new(script: Vec<Outcome>) -> Self {
        Self {
            info: sample_info(),
            script: RefCell::new(script.into()),
            resolve_calls: Cell::new(0),
            download_calls: Cell::new(0),
            formats_seen: RefCell::new(Vec::new()),
            urls_seen: RefCell::new(Vec::new()),
        }
    }
}

fn sample_info() -> MediaInfo {
    serde_json::from_str(
        r#"{
            "title": "Song",
            "duration": 212.0,
            "view_count": 1234567,
            "thumbnail": "https://i.example/thumb.jpg",
            "uploader": "Artist",
            "upload_date": "20230615"
        }"#,
    )
    .unwrap()
}

impl ExtractionEngine for MockEngine {
    fn resolve_info(&self, url: &str) -> Result<MediaInfo, FetchError> {
        self.resolve_calls.set(self.resolve_calls.get() + 1);
        self.urls_seen.borrow_mut().push(url.to_string());
        Ok(self.info.clone())
    }

    fn download(
        &self,
        _url: &str,
        request: &DownloadRequest,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), FetchError> {
        self.download_calls.set(self.download_calls.get() + 1);
        self.formats_seen
            .borrow_mut()
            .push(request.format.to_string());

        sink.started(Some(1000));
        sink.progressed(1000, Some(1000));
        sink.finished();

        let outcome = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or(Outcome::Ok);

        match outcome {
            Outcome::Ok => {
                let template = request.output_template.to_string_lossy().to_string();
                let path = template.replace("%(ext)s", request.profile.kind.extension());
                fs::write(path, b"media").unwrap();
                Ok(())
            }
            Outcome::OkNoFile => Ok(()),
            Outcome::Err(e) => Err(e),
        }
    }
}

/// Sink that records event names for ordering assertions
#[derive(Default)]
struct RecordingSink {
    events: Vec<String>,
}

impl ProgressSink for RecordingSink {
    fn started(&mut self, _total: Option<u64>) {
        self.events.push("started".to_string());
    }
    fn progressed(&mut self, downloaded: u64, _total: Option<u64>) {
        self.events.push(format!("progressed:{}", downloaded));
    }
    fn finished(&mut self) {
        self.events.push("finished".to_string());
    }
}

/// Tagger that records what it was asked to write
struct CapturingTagger {
    tags: Rc<RefCell<Vec<TagSet>>>,
}

impl AudioTagger for CapturingTagger {
    fn tag(&self, _path: &std::path::Path, tags: &TagSet) -> anyhow::Result<()> {
        self.tags.borrow_mut().push(tags.clone());
        Ok(())
    }
}

/// Tagger that always fails
struct FailingTagger;

impl AudioTagger for FailingTagger {
    fn tag(&self, _path: &std::path::Path, _tags: &TagSet) -> anyhow::Result<()> {
        anyhow::bail!("tag store refused to open")
    }
}

fn fetcher_in(dir: &TempDir, engine: MockEngine) -> Fetcher<MockEngine> {
    Fetcher::new(engine, dir.path().to_path_buf()).with_retry_delay(Duration::ZERO)
}

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=abc123";

#[test]
fn test_successful_fetch_returns_verified_record() {
    let dir = TempDir::new().unwrap();
    let fetcher = fetcher_in(&dir, MockEngine::new(vec![Outcome::Ok]));

    let record = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &FetchProfile::video(),
            &mut RecordingSink::default(),
        )
        .unwrap();

    assert_eq!(record.title, "Song");
    assert_eq!(record.duration_secs, Some(212));
    assert_eq!(record.view_count, Some(1_234_567));
    assert_eq!(record.format_label, "MP4");
    assert_eq!(record.source_url, VIDEO_URL);
    assert!(record.output_path.exists(), "record implies a file on disk");
    assert!(record.output_path.ends_with("Song.mp4"));
}

#[test]
fn test_invalid_url_fails_without_consuming_attempts() {
    let dir = TempDir::new().unwrap();
    let engine = MockEngine::new(vec![]);
    let fetcher = fetcher_in(&dir, engine);

    let err = fetcher
        .fetch(
            "https://vimeo.com/12345",
            Platform::YouTube,
            &FetchProfile::video(),
            &mut RecordingSink::default(),
        )
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidUrl { .. }));
    assert_eq!(fetcher_engine(&fetcher).resolve_calls.get(), 0);
    assert_eq!(fetcher_engine(&fetcher).download_calls.get(), 0);
}

#[test]
fn test_short_url_is_normalized_before_the_engine_sees_it() {
    let dir = TempDir::new().unwrap();
    let fetcher = fetcher_in(&dir, MockEngine::new(vec![Outcome::Ok]));

    fetcher
        .fetch(
            "https://youtu.be/abc123",
            Platform::YouTube,
            &FetchProfile::video(),
            &mut RecordingSink::default(),
        )
        .unwrap();

    assert_eq!(
        fetcher_engine(&fetcher).urls_seen.borrow().as_slice(),
        ["https://www.youtube.com/watch?v=abc123"]
    );
}

#[test]
fn test_format_fallback_consumes_exactly_two_attempts() {
    let dir = TempDir::new().unwrap();
    let engine = MockEngine::new(vec![Outcome::Err(FetchError::format_unavailable(
        "Requested format is not available",
    ))]);
    let fetcher = fetcher_in(&dir, engine);

    let profile = FetchProfile::video();
    let record = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &profile,
            &mut RecordingSink::default(),
        )
        .unwrap();

    let engine = fetcher_engine(&fetcher);
    assert_eq!(engine.download_calls.get(), 2, "exactly 2 attempts, not 3");
    assert_eq!(
        engine.formats_seen.borrow().as_slice(),
        [
            profile.format.as_str(),
            profile.fallback_format.as_deref().unwrap()
        ],
        "second attempt uses the fallback selector"
    );
    assert_eq!(record.format_label, "MP4");
}

#[test]
fn test_fallback_switch_happens_at_most_once() {
    let dir = TempDir::new().unwrap();
    // Format errors on every attempt: one switch, then the budget runs out
    let engine = MockEngine::new(vec![
        Outcome::Err(FetchError::format_unavailable("no such format")),
        Outcome::Err(FetchError::format_unavailable("no such format")),
        Outcome::Err(FetchError::format_unavailable("no such format")),
    ]);
    let fetcher = fetcher_in(&dir, engine);

    let profile = FetchProfile::video();
    let err = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &profile,
            &mut RecordingSink::default(),
        )
        .unwrap_err();

    assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));

    let engine = fetcher_engine(&fetcher);
    let formats = engine.formats_seen.borrow();
    assert_eq!(formats.len(), 3);
    assert_eq!(formats[0], profile.format);
    // Attempts after the single switch keep the fallback selector
    assert_eq!(formats[1], profile.fallback_format.as_deref().unwrap());
    assert_eq!(formats[2], profile.fallback_format.as_deref().unwrap());
}

#[test]
fn test_format_unavailable_without_fallback_is_a_normal_retry() {
    let dir = TempDir::new().unwrap();
    let engine = MockEngine::new(vec![
        Outcome::Err(FetchError::format_unavailable("no such format")),
        Outcome::Ok,
    ]);
    let fetcher = fetcher_in(&dir, engine);

    // Audio profiles define no fallback
    let profile = FetchProfile::audio();
    let record = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &profile,
            &mut RecordingSink::default(),
        )
        .unwrap();

    let engine = fetcher_engine(&fetcher);
    assert_eq!(engine.download_calls.get(), 2);
    assert_eq!(
        engine.formats_seen.borrow().as_slice(),
        [profile.format.as_str(), profile.format.as_str()],
        "selector unchanged when no fallback is configured"
    );
    assert_eq!(record.format_label, "MP3");
}

#[test]
fn test_persistent_transfer_failure_exhausts_all_attempts() {
    let dir = TempDir::new().unwrap();
    let engine = MockEngine::new(vec![
        Outcome::Err(FetchError::transfer("connection reset")),
        Outcome::Err(FetchError::transfer("connection reset")),
        Outcome::Err(FetchError::transfer("connection reset")),
    ]);
    let fetcher = fetcher_in(&dir, engine);

    let err = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &FetchProfile::video(),
            &mut RecordingSink::default(),
        )
        .unwrap_err();

    assert_eq!(fetcher_engine(&fetcher).download_calls.get(), 3);
    match err {
        FetchError::Exhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, FetchError::Transfer(_)));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[test]
fn test_missing_output_counts_as_a_failed_attempt() {
    let dir = TempDir::new().unwrap();
    let engine = MockEngine::new(vec![Outcome::OkNoFile, Outcome::Ok]);
    let fetcher = fetcher_in(&dir, engine);

    let record = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &FetchProfile::video(),
            &mut RecordingSink::default(),
        )
        .unwrap();

    assert_eq!(fetcher_engine(&fetcher).download_calls.get(), 2);
    assert!(record.output_path.exists());
}

#[test]
fn test_missing_output_alone_exhausts_to_output_missing() {
    let dir = TempDir::new().unwrap();
    let engine = MockEngine::new(vec![
        Outcome::OkNoFile,
        Outcome::OkNoFile,
        Outcome::OkNoFile,
    ]);
    let fetcher = fetcher_in(&dir, engine);

    let err = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &FetchProfile::video(),
            &mut RecordingSink::default(),
        )
        .unwrap_err();

    match err {
        FetchError::Exhausted { source, .. } => {
            assert!(matches!(*source, FetchError::OutputMissing(_)));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[test]
fn test_audio_fetch_writes_tags_from_resolved_info() {
    let dir = TempDir::new().unwrap();
    let tags = Rc::new(RefCell::new(Vec::new()));
    let fetcher = fetcher_in(&dir, MockEngine::new(vec![Outcome::Ok])).with_tagger(Box::new(
        CapturingTagger {
            tags: Rc::clone(&tags),
        },
    ));

    fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &FetchProfile::audio(),
            &mut RecordingSink::default(),
        )
        .unwrap();

    let written = tags.borrow();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].title, "Song");
    assert_eq!(written[0].artist, "Artist");
    assert_eq!(written[0].album, "YouTube Audio");
    assert_eq!(written[0].year, "2023");
}

#[test]
fn test_video_fetch_does_not_tag() {
    let dir = TempDir::new().unwrap();
    let tags = Rc::new(RefCell::new(Vec::new()));
    let fetcher = fetcher_in(&dir, MockEngine::new(vec![Outcome::Ok])).with_tagger(Box::new(
        CapturingTagger {
            tags: Rc::clone(&tags),
        },
    ));

    fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &FetchProfile::video(),
            &mut RecordingSink::default(),
        )
        .unwrap();

    assert!(tags.borrow().is_empty());
}

#[test]
fn test_tagging_failure_does_not_fail_the_fetch() {
    let dir = TempDir::new().unwrap();
    let fetcher =
        fetcher_in(&dir, MockEngine::new(vec![Outcome::Ok])).with_tagger(Box::new(FailingTagger));

    let record = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &FetchProfile::audio(),
            &mut RecordingSink::default(),
        )
        .unwrap();

    assert!(record.output_path.exists());
}

#[test]
fn test_destination_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("media").join("downloads");
    let fetcher = Fetcher::new(MockEngine::new(vec![Outcome::Ok]), nested.clone())
        .with_retry_delay(Duration::ZERO);

    let record = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &FetchProfile::video(),
            &mut RecordingSink::default(),
        )
        .unwrap();

    assert!(nested.is_dir());
    assert_eq!(record.output_path.parent(), Some(nested.as_path()));
}

#[test]
fn test_custom_output_name_overrides_the_title() {
    let dir = TempDir::new().unwrap();
    let fetcher = fetcher_in(&dir, MockEngine::new(vec![Outcome::Ok]));

    let profile = FetchProfile::video().with_output_name(Some("lecture-01".to_string()));
    let record = fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &profile,
            &mut RecordingSink::default(),
        )
        .unwrap();

    assert!(record.output_path.ends_with("lecture-01.mp4"));
}

#[test]
fn test_progress_events_flow_through_the_sink() {
    let dir = TempDir::new().unwrap();
    let fetcher = fetcher_in(&dir, MockEngine::new(vec![Outcome::Ok]));

    let mut sink = RecordingSink::default();
    fetcher
        .fetch(
            VIDEO_URL,
            Platform::YouTube,
            &FetchProfile::video(),
            &mut sink,
        )
        .unwrap();

    assert_eq!(sink.events, ["started", "progressed:1000", "finished"]);
}

/// The engine is owned by the fetcher; assertions reach it through here
fn fetcher_engine<'a>(fetcher: &'a Fetcher<MockEngine>) -> &'a MockEngine {
    fetcher.engine()
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! OCR engine pool concurrency tests
//!
//! These tests verify that the pool:
//! - Builds exactly one engine per language under concurrent first use
//! - Never runs two recognitions for the same language at once
//! - Lets different languages recognize in parallel
//! - Retries a failed creation and rebuilds an engine after a panic

use fabstir_image_node::vision::ocr::{
    ModelDirectory, OcrEngine, OcrEngineFactory, OcrEnginePool, OcrError,
    UnavailableEngineFactory,
};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Shared counters observed by every engine a factory builds
#[derive(Default)]
struct Tracker {
    /// Recognitions in flight, per language
    active: Mutex<HashMap<String, usize>>,
    /// Highest per-language concurrency seen
    max_same_language: AtomicUsize,
    /// Recognitions in flight across all languages
    total_active: AtomicUsize,
    /// Set once two recognitions overlapped
    overlapped: AtomicBool,
}

struct TrackerEngine {
    language: String,
    tracker: Arc<Tracker>,
    hold: Duration,
    wait_for_overlap: bool,
}

impl OcrEngine for TrackerEngine {
    fn recognize(&mut self, _image: &RgbaImage) -> Result<String, OcrError> {
        {
            let mut active = self.tracker.active.lock().unwrap();
            let count = active.entry(self.language.clone()).or_insert(0);
            *count += 1;
            self.tracker.max_same_language.fetch_max(*count, Ordering::SeqCst);
        }
        self.tracker.total_active.fetch_add(1, Ordering::SeqCst);

        if self.wait_for_overlap {
            // give up after a while instead of deadlocking a serialized pool
            let deadline = Instant::now() + Duration::from_secs(2);
            while Instant::now() < deadline {
                if self.tracker.total_active.load(Ordering::SeqCst) >= 2 {
                    self.tracker.overlapped.store(true, Ordering::SeqCst);
                    break;
                }
                thread::sleep(Duration::from_millis(5));
            }
        } else {
            thread::sleep(self.hold);
        }

        self.tracker.total_active.fetch_sub(1, Ordering::SeqCst);
        *self
            .tracker
            .active
            .lock()
            .unwrap()
            .get_mut(&self.language)
            .unwrap() -= 1;
        Ok(format!(" {}\r\n", self.language))
    }
}

struct TrackerFactory {
    tracker: Arc<Tracker>,
    creation_delay: Duration,
    hold: Duration,
    wait_for_overlap: bool,
}

impl TrackerFactory {
    fn new(tracker: Arc<Tracker>) -> Self {
        Self {
            tracker,
            creation_delay: Duration::from_millis(0),
            hold: Duration::from_millis(0),
            wait_for_overlap: false,
        }
    }
}

impl OcrEngineFactory for TrackerFactory {
    fn create(&self, language: &str) -> Result<Box<dyn OcrEngine>, OcrError> {
        thread::sleep(self.creation_delay);
        Ok(Box::new(TrackerEngine {
            language: language.to_string(),
            tracker: self.tracker.clone(),
            hold: self.hold,
            wait_for_overlap: self.wait_for_overlap,
        }))
    }

    fn name(&self) -> &'static str {
        "tracker"
    }
}

fn page() -> RgbaImage {
    RgbaImage::from_pixel(32, 32, Rgba([255, 255, 255, 255]))
}

/// Run `f` on `n` threads released together
fn run_together<F>(n: usize, f: F) -> Vec<Result<String, OcrError>>
where
    F: Fn(usize) -> Result<String, OcrError> + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(n));
    let f = Arc::new(f);
    let handles: Vec<_> = (0..n)
        .map(|i| {
            let barrier = barrier.clone();
            let f = f.clone();
            thread::spawn(move || {
                barrier.wait();
                f(i)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[cfg(test)]
mod ocr_pool_tests {
    use super::*;

    #[test]
    fn test_single_engine_under_concurrent_first_use() {
        let tracker = Arc::new(Tracker::default());
        let mut factory = TrackerFactory::new(tracker);
        factory.creation_delay = Duration::from_millis(50);
        let pool = Arc::new(OcrEnginePool::new(Arc::new(factory)));

        let shared = pool.clone();
        let results = run_together(8, move |_| shared.recognize_text("eng", &page()));

        assert!(results.iter().all(|r| r.as_deref().ok() == Some("eng")));
        assert_eq!(pool.created_count(), 1);
        assert_eq!(pool.languages(), vec!["eng".to_string()]);
    }

    #[test]
    fn test_same_language_is_serialized() {
        let tracker = Arc::new(Tracker::default());
        let mut factory = TrackerFactory::new(tracker.clone());
        factory.hold = Duration::from_millis(20);
        let pool = Arc::new(OcrEnginePool::new(Arc::new(factory)));

        let shared = pool.clone();
        let results = run_together(6, move |_| shared.recognize_text("kor", &page()));

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(tracker.max_same_language.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_different_languages_run_in_parallel() {
        let tracker = Arc::new(Tracker::default());
        let mut factory = TrackerFactory::new(tracker.clone());
        factory.wait_for_overlap = true;
        let pool = Arc::new(OcrEnginePool::new(Arc::new(factory)));

        let shared = pool.clone();
        let results = run_together(2, move |i| {
            let language = if i == 0 { "eng" } else { "kor_vert" };
            shared.recognize_text(language, &page())
        });

        assert!(results.iter().all(|r| r.is_ok()));
        assert!(tracker.overlapped.load(Ordering::SeqCst));
        assert_eq!(pool.created_count(), 2);
        assert_eq!(
            pool.languages(),
            vec!["eng".to_string(), "kor_vert".to_string()]
        );
    }

    #[test]
    fn test_handle_reuses_engine() {
        let pool = OcrEnginePool::new(Arc::new(TrackerFactory::new(Arc::new(Tracker::default()))));

        let handle = pool.engine("eng+kor").unwrap();
        assert_eq!(handle.language(), "eng+kor");
        assert_eq!(pool.recognize(&handle, &page()).unwrap(), "eng+kor");
        assert_eq!(pool.recognize_text("eng+kor", &page()).unwrap(), "eng+kor");
        assert_eq!(pool.created_count(), 1);
    }

    // =========================================================================
    // Failure handling
    // =========================================================================

    struct FlakyFactory {
        attempts: AtomicUsize,
    }

    impl OcrEngineFactory for FlakyFactory {
        fn create(&self, language: &str) -> Result<Box<dyn OcrEngine>, OcrError> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(OcrError::Initialization {
                    language: language.to_string(),
                    message: "transient".to_string(),
                });
            }
            Ok(Box::new(TrackerEngine {
                language: language.to_string(),
                tracker: Arc::new(Tracker::default()),
                hold: Duration::from_millis(0),
                wait_for_overlap: false,
            }))
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[test]
    fn test_failed_creation_is_not_cached() {
        let pool = OcrEnginePool::new(Arc::new(FlakyFactory {
            attempts: AtomicUsize::new(0),
        }));

        assert!(matches!(
            pool.recognize_text("eng", &page()),
            Err(OcrError::Initialization { .. })
        ));
        assert!(pool.languages().is_empty());

        assert_eq!(pool.recognize_text("eng", &page()).unwrap(), "eng");
        assert_eq!(pool.created_count(), 1);
    }

    struct PanicOnceEngine {
        panicked: Arc<AtomicBool>,
    }

    impl OcrEngine for PanicOnceEngine {
        fn recognize(&mut self, _image: &RgbaImage) -> Result<String, OcrError> {
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("engine crashed");
            }
            Ok("recovered".to_string())
        }
    }

    struct PanicOnceFactory {
        panicked: Arc<AtomicBool>,
    }

    impl OcrEngineFactory for PanicOnceFactory {
        fn create(&self, _language: &str) -> Result<Box<dyn OcrEngine>, OcrError> {
            Ok(Box::new(PanicOnceEngine {
                panicked: self.panicked.clone(),
            }))
        }

        fn name(&self) -> &'static str {
            "panic-once"
        }
    }

    #[test]
    fn test_engine_rebuilt_after_panic() {
        let pool = OcrEnginePool::new(Arc::new(PanicOnceFactory {
            panicked: Arc::new(AtomicBool::new(false)),
        }));

        let crashed = catch_unwind(AssertUnwindSafe(|| pool.recognize_text("eng", &page())));
        assert!(crashed.is_err());

        assert_eq!(pool.recognize_text("eng", &page()).unwrap(), "recovered");
        assert_eq!(pool.created_count(), 2);
    }

    #[test]
    fn test_invalid_language_tags_rejected() {
        let pool = OcrEnginePool::new(Arc::new(TrackerFactory::new(Arc::new(Tracker::default()))));

        for tag in ["", "../eng", "eng+", "e n g", "eng/kor"] {
            assert!(
                matches!(pool.recognize_text(tag, &page()), Err(OcrError::InvalidLanguage(_))),
                "tag {:?} should be rejected",
                tag
            );
        }
        assert_eq!(pool.created_count(), 0);
    }

    #[test]
    fn test_unavailable_backend_reports_missing_model_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("eng.traineddata"), b"model").unwrap();
        let pool = OcrEnginePool::new(Arc::new(UnavailableEngineFactory::new(
            ModelDirectory::new(dir.path()),
        )));

        assert!(matches!(
            pool.recognize_text("xxx", &page()),
            Err(OcrError::ModelMissing { .. })
        ));
        assert!(matches!(
            pool.recognize_text("eng", &page()),
            Err(OcrError::EngineUnavailable(_))
        ));
        assert_eq!(pool.backend(), "unavailable");
    }
}

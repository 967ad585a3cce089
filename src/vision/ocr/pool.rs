// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-language OCR engine pool
//!
//! One slot per language tag lives in a map that is only locked long enough
//! to look the slot up. Each slot owns a mutex around its engine, which is
//! held both while the engine is created (so concurrent first requests build
//! exactly one engine) and for the whole of a recognition call (so a language
//! never runs two recognitions at once). Different languages never contend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbaImage;
use tracing::{debug, info, warn};

use super::engine::{normalize_text, ModelDirectory, OcrEngine, OcrEngineFactory};
use super::OcrError;

type EngineSlot = Option<Box<dyn OcrEngine>>;

struct LanguageSlot {
    language: String,
    engine: Mutex<EngineSlot>,
    ready: AtomicBool,
}

impl LanguageSlot {
    fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            engine: Mutex::new(None),
            ready: AtomicBool::new(false),
        }
    }

    /// Lock the engine. A panic inside a previous recognition leaves the
    /// engine in an unknown state, so it is dropped and rebuilt on demand.
    fn lock(&self) -> MutexGuard<'_, EngineSlot> {
        match self.engine.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    "OCR engine for '{}' panicked earlier, discarding it",
                    self.language
                );
                let mut guard = poisoned.into_inner();
                *guard = None;
                self.ready.store(false, Ordering::SeqCst);
                self.engine.clear_poison();
                guard
            }
        }
    }
}

/// Cached engine for one language tag
#[derive(Clone)]
pub struct EngineHandle {
    slot: Arc<LanguageSlot>,
}

impl EngineHandle {
    pub fn language(&self) -> &str {
        &self.slot.language
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("language", &self.slot.language)
            .finish()
    }
}

/// Lazily created, process-lifetime OCR engines keyed by language tag
pub struct OcrEnginePool {
    factory: Arc<dyn OcrEngineFactory>,
    slots: Mutex<HashMap<String, Arc<LanguageSlot>>>,
    created: AtomicUsize,
}

impl OcrEnginePool {
    pub fn new(factory: Arc<dyn OcrEngineFactory>) -> Self {
        Self {
            factory,
            slots: Mutex::new(HashMap::new()),
            created: AtomicUsize::new(0),
        }
    }

    /// Backend name of the underlying factory
    pub fn backend(&self) -> &'static str {
        self.factory.name()
    }

    /// Get the engine for `language`, creating it on first use.
    ///
    /// A failed creation is not cached; the next call tries again.
    pub fn engine(&self, language: &str) -> Result<EngineHandle, OcrError> {
        let slot = self.slot(language)?;
        {
            let mut engine = slot.lock();
            self.ensure_created(&slot, &mut engine)?;
        }
        Ok(EngineHandle { slot })
    }

    /// Run recognition on a handle's engine and return normalized text.
    ///
    /// Holds the language lock for the whole call; the guard is released on
    /// every exit path, including engine errors.
    pub fn recognize(&self, handle: &EngineHandle, image: &RgbaImage) -> Result<String, OcrError> {
        self.run(&handle.slot, image)
    }

    /// `engine(language)` followed by `recognize`, under a single lock
    pub fn recognize_text(&self, language: &str, image: &RgbaImage) -> Result<String, OcrError> {
        let slot = self.slot(language)?;
        self.run(&slot, image)
    }

    /// Languages that currently have a live engine, sorted
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self
            .lock_slots()
            .values()
            .filter(|slot| slot.ready.load(Ordering::SeqCst))
            .map(|slot| slot.language.clone())
            .collect();
        languages.sort();
        languages
    }

    /// Number of engines the factory has built so far
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn run(&self, slot: &LanguageSlot, image: &RgbaImage) -> Result<String, OcrError> {
        let mut guard = slot.lock();
        self.ensure_created(slot, &mut guard)?;
        let engine = guard
            .as_mut()
            .ok_or_else(|| OcrError::EngineUnavailable(slot.language.clone()))?;

        debug!(
            "Running OCR ({}) on {}x{} image",
            slot.language,
            image.width(),
            image.height()
        );
        let raw = engine.recognize(image)?;
        Ok(normalize_text(&raw))
    }

    fn ensure_created(&self, slot: &LanguageSlot, engine: &mut EngineSlot) -> Result<(), OcrError> {
        if engine.is_some() {
            return Ok(());
        }
        let created = self.factory.create(&slot.language)?;
        self.created.fetch_add(1, Ordering::SeqCst);
        info!(
            "Created {} OCR engine for '{}'",
            self.factory.name(),
            slot.language
        );
        *engine = Some(created);
        slot.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn slot(&self, language: &str) -> Result<Arc<LanguageSlot>, OcrError> {
        ModelDirectory::components(language)?;
        let mut slots = self.lock_slots();
        Ok(slots
            .entry(language.to_string())
            .or_insert_with(|| Arc::new(LanguageSlot::new(language)))
            .clone())
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Arc<LanguageSlot>>> {
        // Only map inserts happen under this lock; recover rather than fail.
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

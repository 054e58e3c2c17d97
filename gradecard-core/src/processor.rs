use crate::cache::{CacheIndexEntry, ResultCacheKey, ResultCacheValue};
use crate::config::ParsingConfig;
use crate::error::{GradecardError, GradecardResult};
use crate::extract::{extract_catalog, BlockSegmenter, ExamInfoExtractor, NoiseFilter, StudentParser};
use crate::provider::{JsonTextProvider, TextProvider};
use crate::stats::ResultAnalytics;
use crate::storage::{calculate_config_hash, calculate_content_hash, FileStorage, ResultStorage};
use crate::types::*;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        log::info!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        log::info!("📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            log::info!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        log::info!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// Run the extraction pipeline over one document.
///
/// Page 1 supplies the course catalog and exam header; every later page
/// supplies student lines. The result depends only on `document` and
/// `config`.
pub fn parse_document(document: &DocumentText, config: &ParsingConfig) -> GradecardResult<ParseOutcome> {
    parse_document_with_profiler(document, config, &mut StepProfiler::new(false))
}

pub fn parse_document_with_profiler(
    document: &DocumentText,
    config: &ParsingConfig,
    profiler: &mut StepProfiler,
) -> GradecardResult<ParseOutcome> {
    let first_page = document.pages.first().ok_or(GradecardError::EmptyDocument)?;

    // Stage 1: catalog + exam header
    let (catalog, exam_info) = profiler.time_step("Course Metadata", || -> GradecardResult<_> {
        let catalog = extract_catalog(&first_page.tables, &config.catalog)?;
        let exam_info = ExamInfoExtractor::new()?.extract(&first_page.lines);
        Ok((catalog, exam_info))
    })?;
    log::info!(
        "📚 {} / {} / {}: {} subjects",
        exam_info.program,
        exam_info.semester,
        exam_info.examination,
        catalog.len()
    );

    // Stage 2: student blocks from page 2 onwards
    let noise = NoiseFilter::new(&config.noise, &catalog);
    let blocks = profiler.time_step("Block Segmentation", || -> GradecardResult<_> {
        let mut segmenter = BlockSegmenter::new(&noise)?;
        for (index, page) in document.pages.iter().enumerate().skip(1) {
            segmenter.push_page(index + 1, page.lines.as_slice());
        }
        Ok(segmenter.finish())
    })?;
    log::debug!("🧱 {} candidate student blocks", blocks.len());

    // Stage 3: one student per block
    let parser = StudentParser::new(&catalog, config.grade_average.clone())?;
    let (students, rejected) = profiler.time_step("Student Parsing", || {
        let mut students = Vec::with_capacity(blocks.len());
        let mut rejected = Vec::new();
        for block in &blocks {
            match parser.parse(block) {
                Ok(student) => students.push(student),
                Err(mismatch) => rejected.push(mismatch),
            }
        }
        (students, rejected)
    });
    for mismatch in &rejected {
        log::warn!(
            "⚠️  Page {}: unrecognised student header, block dropped: {}",
            mismatch.page,
            mismatch.header_line
        );
    }

    // Stage 4: corpus statistics
    let statistics = profiler.time_step("Aggregation", || ResultAnalytics::compute_statistics(&students, &catalog));
    log::info!(
        "🎓 {} students parsed ({} passed), {} blocks unparsed",
        statistics.total_students,
        statistics.passed_students,
        rejected.len()
    );

    Ok(ParseOutcome {
        result: ParseResult {
            exam_info,
            max_marks: catalog.total_max_marks(),
            course_metadata: catalog,
            students,
            statistics,
            unparsed_blocks: rejected.len(),
        },
        rejected,
    })
}

pub struct GradecardProcessor {
    provider: Box<dyn TextProvider>,
    storage: Box<dyn ResultStorage + Send + Sync>,
}

impl GradecardProcessor {
    /// Create GradecardProcessor with full dependency injection
    pub fn new_with_dependencies(
        provider: Box<dyn TextProvider>,
        storage: Box<dyn ResultStorage + Send + Sync>,
    ) -> Result<Self> {
        Ok(Self { provider, storage })
    }

    /// Convenience constructor for CLI usage: JSON page dumps, file cache
    pub fn new_cli(cache_dir: &str) -> Result<Self> {
        let provider = Box::new(JsonTextProvider::new());
        let storage = Box::new(FileStorage::new(cache_dir)?);
        Self::new_with_dependencies(provider, storage)
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Pure pipeline over already extracted page text
    pub fn parse_document(&self, document: &DocumentText, config: &ParsingConfig) -> Result<ParseOutcome> {
        Ok(parse_document(document, config)?)
    }

    /// Process file with specific config
    pub fn process_file_with_config(&self, input_path: &str, config: &ParsingConfig) -> Result<ParseResult> {
        self.process_file_with_config_and_profiling(input_path, config, false, false)
    }

    /// Document bytes + config -> ParseResult, memoised by content and config hash
    pub fn process_file_with_config_and_profiling(
        &self,
        input_path: &str,
        config: &ParsingConfig,
        enable_profiling: bool,
        skip_cache: bool,
    ) -> Result<ParseResult> {
        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(enable_profiling);

        if !self.provider.supports_file_type(Path::new(input_path)) {
            log::warn!(
                "⚠️  {} does not look like a {} page dump, trying anyway",
                input_path,
                self.provider.name()
            );
        }

        let bytes = std::fs::read(input_path).with_context(|| format!("Failed to read {}", input_path))?;

        let cache_key = profiler.time_step("Cache Key Generation", || -> Result<ResultCacheKey> {
            let content_hash = calculate_content_hash(&bytes);
            let config_hash = calculate_config_hash(config)?;
            Ok(ResultCacheKey::new(content_hash, config_hash))
        })?;

        let cached_result = if skip_cache {
            log::info!("🚫 Skipping cache lookup (--skip-cache enabled)");
            None
        } else {
            profiler.time_step("Cache Lookup", || self.storage.get_result(&cache_key))?
        };

        if let Some(cached) = cached_result {
            log::info!("🎯 Cache hit: Found result for document + config combination");
            profiler.log_summary();
            return Ok(cached.result);
        }

        log::info!("📄 Processing document with config: {}", input_path);

        let markup = profiler.time_step("Bytes → Markup", || self.provider.read_markup(&bytes))?;
        let document = profiler.time_step("Markup → Pages", || self.provider.parse_markup(&markup))?;
        let outcome = parse_document_with_profiler(&document, config, &mut profiler)?;

        if !skip_cache {
            profiler.time_step("Cache Storage", || {
                let processing_time = start_time.elapsed().as_millis() as u64;
                let filename = Path::new(input_path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| input_path.to_string());
                let cache_value = ResultCacheValue::new(outcome.result.clone(), &filename, &cache_key, processing_time);
                self.storage.store_result(&cache_key, &cache_value)
            })?;
        } else {
            log::info!("🚫 Skipping cache storage (--skip-cache enabled)");
        }

        profiler.log_summary();
        log::info!("⏱️  Total processing time: {:.0}ms", start_time.elapsed().as_millis());
        Ok(outcome.result)
    }

    /// Process file using default config
    pub fn process_file(&self, input_path: &str) -> Result<ParseResult> {
        self.process_file_with_config(input_path, &ParsingConfig::default())
    }

    pub fn list_cached_results(&self) -> Result<Vec<CacheIndexEntry>> {
        self.storage.list_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NoOpStorage;

    fn cell(value: &str) -> TableCell {
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn document() -> DocumentText {
        let table: Table = vec![
            vec![cell("Course Code")],
            vec![cell("")],
            ["10411", "Maths", "3", "8", "20", "32", "80", "...", "...", "...", "...", "40", "100"]
                .iter()
                .map(|c| cell(c))
                .collect(),
        ];
        let mut first = PageText::from_lines(&["OFFICE REGISTER FOR THE Bachelor of Engineering ( Semester - II )"]);
        first.tables.push(table);

        DocumentText {
            pages: vec![
                first,
                PageText::from_lines(&[
                    "1311071 ALICE KUMAR Regular FEMALE (MU1) College",
                    "E1 60 P",
                    "I1 15 P (75) PASS",
                    "TOT 75 9 A+ 3 27.0 3 27.0 9.0",
                    "1311072 BROKEN HEADER",
                ]),
            ],
        }
    }

    #[test]
    fn profiler_disabled_records_nothing() {
        let mut profiler = StepProfiler::new(false);
        assert_eq!(profiler.time_step("step", || 41 + 1), 42);
        assert!(profiler.timings().is_empty());

        let mut profiler = StepProfiler::new(true);
        profiler.time_step("step", || ());
        assert_eq!(profiler.timings().len(), 1);
        assert_eq!(profiler.timings()[0].0, "step");
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = parse_document(&DocumentText::default(), &ParsingConfig::default()).unwrap_err();
        assert!(matches!(err, GradecardError::EmptyDocument));
    }

    #[test]
    fn catalog_failure_aborts_the_document() {
        let document = DocumentText {
            pages: vec![PageText::from_lines(&["no tables here"])],
        };
        let err = parse_document(&document, &ParsingConfig::default()).unwrap_err();
        assert!(matches!(err, GradecardError::EmptyCatalog));
    }

    #[test]
    fn rejected_blocks_are_counted() {
        let outcome = parse_document(&document(), &ParsingConfig::default()).unwrap();

        assert_eq!(outcome.result.students.len(), 1);
        assert_eq!(outcome.result.unparsed_blocks, 1);
        assert_eq!(outcome.rejected[0].header_line, "1311072 BROKEN HEADER");
        assert_eq!(outcome.rejected[0].page, 2);
        assert_eq!(outcome.result.max_marks, 100);
        assert_eq!(outcome.result.exam_info.semester, "Sem II");

        let alice = &outcome.result.students[0];
        assert_eq!(alice.max_marks, 100);
        assert_eq!(alice.cgpa, 9.0);
        assert_eq!(alice.subjects[0].total, Some(75));
    }

    #[test]
    fn processor_with_noop_storage_parses_files() {
        let path = std::env::temp_dir().join("gradecard_processor_test.json");
        std::fs::write(&path, serde_json::to_string(&document()).unwrap()).unwrap();

        let processor =
            GradecardProcessor::new_with_dependencies(Box::new(JsonTextProvider::new()), Box::new(NoOpStorage::new()))
                .unwrap();
        let result = processor
            .process_file_with_config_and_profiling(path.to_str().unwrap(), &ParsingConfig::default(), true, false)
            .unwrap();

        assert_eq!(result.students.len(), 1);
        assert_eq!(processor.provider_name(), "json");
        assert!(processor.list_cached_results().unwrap().is_empty());

        std::fs::remove_file(path).ok();
    }
}

//! Integration tests for the batch driver.
//!
//! Every test runs against a scripted in-process backend and a temporary
//! folder layout, so no network access or API key is needed.

use async_trait::async_trait;
use cv_extract::{
    extract_sync, process_all_sync, BatchProgressCallback, CvExtractError, DocumentError,
    ExtractionConfig, Extractor, InferenceBackend, InferenceRequest, InferenceResponse,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs through the test harness; `RUST_LOG=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Answers calls from a queue of scripted replies, in order, and records
/// every request it receives.
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, DocumentError>>>,
    calls: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<String, DocumentError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Same answer for every call.
    fn always(text: &str, times: usize) -> Arc<Self> {
        Self::new((0..times).map(|_| Ok(text.to_string())).collect())
    }

    fn calls(&self) -> Vec<InferenceRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &InferenceRequest) -> Result<InferenceResponse, DocumentError> {
        self.calls.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("backend called more often than scripted");
        reply.map(InferenceResponse::from_text)
    }
}

/// Records callback events as short strings.
#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl BatchProgressCallback for EventLog {
    fn on_batch_start(&self, _input_dir: &Path, total_files: usize) {
        self.0.lock().unwrap().push(format!("start:{total_files}"));
    }
    fn on_document_start(&self, index: usize, total: usize, source: &Path) {
        let name = source.file_name().unwrap().to_string_lossy().into_owned();
        self.0.lock().unwrap().push(format!("doc:{index}/{total}:{name}"));
    }
    fn on_document_complete(&self, index: usize, _total: usize, _output_path: &Path) {
        self.0.lock().unwrap().push(format!("ok:{index}"));
    }
    fn on_document_error(&self, index: usize, _total: usize, _error: &str) {
        self.0.lock().unwrap().push(format!("err:{index}"));
    }
    fn on_batch_complete(&self, total_files: usize, succeeded: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("done:{succeeded}/{total_files}"));
    }
}

struct Workspace {
    _root: TempDir,
    input: PathBuf,
    output: PathBuf,
    prompt: PathBuf,
}

impl Workspace {
    /// Layout without creating any folder; the batch must create them.
    fn new() -> Self {
        init_tracing();
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("cv_inp");
        let output = root.path().join("cv_out");
        let prompt = root.path().join("prompt.txt");
        Self {
            _root: root,
            input,
            output,
            prompt,
        }
    }

    fn with_prompt(self, text: &str) -> Self {
        std::fs::write(&self.prompt, text).unwrap();
        self
    }

    fn add_input(&self, name: &str, bytes: &[u8]) -> PathBuf {
        std::fs::create_dir_all(&self.input).unwrap();
        let path = self.input.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn config(&self) -> ExtractionConfig {
        ExtractionConfig::builder()
            .input_dir(&self.input)
            .output_dir(&self.output)
            .prompt_file(&self.prompt)
            .build()
            .unwrap()
    }

    fn read_output(&self, name: &str) -> String {
        std::fs::read_to_string(self.output.join(name)).unwrap()
    }

    fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.output)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resume_pdf_is_written_as_pretty_json() {
    let ws = Workspace::new().with_prompt("Return name and email as JSON.\n");
    ws.add_input("resume.pdf", b"%PDF-1.4\n");
    let backend = ScriptedBackend::always(
        "```json\n{\"name\": \"Jane Doe\", \"email\": \"jane@x.io\"}\n```",
        1,
    );

    let report = Extractor::with_backend(ws.config(), backend.clone())
        .process_all()
        .await
        .unwrap();

    assert_eq!(report.stats.total_files, 1);
    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(
        ws.read_output("resume_extracted.json"),
        "{\n  \"name\": \"Jane Doe\",\n  \"email\": \"jane@x.io\"\n}"
    );

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "Return name and email as JSON.");
    assert_eq!(calls[0].document.mime_type, "application/pdf");
    assert_eq!(calls[0].document.data, "JVBERi0xLjQK");
}

#[tokio::test]
async fn non_json_answer_fails_that_file_only() {
    let ws = Workspace::new().with_prompt("p");
    ws.add_input("a.png", b"png");
    ws.add_input("b.jpg", b"jpg");
    let backend = ScriptedBackend::new(vec![
        Ok("Sorry, I cannot read this document.".into()),
        Ok("{\"name\": \"Bo\"}".into()),
    ]);

    let report = Extractor::with_backend(ws.config(), backend)
        .process_all()
        .await
        .unwrap();

    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(report.stats.failed, 1);
    let failed = &report.documents[0];
    assert!(matches!(
        failed.error,
        Some(DocumentError::MalformedRecord { .. })
    ));
    assert_eq!(ws.output_names(), ["b_extracted.json"]);
}

#[tokio::test]
async fn backend_error_is_recorded_and_batch_continues() {
    let ws = Workspace::new().with_prompt("p");
    ws.add_input("1.pdf", b"%PDF");
    ws.add_input("2.pdf", b"%PDF");
    let backend = ScriptedBackend::new(vec![
        Err(DocumentError::ApiError {
            provider: "scripted".into(),
            status: 400,
            message: "API key not valid. Please pass a valid API key.".into(),
        }),
        Ok("{}".into()),
    ]);

    let report = Extractor::with_backend(ws.config(), backend)
        .process_all()
        .await
        .unwrap();

    let message = report.documents[0].error.as_ref().unwrap().to_string();
    assert!(message.contains("API key not valid"), "got: {message}");
    assert_eq!(ws.output_names(), ["2_extracted.json"]);
    assert_eq!(ws.read_output("2_extracted.json"), "{}");
}

#[tokio::test]
async fn missing_prompt_fails_every_file_without_calls() {
    let ws = Workspace::new();
    ws.add_input("a.pdf", b"%PDF");
    ws.add_input("b.pdf", b"%PDF");
    let backend = ScriptedBackend::new(vec![]);

    let report = Extractor::with_backend(ws.config(), backend.clone())
        .process_all()
        .await
        .unwrap();

    assert_eq!(report.stats.total_files, 2);
    assert_eq!(report.stats.failed, 2);
    for doc in &report.documents {
        assert!(matches!(
            doc.error,
            Some(DocumentError::PromptFileNotFound { .. })
        ));
    }
    assert!(backend.calls().is_empty());
    assert!(ws.output_names().is_empty());
}

#[tokio::test]
async fn empty_folder_makes_no_calls() {
    let ws = Workspace::new().with_prompt("p");
    let backend = ScriptedBackend::new(vec![]);
    let events = Arc::new(EventLog::default());
    let config = ExtractionConfig::builder()
        .input_dir(&ws.input)
        .output_dir(&ws.output)
        .prompt_file(&ws.prompt)
        .progress_callback(events.clone())
        .build()
        .unwrap();

    let report = Extractor::with_backend(config, backend.clone())
        .process_all()
        .await
        .unwrap();

    assert!(report.is_empty());
    assert!(backend.calls().is_empty());
    assert!(ws.input.is_dir());
    assert!(ws.output.is_dir());
    assert!(ws.output_names().is_empty());
    assert_eq!(*events.0.lock().unwrap(), ["start:0", "done:0/0"]);
}

#[tokio::test]
async fn subfolders_are_not_processed() {
    let ws = Workspace::new().with_prompt("p");
    ws.add_input("top.pdf", b"%PDF");
    std::fs::create_dir_all(ws.input.join("archive")).unwrap();
    std::fs::write(ws.input.join("archive").join("old.pdf"), b"%PDF").unwrap();
    let backend = ScriptedBackend::always("{\"ok\": true}", 1);

    let report = Extractor::with_backend(ws.config(), backend.clone())
        .process_all()
        .await
        .unwrap();

    assert_eq!(report.stats.total_files, 1);
    assert_eq!(backend.calls().len(), 1);
    assert_eq!(ws.output_names(), ["top_extracted.json"]);
}

#[tokio::test]
async fn rerun_overwrites_previous_output() {
    let ws = Workspace::new().with_prompt("p");
    ws.add_input("cv.pdf", b"%PDF");

    let first = ScriptedBackend::always("{\"version\": 1}", 1);
    Extractor::with_backend(ws.config(), first)
        .process_all()
        .await
        .unwrap();

    let second = ScriptedBackend::always("{\"version\": 2}", 1);
    Extractor::with_backend(ws.config(), second)
        .process_all()
        .await
        .unwrap();

    assert_eq!(ws.read_output("cv_extracted.json"), "{\n  \"version\": 2\n}");
    assert_eq!(ws.output_names(), ["cv_extracted.json"]);
}

#[tokio::test]
async fn files_are_processed_in_name_order_with_events() {
    let ws = Workspace::new().with_prompt("p");
    ws.add_input("c.webp", b"c");
    ws.add_input("a.pdf", b"a");
    ws.add_input("b.txt", b"b");
    let backend = ScriptedBackend::new(vec![
        Ok("{}".into()),
        Ok("not json".into()),
        Ok("[]".into()),
    ]);
    let events = Arc::new(EventLog::default());
    let config = ExtractionConfig::builder()
        .input_dir(&ws.input)
        .output_dir(&ws.output)
        .prompt_file(&ws.prompt)
        .progress_callback(events.clone())
        .build()
        .unwrap();

    let report = Extractor::with_backend(config, backend.clone())
        .process_all()
        .await
        .unwrap();

    let mime_types: Vec<String> = backend
        .calls()
        .into_iter()
        .map(|r| r.document.mime_type)
        .collect();
    // .txt is not a known type and falls back to the default label.
    assert_eq!(mime_types, ["application/pdf", "image/jpeg", "image/webp"]);

    assert_eq!(
        *events.0.lock().unwrap(),
        [
            "start:3",
            "doc:1/3:a.pdf",
            "ok:1",
            "doc:2/3:b.txt",
            "err:2",
            "doc:3/3:c.webp",
            "ok:3",
            "done:2/3",
        ]
    );

    for doc in &report.documents {
        assert_ne!(doc.output_path.is_some(), doc.error.is_some());
    }
}

#[tokio::test]
async fn prompt_is_read_for_each_document() {
    // Swap the prompt between files from inside the backend.
    struct PromptSwapper {
        prompt_file: PathBuf,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InferenceBackend for PromptSwapper {
        fn name(&self) -> &str {
            "swapper"
        }

        async fn generate(
            &self,
            request: &InferenceRequest,
        ) -> Result<InferenceResponse, DocumentError> {
            self.seen.lock().unwrap().push(request.prompt.clone());
            std::fs::write(&self.prompt_file, "second prompt").unwrap();
            Ok(InferenceResponse::from_text("{}"))
        }
    }

    let ws = Workspace::new().with_prompt("first prompt");
    ws.add_input("a.pdf", b"a");
    ws.add_input("b.pdf", b"b");
    let backend = Arc::new(PromptSwapper {
        prompt_file: ws.prompt.clone(),
        seen: Mutex::new(Vec::new()),
    });

    Extractor::with_backend(ws.config(), backend.clone())
        .process_all()
        .await
        .unwrap();

    assert_eq!(
        *backend.seen.lock().unwrap(),
        ["first prompt", "second prompt"]
    );
}

// ── Blocking wrappers ────────────────────────────────────────────────────────

#[test]
fn process_all_sync_runs_the_batch() {
    let ws = Workspace::new().with_prompt("p");
    ws.add_input("cv.png", b"png");
    ws.add_input("notes.pdf", b"%PDF");
    let backend = ScriptedBackend::new(vec![
        Ok("{\"name\": \"Ana\"}".into()),
        Ok("no record here".into()),
    ]);
    let config = ExtractionConfig::builder()
        .input_dir(&ws.input)
        .output_dir(&ws.output)
        .prompt_file(&ws.prompt)
        .backend(backend.clone())
        .build()
        .unwrap();

    let report = process_all_sync(&config).unwrap();

    assert_eq!(report.stats.total_files, 2);
    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(
        report.documents[0].output_path.as_deref(),
        Some(ws.output.join("cv_extracted.json").as_path())
    );
    assert_eq!(ws.read_output("cv_extracted.json"), "{\n  \"name\": \"Ana\"\n}");
    assert_eq!(ws.output_names(), ["cv_extracted.json"]);
    assert_eq!(backend.calls().len(), 2);
    assert!(matches!(
        report.into_result(),
        Err(CvExtractError::PartialFailure { succeeded: 1, failed: 1, total: 2 })
    ));
}

#[test]
fn extract_sync_returns_record_without_writing() {
    let ws = Workspace::new().with_prompt("p");
    let doc = ws.add_input("resume.pdf", b"%PDF-1.4\n");
    let backend = ScriptedBackend::always("```json\n{\"email\": \"jane@x.io\"}\n```", 1);
    let config = ExtractionConfig::builder()
        .input_dir(&ws.input)
        .output_dir(&ws.output)
        .prompt_file(&ws.prompt)
        .backend(backend.clone())
        .build()
        .unwrap();

    let output = extract_sync(&doc, &config).unwrap();

    assert_eq!(output.record["email"], "jane@x.io");
    assert_eq!(output.mime_type, "application/pdf");
    assert_eq!(backend.calls()[0].document.data, "JVBERi0xLjQK");
    assert!(!ws.output.exists());
}

#[test]
fn extract_sync_wraps_document_errors() {
    let ws = Workspace::new();
    let doc = ws.add_input("resume.pdf", b"%PDF");
    let config = ExtractionConfig::builder()
        .prompt_file(&ws.prompt)
        .backend(ScriptedBackend::new(vec![]))
        .build()
        .unwrap();

    let err = extract_sync(&doc, &config).unwrap_err();
    assert!(
        matches!(err, CvExtractError::Document(DocumentError::PromptFileNotFound { .. })),
        "got: {err:?}"
    );
}

//! Integration tests for the file-level API: single files, batches and the
//! streaming variant. All I/O happens inside temporary directories.

use futures::StreamExt;
use reflow_text::{
    clean_file, clean_files, clean_files_stream, clean_to_file, process, BatchConfig,
    BatchProgressCallback, CleanOptions, FileError, ReflowError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("reflow_text=debug")
        .with_test_writer()
        .try_init();
}

fn expected(text: &str) -> String {
    process(text, &CleanOptions::default()).unwrap().text
}

#[derive(Default)]
struct CountingCallback {
    batch_total: AtomicUsize,
    started: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    batch_success: AtomicUsize,
}

impl BatchProgressCallback for CountingCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.batch_total.store(total_files, Ordering::SeqCst);
    }

    fn on_file_start(&self, _index: usize, _total: usize, _path: &Path) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_file_complete(&self, _index: usize, _total: usize, _chars: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_file_error(&self, _index: usize, _total: usize, _error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_complete(&self, _total_files: usize, success_count: usize) {
        self.batch_success.store(success_count, Ordering::SeqCst);
    }
}

// ── Single files ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_clean_file_matches_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let text = "## 标题\n\n**重点**内容!!";
    let path = write(&dir, "answer.md", text);

    let out = clean_file(&path, &CleanOptions::default()).await.unwrap();
    assert_eq!(out.text, expected(text));
    assert!(!out.text.contains("**"));
}

#[tokio::test]
async fn test_clean_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = clean_file(dir.path().join("nope.md"), &CleanOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReflowError::FileNotFound { .. }));
}

#[tokio::test]
async fn test_clean_to_file_writes_with_final_newline() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(&dir, "in.txt", "支持Python3.11");
    let output = dir.path().join("out/cleaned.txt");

    let out = clean_to_file(&input, &output, &CleanOptions::default())
        .await
        .unwrap();
    assert_eq!(out.text, "支持 Python 3.11");
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "支持 Python 3.11\n"
    );
    // Input untouched.
    assert_eq!(std::fs::read_to_string(&input).unwrap(), "支持Python3.11");
}

#[test]
fn test_clean_file_from_sync_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "a.txt", "你好,世界");
    let out = tokio_test::block_on(clean_file(&path, &CleanOptions::default())).unwrap();
    assert_eq!(out.text, "你好，世界");
}

// ── Batches ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_writes_sibling_files_in_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let texts = ["第一份\n被截断的。", "## 第二份\n\n内容", "第三份!!"];
    let paths: Vec<PathBuf> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| write(&dir, &format!("f{i}.md"), t))
        .collect();

    let config = BatchConfig::builder().concurrency(2).build().unwrap();
    let batch = clean_files(&paths[..], &config).await.unwrap();

    assert_eq!(batch.stats.total_files, 3);
    assert_eq!(batch.stats.succeeded, 3);
    assert_eq!(batch.stats.failed, 0);
    for (i, file) in batch.files.iter().enumerate() {
        assert_eq!(file.index, i);
        assert_eq!(file.input, paths[i]);
        assert_eq!(file.text, expected(texts[i]));
        let output = file.output.as_ref().unwrap();
        assert_eq!(output, &dir.path().join(format!("f{i}.clean.md")));
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            format!("{}\n", file.text)
        );
    }
    assert!(batch.stats.mean_score > 0.0);
}

#[tokio::test]
async fn test_batch_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(&dir, "notes.md", "内容。");
    let out_dir = dir.path().join("cleaned");

    let config = BatchConfig::builder().output_dir(&out_dir).build().unwrap();
    let batch = clean_files(&[&input], &config).await.unwrap();

    assert_eq!(batch.files[0].output, Some(out_dir.join("notes.md")));
    assert_eq!(
        std::fs::read_to_string(out_dir.join("notes.md")).unwrap(),
        "内容。\n"
    );
}

#[tokio::test]
async fn test_batch_in_memory_only() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(&dir, "a.md", "**粗体**");

    let config = BatchConfig::builder().write_output(false).build().unwrap();
    let batch = clean_files(&[&input], &config).await.unwrap();

    assert_eq!(batch.files[0].text, "粗体");
    assert!(batch.files[0].output.is_none());
    assert!(!dir.path().join("a.clean.md").exists());
}

#[tokio::test]
async fn test_batch_partial_failure_reports_per_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let good = write(&dir, "good.md", "好！！");
    let missing = dir.path().join("missing.md");

    let cb = Arc::new(CountingCallback::default());
    let config = BatchConfig::builder()
        .write_output(false)
        .progress_callback(cb.clone())
        .build()
        .unwrap();
    let batch = clean_files(&[good, missing], &config).await.unwrap();

    assert_eq!(batch.stats.succeeded, 1);
    assert_eq!(batch.stats.failed, 1);
    assert!(batch.files[0].error.is_none());
    assert!(matches!(
        batch.files[1].error,
        Some(FileError::NotFound { index: 1, .. })
    ));
    assert!(batch.files[1].report.is_none());

    assert_eq!(cb.batch_total.load(Ordering::SeqCst), 2);
    assert_eq!(cb.started.load(Ordering::SeqCst), 2);
    assert_eq!(cb.completed.load(Ordering::SeqCst), 1);
    assert_eq!(cb.failed.load(Ordering::SeqCst), 1);
    assert_eq!(cb.batch_success.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_batch_all_failed() {
    let dir = tempfile::tempdir().unwrap();
    let paths = [dir.path().join("a.md"), dir.path().join("b.md")];

    let err = clean_files(&paths[..], &BatchConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReflowError::AllFilesFailed { total: 2, .. }));
}

#[tokio::test]
async fn test_batch_rejects_empty_list() {
    let paths: Vec<PathBuf> = Vec::new();
    let err = clean_files(&paths[..], &BatchConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReflowError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_batch_stats_serialize() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(&dir, "a.md", "内容。");
    let config = BatchConfig::builder().write_output(false).build().unwrap();
    let batch = clean_files(&[&input], &config).await.unwrap();

    let json = serde_json::to_value(&batch).unwrap();
    assert_eq!(json["stats"]["succeeded"], 1);
    assert_eq!(json["files"][0]["text"], "内容。");
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_yields_every_file() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(&dir, "a.md", "第一!!");
    let b = write(&dir, "b.md", "第二??");
    let missing = dir.path().join("c.md");

    let config = BatchConfig::builder()
        .write_output(false)
        .concurrency(3)
        .build()
        .unwrap();
    let stream = clean_files_stream(&[a, b, missing], &config).unwrap();
    let results: Vec<_> = stream.collect().await;

    assert_eq!(results.len(), 3);
    let mut ok: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    ok.sort_by_key(|f| f.index);
    assert_eq!(ok.len(), 2);
    assert_eq!(ok[0].text, "第一！");
    assert_eq!(ok[1].text, "第二？");

    let errors: Vec<&FileError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].index(), 2);
}

#[test]
fn test_stream_rejects_empty_list() {
    let paths: [&str; 0] = [];
    assert!(clean_files_stream(&paths, &BatchConfig::default()).is_err());
}

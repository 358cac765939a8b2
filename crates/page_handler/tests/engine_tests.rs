use net::fetcher::{FetchResponse, Fetcher};
use page_handler::lifecycle::LifecycleStage;
use page_handler::{Engine, OutputMode, RenderOptions};
use std::sync::{Arc, Mutex};

/// Fetcher for tests that never touch the network.
struct NoFetch;

impl Fetcher for NoFetch {
    fn fetch(&self, url: &str) -> FetchResponse {
        FetchResponse {
            error: format!("unexpected fetch of {url}"),
            ..FetchResponse::default()
        }
    }
}

fn offline_engine() -> Engine {
    Engine::with_fetcher(Box::new(NoFetch))
}

fn options_for(dir: &tempfile::TempDir, file_name: &str) -> RenderOptions {
    RenderOptions {
        viewport_width: 100,
        viewport_height: 50,
        output_path: dir
            .path()
            .join(file_name)
            .to_str()
            .expect("utf-8 path")
            .to_owned(),
        output_mode: OutputMode::Headless,
    }
}

fn read_ppm_pixel(bytes: &[u8], width: usize, x: usize, y: usize) -> (u8, u8, u8) {
    let header_end = {
        // Header is three newline-terminated lines.
        let mut newlines = 0;
        let mut index = 0;
        while newlines < 3 {
            if bytes[index] == b'\n' {
                newlines += 1;
            }
            index += 1;
        }
        index
    };
    let offset = header_end + (y * width + x) * 3;
    (bytes[offset], bytes[offset + 1], bytes[offset + 2])
}

#[test]
fn navigate_renders_a_data_url_to_ppm() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();

    let result = engine.navigate("data:text/html,<p>hello</p>", &options);
    assert!(result.ok, "{}", result.message);
    assert!(result.message.starts_with("Rendered data:text/html,<p>hello</p> to "));
    assert_eq!(engine.current_stage(), LifecycleStage::Complete);

    let bytes = std::fs::read(&options.output_path).expect("artifact");
    assert!(bytes.starts_with(b"P6\n100 50\n255\n"));
    assert_eq!(bytes.len(), b"P6\n100 50\n255\n".len() + 100 * 50 * 3);
}

#[test]
fn script_mutation_shows_up_in_pixels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();

    let page = "data:text/html,<h1 id=\"t\">Hi</h1>\
                <script>document.getElementById(\"t\").style.backgroundColor = \"red\";</script>";
    let result = engine.navigate(page, &options);
    assert!(result.ok, "{}", result.message);

    let bytes = std::fs::read(&options.output_path).expect("artifact");
    assert_eq!(read_ppm_pixel(&bytes, 100, 50, 5), (255, 0, 0));
}

#[test]
fn lifecycle_trace_records_the_stage_sequence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();

    let result = engine.navigate("data:text/html,<p>x</p>", &options);
    assert!(result.ok, "{}", result.message);

    let stages: Vec<LifecycleStage> = result
        .session
        .trace
        .entries
        .iter()
        .map(|entry| entry.stage)
        .collect();
    assert_eq!(
        stages,
        vec![
            LifecycleStage::Idle,
            LifecycleStage::Fetching,
            LifecycleStage::Parsing,
            LifecycleStage::Styling,
            LifecycleStage::Layout,
            LifecycleStage::Rendering,
            LifecycleStage::Complete,
        ]
    );

    // Diagnostics carry non-decreasing timestamps and announce the target.
    for window in result.session.diagnostics.windows(2) {
        assert!(window[1].timestamp >= window[0].timestamp);
    }
    assert!(
        result
            .session
            .diagnostics
            .iter()
            .any(|event| event.message.contains("Navigation target: data:text/html,<p>x</p>"))
    );
    assert!(
        result
            .session
            .diagnostics
            .iter()
            .any(|event| event.message == "Stage transition: complete")
    );
}

#[test]
fn unresolvable_input_errors_without_running_the_pipeline() {
    let mut engine = offline_engine();
    let result = engine.navigate("no-such-scheme-or-path", &RenderOptions::default());
    assert!(!result.ok);
    assert_eq!(result.message, "Unable to resolve input: no-such-scheme-or-path");
    assert_eq!(engine.current_stage(), LifecycleStage::Error);
}

#[test]
fn invalid_viewport_is_an_input_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut options = options_for(&dir, "out.ppm");
    options.viewport_width = 0;
    let mut engine = offline_engine();

    let result = engine.navigate("data:text/html,<p>x</p>", &options);
    assert!(!result.ok);
    assert_eq!(result.message, "Viewport width and height must be positive.");
    assert_eq!(engine.current_stage(), LifecycleStage::Error);
}

#[test]
fn warnings_appear_in_the_final_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();

    let page = "data:text/html,<p>x</p><script>bogus()</script>";
    let result = engine.navigate(page, &options);
    assert!(result.ok, "{}", result.message);
    assert!(result.message.contains("Warning summary: 1 warning(s); first: "));
    assert!(
        result
            .message
            .contains("Script #1 execution failed: Unsupported script statement 1: bogus()")
    );
}

#[test]
fn html_recovery_warnings_surface_in_the_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();

    let result = engine.navigate("data:text/html,<div><p>Hello", &options);
    assert!(result.ok, "{}", result.message);
    assert!(result.message.contains("HTML recovery: Unclosed element <p>"));
    assert!(result.message.contains("HTML recovery: Unclosed element <div>"));
}

#[test]
fn unsupported_selectors_warn_in_the_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();

    let page = "data:text/html,<style>p::marker { color: red } p { color: blue }</style><p>x</p>";
    let result = engine.navigate(page, &options);
    assert!(result.ok, "{}", result.message);
    assert!(
        result
            .message
            .contains("Unsupported selector skipped: p::marker"),
        "{}",
        result.message
    );
}

#[test]
fn skipped_styles_warn_but_do_not_fail() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();

    let page = "data:text/html,<style media=\"print\">p { color: red }</style><p>x</p>";
    let result = engine.navigate(page, &options);
    assert!(result.ok, "{}", result.message);
    assert!(
        result
            .message
            .contains("Inline <style> #1 skipped due to non-screen media 'print'")
    );
}

#[test]
fn linked_css_and_imports_resolve_through_file_urls() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("page.html"),
        "<html><head><link rel=\"stylesheet\" href=\"a.css\"></head>\
         <body><p>x</p></body></html>",
    )
    .expect("write page");
    std::fs::write(
        dir.path().join("a.css"),
        "@import \"b.css\";\np { color: red }",
    )
    .expect("write a.css");
    std::fs::write(dir.path().join("b.css"), "@import \"a.css\";\np { font-size: 18px }")
        .expect("write b.css");

    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();
    let page_path = dir.path().join("page.html");
    let result = engine.navigate(page_path.to_str().expect("utf-8 path"), &options);

    assert!(result.ok, "{}", result.message);
    // The a -> b -> a cycle is cut exactly once, with one warning.
    assert!(
        result.message.contains("Warning summary: 1 warning(s)"),
        "{}",
        result.message
    );
    assert!(
        result
            .message
            .contains("CSS @import skipped to avoid cycle/reload"),
        "{}",
        result.message
    );
}

#[test]
fn missing_linked_stylesheet_is_a_warning_not_a_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("page.html"),
        "<link rel=\"stylesheet\" href=\"missing.css\"><p>x</p>",
    )
    .expect("write page");

    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();
    let page_path = dir.path().join("page.html");
    let result = engine.navigate(page_path.to_str().expect("utf-8 path"), &options);

    assert!(result.ok, "{}", result.message);
    assert!(result.message.contains("Stylesheet load failed for "));
    assert!(result.message.contains("Unable to open file: "));
}

#[test]
fn shell_mode_writes_a_text_transcript() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut options = options_for(&dir, "out.txt");
    options.output_mode = OutputMode::Shell;
    let mut engine = offline_engine();

    let result = engine.navigate("data:text/html,<div><p>hello</p></div>", &options);
    assert!(result.ok, "{}", result.message);

    let transcript = std::fs::read_to_string(&options.output_path).expect("transcript");
    assert!(transcript.starts_with("<#document>"));
    assert!(transcript.lines().any(|line| line.trim_start() == "hello"));
}

#[test]
fn retry_preserves_prior_diagnostics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_for(&dir, "out.ppm");
    let mut engine = offline_engine();

    let first = engine.navigate("data:text/html,<p>x</p>", &options);
    assert!(first.ok);
    let first_count = first.session.diagnostics.len();

    let retried = engine.retry();
    assert!(retried.ok, "{}", retried.message);
    assert!(retried.session.diagnostics.len() > first_count);
    assert!(
        retried
            .session
            .diagnostics
            .iter()
            .any(|event| event.message.contains("Retry requested from stage: complete"))
    );
}

#[test]
fn retry_without_history_fails() {
    let mut engine = offline_engine();
    let result = engine.retry();
    assert!(!result.ok);
    assert_eq!(result.message, "No previous navigation to retry");
}

/// Fetcher that flips the engine's cancel flag mid-fetch, so the next
/// stage boundary observes it.
struct CancellingFetcher {
    handle: Arc<Mutex<Option<page_handler::CancelHandle>>>,
}

impl Fetcher for CancellingFetcher {
    fn fetch(&self, _url: &str) -> FetchResponse {
        if let Ok(guard) = self.handle.lock()
            && let Some(handle) = guard.as_ref()
        {
            handle.cancel();
        }
        FetchResponse {
            status_code: 200,
            reason: "OK".to_owned(),
            body: "<p>x</p>".to_owned(),
            ..FetchResponse::default()
        }
    }
}

#[test]
fn cancellation_is_observed_at_the_next_stage_boundary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_for(&dir, "out.ppm");

    let shared = Arc::new(Mutex::new(None));
    let mut engine = Engine::with_fetcher(Box::new(CancellingFetcher {
        handle: Arc::clone(&shared),
    }));
    if let Ok(mut guard) = shared.lock() {
        *guard = Some(engine.cancel_handle());
    }

    let result = engine.navigate("https://example.com/page", &options);
    assert!(!result.ok);
    assert_eq!(result.message, "Navigation cancelled before parsing");
    assert_eq!(engine.current_stage(), LifecycleStage::Cancelled);
}

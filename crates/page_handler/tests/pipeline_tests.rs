use net::fetcher::{FetchResponse, Fetcher};
use page_handler::pipeline::{OutputMode, PipelineStage, RunOptions, run};

struct NoFetch;

impl Fetcher for NoFetch {
    fn fetch(&self, url: &str) -> FetchResponse {
        FetchResponse {
            error: format!("unexpected fetch of {url}"),
            ..FetchResponse::default()
        }
    }
}

fn options_into(dir: &tempfile::TempDir, file_name: &str) -> RunOptions {
    RunOptions {
        width: 64,
        height: 32,
        output_path: dir
            .path()
            .join(file_name)
            .to_str()
            .expect("utf-8 path")
            .to_owned(),
        output_mode: OutputMode::Headless,
    }
}

fn never_cancelled() -> impl Fn() -> bool {
    || false
}

#[test]
fn run_reports_each_stage_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_into(&dir, "out.ppm");

    let mut stages = Vec::new();
    let result = run(
        "data:text/html,<p>x</p>",
        &options,
        &NoFetch,
        &mut |stage| stages.push(stage),
        &never_cancelled(),
    );

    assert!(result.ok, "{}", result.message);
    assert_eq!(
        stages,
        vec![
            PipelineStage::Fetching,
            PipelineStage::Parsing,
            PipelineStage::Styling,
            PipelineStage::Layout,
            PipelineStage::Rendering,
        ]
    );
}

#[test]
fn input_validation_happens_before_any_stage() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut stages = Vec::new();
    let mut observer = |stage| stages.push(stage);

    let empty_url = run(
        "",
        &options_into(&dir, "out.ppm"),
        &NoFetch,
        &mut observer,
        &never_cancelled(),
    );
    assert!(!empty_url.ok);
    assert_eq!(empty_url.message, "URL is empty.");

    let mut bad_options = options_into(&dir, "out.ppm");
    bad_options.height = -1;
    let bad_viewport = run(
        "data:text/html,<p>x</p>",
        &bad_options,
        &NoFetch,
        &mut observer,
        &never_cancelled(),
    );
    assert!(!bad_viewport.ok);
    assert_eq!(bad_viewport.message, "Viewport width and height must be positive.");

    let mut no_output = options_into(&dir, "out.ppm");
    no_output.output_path = String::new();
    let missing_path = run(
        "data:text/html,<p>x</p>",
        &no_output,
        &NoFetch,
        &mut observer,
        &never_cancelled(),
    );
    assert!(!missing_path.ok);
    assert_eq!(missing_path.message, "Output path is empty.");

    assert!(stages.is_empty(), "no stage should have been entered");
}

#[test]
fn cancellation_before_the_first_boundary_aborts_the_fetch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_into(&dir, "out.ppm");

    let result = run(
        "data:text/html,<p>x</p>",
        &options,
        &NoFetch,
        &mut |_stage| {},
        &|| true,
    );
    assert!(!result.ok);
    assert_eq!(result.message, "Navigation cancelled during fetch");
}

#[test]
fn unloadable_document_fails_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_into(&dir, "out.ppm");

    let result = run(
        "data:text/html;base64,not-base64!",
        &options,
        &NoFetch,
        &mut |_stage| {},
        &never_cancelled(),
    );
    assert!(!result.ok);
    assert!(result.message.starts_with("Document load failed: "), "{}", result.message);
}

#[test]
fn bad_base_href_warns_and_falls_back_to_the_document_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("page.html"),
        "<head><base href=\"data:text/css,x\"></head><body><p>x</p></body>",
    )
    .expect("write page");

    let options = options_into(&dir, "out.ppm");
    let page_path = dir.path().join("page.html");
    let result = run(
        page_path.to_str().expect("utf-8 path"),
        &options,
        &NoFetch,
        &mut |_stage| {},
        &never_cancelled(),
    );

    assert!(result.ok, "{}", result.message);
    assert!(
        result
            .message
            .contains("Base href ignored for resource resolution ('data:text/css,x')"),
        "{}",
        result.message
    );
}

#[test]
fn data_css_links_load_without_a_network() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = options_into(&dir, "out.ppm");

    let page = "data:text/html,<link rel=\"stylesheet\" href=\"data:text/css;base64,cCB7IGNvbG9yOiByZWQgfQ==\"><p>x</p>";
    let result = run(
        page,
        &options,
        &NoFetch,
        &mut |_stage| {},
        &never_cancelled(),
    );
    assert!(result.ok, "{}", result.message);
    // No warnings expected: the data stylesheet resolves and parses.
    assert!(!result.message.contains("Warning summary"), "{}", result.message);
}

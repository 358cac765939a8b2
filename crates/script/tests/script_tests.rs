use html::parser::parse_html;
use html::queries::{query_first_by_id, query_first_by_tag};
use script::events::{DomEvent, EventRegistry, EventType};
use script::{bridge, execute_script};

#[test]
fn document_title_creates_title_under_head() {
    let mut document = parse_html("<html><body><p>x</p></body></html>");
    let result = execute_script(&mut document, "document.title = \"My Page\";");
    assert!(result.ok, "{}", result.message);

    let title = query_first_by_tag(&document, document.root(), "title").expect("title created");
    assert_eq!(document.inner_text(title), "My Page");
    let head = query_first_by_tag(&document, document.root(), "head").expect("head created");
    assert_eq!(document.parent(title), Some(head));
}

#[test]
fn existing_title_is_replaced() {
    let mut document = parse_html("<head><title>Old</title></head>");
    let result = execute_script(&mut document, "document.title = 'New'");
    assert!(result.ok);
    let title = query_first_by_tag(&document, document.root(), "title").expect("title");
    assert_eq!(document.inner_text(title), "New");
}

#[test]
fn style_property_assignment_serializes_canonically() {
    let mut document = parse_html("<h1 id=\"t\">Hi</h1>");
    let result = execute_script(
        &mut document,
        "document.getElementById(\"t\").style.backgroundColor = \"red\";",
    );
    assert!(result.ok, "{}", result.message);

    let heading = query_first_by_id(&document, document.root(), "t").expect("h1");
    assert_eq!(
        document.attribute(heading, "style"),
        Some("background-color: red;")
    );
}

#[test]
fn style_property_assignment_merges_with_existing_style() {
    let mut document = parse_html("<p id=\"p\" style=\"color: blue\">x</p>");
    let result = execute_script(&mut document, "document.getElementById('p').style.margin = '4px'");
    assert!(result.ok, "{}", result.message);

    let paragraph = query_first_by_id(&document, document.root(), "p").expect("p");
    assert_eq!(
        document.attribute(paragraph, "style"),
        Some("color: blue; margin: 4px;")
    );
}

#[test]
fn style_string_assignment_reserializes() {
    let mut document = parse_html("<p id=\"p\">x</p>");
    let result = execute_script(
        &mut document,
        "document.getElementById('p').style = 'color:red;  margin:2px'",
    );
    assert!(result.ok, "{}", result.message);
    let paragraph = query_first_by_id(&document, document.root(), "p").expect("p");
    assert_eq!(
        document.attribute(paragraph, "style"),
        Some("color: red; margin: 2px;")
    );
}

#[test]
fn text_assignment_replaces_children() {
    let mut document = parse_html("<div id=\"d\"><span>old</span>tail</div>");
    let result = execute_script(&mut document, "document.getElementById('d').innerText = 'new'");
    assert!(result.ok, "{}", result.message);

    let div = query_first_by_id(&document, document.root(), "d").expect("div");
    assert_eq!(document.inner_text(div), "new");
    assert_eq!(document.children(div).count(), 1);
}

#[test]
fn set_and_remove_attribute() {
    let mut document = parse_html("<p id=\"p\">x</p>");
    let script = "document.getElementById('p').setAttribute('data-x', '1');\n\
                  document.getElementById('p').removeAttribute('data-x')";
    let result = execute_script(&mut document, script);
    assert!(result.ok, "{}", result.message);

    let paragraph = query_first_by_id(&document, document.root(), "p").expect("p");
    assert!(!document.has_attribute(paragraph, "data-x"));
}

#[test]
fn set_attribute_style_goes_through_style_parser() {
    let mut document = parse_html("<p id=\"p\">x</p>");
    let result = execute_script(
        &mut document,
        "document.getElementById('p').setAttribute('style', 'b:2;a:1')",
    );
    assert!(result.ok, "{}", result.message);
    let paragraph = query_first_by_id(&document, document.root(), "p").expect("p");
    assert_eq!(document.attribute(paragraph, "style"), Some("a: 1; b: 2;"));
}

#[test]
fn document_body_operations_target_the_body() {
    let mut document = parse_html("<html><body><p>x</p></body></html>");
    let result = execute_script(&mut document, "document.body.className = 'wide'");
    assert!(result.ok, "{}", result.message);
    let body = query_first_by_tag(&document, document.root(), "body").expect("body");
    assert_eq!(document.attribute(body, "class"), Some("wide"));
}

#[test]
fn missing_body_fails_without_aborting_later_scripts() {
    let mut document = parse_html("<p>x</p>");
    let result = execute_script(&mut document, "document.body.className = 'wide'");
    assert!(!result.ok);
    assert!(result.message.contains("document.body is not available"));
}

#[test]
fn query_selector_supports_only_id_form() {
    let mut document = parse_html("<p id=\"ok-1\">x</p>");
    assert!(execute_script(&mut document, "document.querySelector('#ok-1').id = 'renamed'").ok);

    let rejected = execute_script(&mut document, "document.querySelector('.cls').id = 'x'");
    assert!(!rejected.ok);
    assert!(rejected.message.contains("only '#id' is supported"));
}

#[test]
fn unsupported_statement_reports_index_and_text() {
    let mut document = parse_html("<p>x</p>");
    let result = execute_script(&mut document, "console.log('fine'); window.alert('nope')");
    assert!(!result.ok);
    assert_eq!(
        result.message,
        "Unsupported script statement 2: window.alert('nope')"
    );
}

#[test]
fn later_statements_observe_earlier_mutations() {
    let mut document = parse_html("<p id=\"a\">x</p>");
    let script = "document.getElementById('a').id = 'b';\n\
                  document.getElementById('b').className = 'seen'";
    let result = execute_script(&mut document, script);
    assert!(result.ok, "{}", result.message);
    let renamed = query_first_by_id(&document, document.root(), "b").expect("renamed");
    assert_eq!(document.attribute(renamed, "class"), Some("seen"));
}

#[test]
fn empty_script_is_ok() {
    let mut document = parse_html("");
    let result = execute_script(&mut document, "  \n ; ; \n ");
    assert!(result.ok);
    assert_eq!(result.message, "Empty script");
}

#[test]
fn bridge_queries_snapshot_elements() {
    let document = parse_html("<div id=\"d\" class=\"box\"><p>one</p><p>two</p></div>");
    let by_id = bridge::query_by_id(&document, "d");
    assert!(by_id.ok);
    assert_eq!(by_id.elements.len(), 1);
    let element = &by_id.elements[0];
    assert_eq!(element.tag_name, "div");
    assert_eq!(element.text_content, "onetwo");
    assert_eq!(element.child_count, 2);
    assert_eq!(element.attributes.get("class").map(String::as_str), Some("box"));

    assert_eq!(bridge::query_selector(&document, "p").elements.len(), 1);
    assert_eq!(bridge::query_selector_all(&document, "p").elements.len(), 2);
    assert_eq!(bridge::query_by_id(&document, "missing").message, "Not found");
    assert!(!bridge::query_by_id(&document, "").ok);
}

#[test]
fn bridge_mutations_apply() {
    let mut document = parse_html("<p id=\"p\">x</p>");
    assert!(bridge::set_attribute_by_id(&mut document, "p", "data-k", "v").ok);
    assert!(bridge::set_style_by_id(&mut document, "p", "backgroundColor", "red").ok);
    assert!(bridge::set_text_by_id(&mut document, "p", "updated").ok);

    let paragraph = query_first_by_id(&document, document.root(), "p").expect("p");
    assert_eq!(document.attribute(paragraph, "data-k"), Some("v"));
    assert_eq!(
        document.attribute(paragraph, "style"),
        Some("background-color: red;")
    );
    assert_eq!(document.inner_text(paragraph), "updated");

    assert!(bridge::remove_attribute_by_id(&mut document, "p", "data-k").ok);
    assert!(!bridge::set_style_by_id(&mut document, "p", "not a prop", "x").ok);
    assert!(!bridge::set_text_by_id(&mut document, "missing", "x").ok);
}

#[test]
fn event_dispatch_runs_matching_handlers_only() {
    let mut document = parse_html("<button id=\"go\">Go</button>");
    let mut registry = EventRegistry::default();
    registry.add_listener(
        "go",
        EventType::Click,
        Box::new(|document, _event| {
            let _ = bridge::set_text_by_id(document, "go", "Clicked");
        }),
    );
    assert_eq!(registry.listener_count(), 1);

    let miss = registry.dispatch(
        &mut document,
        &DomEvent {
            event_type: EventType::Input,
            target_id: "go".to_owned(),
            value: String::new(),
        },
    );
    assert_eq!(miss.message, "No handler for event");

    let hit = registry.dispatch(
        &mut document,
        &DomEvent {
            event_type: EventType::Click,
            target_id: "go".to_owned(),
            value: String::new(),
        },
    );
    assert_eq!(hit.message, "OK");

    let button = query_first_by_id(&document, document.root(), "go").expect("button");
    assert_eq!(document.inner_text(button), "Clicked");
}

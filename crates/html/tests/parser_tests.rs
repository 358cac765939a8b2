use html::dom::Document;
use html::parser::{parse_html, parse_html_with_diagnostics};
use html::queries;
use indextree::NodeId;

fn only_element_child(document: &Document, id: NodeId) -> NodeId {
    let elements: Vec<NodeId> = document
        .children(id)
        .filter(|&child| document.is_element(child))
        .collect();
    assert_eq!(elements.len(), 1, "expected exactly one element child");
    elements[0]
}

#[test]
fn empty_input_produces_bare_document() {
    let document = parse_html("");
    assert_eq!(document.children(document.root()).count(), 0);
    assert_eq!(document.serialize_dom(document.root()), "#document");
}

#[test]
fn whitespace_only_input_produces_single_text_child() {
    let document = parse_html("   \n\t  ");
    let children: Vec<NodeId> = document.children(document.root()).collect();
    assert_eq!(children.len(), 1);
    assert!(document.is_text(children[0]));
}

#[test]
fn well_formed_markup_parses_without_warnings() {
    let result = parse_html_with_diagnostics(
        "<html><head><title>Hi</title></head><body><p class=\"x\">Text</p></body></html>",
    );
    assert!(result.warnings.is_empty());

    let html_node = only_element_child(&result.document, result.document.root());
    assert_eq!(result.document.tag(html_node), Some("html"));
}

#[test]
fn tag_and_attribute_names_are_lowercased() {
    let document = parse_html("<DIV ID=\"Main\" Class=\"Box\">x</DIV>");
    let div = only_element_child(&document, document.root());
    assert_eq!(document.tag(div), Some("div"));
    assert_eq!(document.attribute(div, "id"), Some("Main"));
    assert_eq!(document.attribute(div, "class"), Some("Box"));
}

#[test]
fn duplicate_attributes_keep_the_last_value() {
    let document = parse_html("<p id=\"first\" id=\"second\">x</p>");
    let paragraph = only_element_child(&document, document.root());
    assert_eq!(document.attribute(paragraph, "id"), Some("second"));
}

#[test]
fn attribute_quoting_styles_all_parse() {
    let document = parse_html("<p a=one b=\"two words\" c='three'>x</p>");
    let paragraph = only_element_child(&document, document.root());
    assert_eq!(document.attribute(paragraph, "a"), Some("one"));
    assert_eq!(document.attribute(paragraph, "b"), Some("two words"));
    assert_eq!(document.attribute(paragraph, "c"), Some("three"));
}

#[test]
fn attribute_values_decode_entities() {
    let document = parse_html("<p title=\"a &amp; b\">x</p>");
    let paragraph = only_element_child(&document, document.root());
    assert_eq!(document.attribute(paragraph, "title"), Some("a & b"));
}

#[test]
fn void_elements_do_not_take_children() {
    let document = parse_html("<div><br>after</div>");
    let div = only_element_child(&document, document.root());
    let children: Vec<NodeId> = document.children(div).collect();
    assert_eq!(children.len(), 2);
    assert_eq!(document.tag(children[0]), Some("br"));
    assert_eq!(document.children(children[0]).count(), 0);
    assert_eq!(document.text(children[1]), Some("after"));
}

#[test]
fn comments_and_doctype_are_skipped() {
    let document = parse_html("<!DOCTYPE html><!-- note --><p>x</p>");
    let paragraph = only_element_child(&document, document.root());
    assert_eq!(document.tag(paragraph), Some("p"));
}

#[test]
fn unterminated_comment_warns_and_consumes_input() {
    let result = parse_html_with_diagnostics("<p>x</p><!-- never closed");
    assert!(
        result
            .warnings
            .iter()
            .any(|warning| warning.message.contains("Unclosed HTML comment"))
    );
}

#[test]
fn malformed_nesting_recovers_with_warnings() {
    let result = parse_html_with_diagnostics("<div><p>Hello<span>World</div>");
    let document = &result.document;

    let div = only_element_child(document, document.root());
    assert_eq!(document.tag(div), Some("div"));
    let paragraph = only_element_child(document, div);
    assert_eq!(document.tag(paragraph), Some("p"));
    let span = queries::query_first_by_tag(document, paragraph, "span").expect("span under p");
    assert_eq!(document.inner_text(span), "World");

    let implicit = result
        .warnings
        .iter()
        .filter(|warning| warning.message.contains("implicitly closed"))
        .count();
    assert!(implicit >= 2, "expected implicit-close warnings: {implicit}");

    // Serialization is stable across repeated parses of the same input.
    let again = parse_html_with_diagnostics("<div><p>Hello<span>World</div>");
    assert_eq!(
        document.serialize_dom(document.root()),
        again.document.serialize_dom(again.document.root())
    );
}

#[test]
fn unmatched_end_tag_is_ignored_with_warning() {
    let result = parse_html_with_diagnostics("<div>x</span></div>");
    assert!(
        result
            .warnings
            .iter()
            .any(|warning| warning.message.contains("Unmatched end tag </span>"))
    );
    let div = only_element_child(&result.document, result.document.root());
    assert_eq!(result.document.inner_text(div), "x");
}

#[test]
fn orphan_end_tag_over_empty_stack_warns() {
    let result = parse_html_with_diagnostics("</p>text");
    assert!(
        result
            .warnings
            .iter()
            .any(|warning| warning.message.contains("Orphan end tag </p>"))
    );
}

#[test]
fn unclosed_elements_warn_at_end_of_input() {
    let result = parse_html_with_diagnostics("<div><p>text");
    let unclosed: Vec<&str> = result
        .warnings
        .iter()
        .filter(|warning| warning.message.contains("Unclosed element"))
        .map(|warning| warning.message.as_str())
        .collect();
    assert_eq!(unclosed.len(), 2);
    // Innermost element is reported first.
    assert!(unclosed[0].contains("<p>"));
    assert!(unclosed[1].contains("<div>"));
}

#[test]
fn bare_less_than_becomes_text() {
    let result = parse_html_with_diagnostics("a <> b");
    assert!(
        result
            .warnings
            .iter()
            .any(|warning| warning.message.contains("Bare '<' treated as text"))
    );
    let children: Vec<NodeId> = result.document.children(result.document.root()).collect();
    assert_eq!(children.len(), 1);
    assert_eq!(result.document.text(children[0]), Some("a <> b"));
}

#[test]
fn adjacent_text_runs_coalesce() {
    let document = parse_html("a&amp;b<!-- split -->c");
    let children: Vec<NodeId> = document.children(document.root()).collect();
    assert_eq!(children.len(), 1);
    assert_eq!(document.text(children[0]), Some("a&bc"));
}

#[test]
fn serialize_dom_sorts_attributes_by_key() {
    let document = parse_html("<p z=\"1\" a=\"2\">x</p>");
    assert_eq!(
        document.serialize_dom(document.root()),
        "#document[<p a=\"2\" z=\"1\">[TEXT(\"x\")]</p>]"
    );
}

#[test]
fn queries_find_by_tag_id_class_attr_and_text() {
    let document = parse_html(
        "<div id=\"outer\" class=\"wrap main\" data-kind=\"panel\">\
         <p id=\"inner\">needle here</p><p class=\"wrap\">other</p></div>",
    );
    let root = document.root();

    assert_eq!(queries::query_all_by_tag(&document, root, "p").len(), 2);
    assert!(queries::query_first_by_id(&document, root, "inner").is_some());
    assert!(queries::query_first_by_id(&document, root, "missing").is_none());
    assert_eq!(queries::query_all_by_class(&document, root, "wrap").len(), 2);
    assert!(queries::query_first_by_attr(&document, root, "data-kind", "panel").is_some());
    assert!(queries::query_first_by_attr_token(&document, root, "class", "main").is_some());

    let containing = queries::query_all_text_contains(&document, root, "needle");
    // Both the outer div and the inner p contain the needle text.
    assert_eq!(containing.len(), 2);
}

#[test]
fn json_snapshot_is_deterministic() {
    let first = parse_html("<div b=\"2\" a=\"1\">x<span>y</span>z</div>");
    let second = parse_html("<div b=\"2\" a=\"1\">x<span>y</span>z</div>");
    assert_eq!(first.to_json_string(), second.to_json_string());
    assert!(first.to_json_string().contains("\"tag\": \"div\""));
}

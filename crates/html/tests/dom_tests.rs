use html::parser::parse_html;
use html::queries::query_first_by_id;

#[test]
fn set_attribute_updates_in_place() {
    let mut document = parse_html("<p id=\"p\" class=\"old\">x</p>");
    let paragraph = query_first_by_id(&document, document.root(), "p").expect("p");

    document.set_attribute(paragraph, "class", "new");
    assert_eq!(document.attribute(paragraph, "class"), Some("new"));

    document.set_attribute(paragraph, "data-extra", "1");
    assert_eq!(document.attribute(paragraph, "data-extra"), Some("1"));
}

#[test]
fn remove_attribute_is_idempotent() {
    let mut document = parse_html("<p id=\"p\" title=\"t\">x</p>");
    let paragraph = query_first_by_id(&document, document.root(), "p").expect("p");

    document.remove_attribute(paragraph, "title");
    assert!(!document.has_attribute(paragraph, "title"));
    document.remove_attribute(paragraph, "title");
    assert!(!document.has_attribute(paragraph, "title"));
    assert_eq!(document.attribute(paragraph, "id"), Some("p"));
}

#[test]
fn replace_children_with_text_detaches_the_old_subtree() {
    let mut document = parse_html("<div id=\"d\"><span id=\"inner\">old</span></div>");
    let div = query_first_by_id(&document, document.root(), "d").expect("div");

    document.replace_children_with_text(div, "new text");
    assert_eq!(document.children(div).count(), 1);
    assert_eq!(document.inner_text(div), "new text");
    // The detached span is no longer reachable from the root.
    assert!(query_first_by_id(&document, document.root(), "inner").is_none());
}

#[test]
fn created_elements_join_the_tree_where_appended() {
    let mut document = parse_html("<html></html>");
    let html_node = document.children(document.root()).next().expect("html");

    let head = document.create_element("head");
    document.append_child(html_node, head);
    let title = document.create_element("title");
    document.append_child(head, title);
    let text = document.create_text("Hello");
    document.append_child(title, text);

    assert_eq!(
        document.serialize_dom(document.root()),
        "#document[<html>[<head>[<title>[TEXT(\"Hello\")]</title>]</head>]</html>]"
    );
}

#[test]
fn inner_text_concatenates_descendant_text_in_order() {
    let document = parse_html("<div>a<span>b<i>c</i></span>d</div>");
    let div = document.children(document.root()).next().expect("div");
    assert_eq!(document.inner_text(div), "abcd");
}

//! Selector AST, parsing, and specificity.
//!
//! A selector is a sequence of compound selectors joined by combinators.
//! Parsing is conservative: anything outside the supported grammar makes
//! the whole selector unparsable, and the caller drops the rule.

/// Combinator between two compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace.
    Descendant,
    /// `>`
    Child,
    /// `+`
    AdjacentSibling,
    /// `~`
    GeneralSibling,
}

/// Operator of an attribute selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[attr]`: key present.
    Exists,
    /// `[attr=value]`: exact value match (only `id`/`class`).
    Exact,
    /// `[class~=token]`: whitespace-token membership.
    ClassContainsToken,
    /// `[attr^=prefix]`
    Prefix,
    /// `[attr$=suffix]`
    Suffix,
    /// `[attr*=substring]`
    ContainsSubstring,
}

/// One attribute selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Lowercase attribute name.
    pub name: String,
    /// Comparison value; empty for `Exists`.
    pub value: String,
    /// How the value is compared.
    pub op: AttributeOperator,
}

/// Argument pattern of the `nth-*` pseudo-classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NthPattern {
    /// A 1-based sibling index.
    Index(i32),
    /// Odd indices.
    Odd,
    /// Even indices.
    Even,
}

/// A supported pseudo-class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    FirstOfType,
    LastOfType,
    OnlyChild,
    Root,
    Empty,
    NthChild(NthPattern),
    NthOfType(NthPattern),
    NthLastChild(NthPattern),
    NthLastOfType(NthPattern),
    /// `:not(compound)` holds the raw inner compound, re-parsed at match time.
    Not(String),
}

/// A compound selector: simple selectors that all apply to one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    /// Lowercase tag name, empty for none.
    pub tag: String,
    /// `#id` parts.
    pub ids: Vec<String>,
    /// `.class` parts.
    pub classes: Vec<String>,
    /// `[attr…]` parts.
    pub attribute_selectors: Vec<AttributeSelector>,
    /// `:pseudo` parts.
    pub pseudo_classes: Vec<PseudoClass>,
    /// True when the compound starts with `*`.
    pub has_universal: bool,
}

/// A full parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    /// Compound selectors, left to right.
    pub compounds: Vec<CompoundSelector>,
    /// Combinators between adjacent compounds; always `compounds.len() - 1`.
    pub combinators: Vec<Combinator>,
}

const ID_SPECIFICITY: i32 = 100;
const CLASS_SPECIFICITY: i32 = 10;
const PSEUDO_CLASS_SPECIFICITY: i32 = 10;
const TAG_SPECIFICITY: i32 = 1;

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

fn skip_spaces(bytes: &[u8], cursor: &mut usize) {
    while *cursor < bytes.len() && is_space(bytes[*cursor]) {
        *cursor += 1;
    }
}

fn parse_identifier(source: &str, cursor: &mut usize) -> String {
    let bytes = source.as_bytes();
    let start = *cursor;
    while *cursor < bytes.len() && is_identifier_byte(bytes[*cursor]) {
        *cursor += 1;
    }
    source[start..*cursor].to_owned()
}

fn is_empty_compound(selector: &CompoundSelector) -> bool {
    !selector.has_universal
        && selector.tag.is_empty()
        && selector.ids.is_empty()
        && selector.classes.is_empty()
        && selector.attribute_selectors.is_empty()
        && selector.pseudo_classes.is_empty()
}

/// Parse a simple (argument-free) pseudo-class name.
fn parse_simple_pseudo_class(name: &str) -> Option<PseudoClass> {
    let pseudo = match name.to_ascii_lowercase().as_str() {
        "first-child" => PseudoClass::FirstChild,
        "last-child" => PseudoClass::LastChild,
        "first-of-type" => PseudoClass::FirstOfType,
        "last-of-type" => PseudoClass::LastOfType,
        "only-child" => PseudoClass::OnlyChild,
        "root" => PseudoClass::Root,
        "empty" => PseudoClass::Empty,
        _ => return None,
    };
    Some(pseudo)
}

fn parse_positive_integer(source: &str, cursor: &mut usize) -> Option<i32> {
    let bytes = source.as_bytes();
    let start = *cursor;
    while *cursor < bytes.len() && bytes[*cursor].is_ascii_digit() {
        *cursor += 1;
    }
    if start == *cursor {
        return None;
    }

    let mut value: i32 = 0;
    for &byte in &bytes[start..*cursor] {
        let digit = i32::from(byte - b'0');
        if value > (i32::MAX - digit) / 10 {
            return None;
        }
        value = value * 10 + digit;
    }

    (value > 0).then_some(value)
}

/// Consume a balanced `(…)` argument, honouring brackets and quotes inside
/// attribute selectors. Returns the trimmed inner text.
fn parse_parenthesized_argument(source: &str, cursor: &mut usize) -> Option<String> {
    let bytes = source.as_bytes();
    if *cursor >= bytes.len() || bytes[*cursor] != b'(' {
        return None;
    }

    *cursor += 1;
    let argument_start = *cursor;
    let mut paren_depth = 1;
    let mut bracket_depth = 0;
    let mut attribute_quote: u8 = 0;

    while *cursor < bytes.len() {
        let current = bytes[*cursor];

        if attribute_quote != 0 {
            if current == attribute_quote {
                attribute_quote = 0;
            }
            *cursor += 1;
            continue;
        }

        if bracket_depth > 0 && matches!(current, b'"' | b'\'') {
            attribute_quote = current;
            *cursor += 1;
            continue;
        }

        match current {
            b'[' => bracket_depth += 1,
            b']' => {
                if bracket_depth <= 0 {
                    return None;
                }
                bracket_depth -= 1;
            }
            b'(' => paren_depth += 1,
            b')' => {
                paren_depth -= 1;
                if paren_depth == 0 {
                    if bracket_depth != 0 {
                        return None;
                    }
                    let argument = source[argument_start..*cursor].trim().to_owned();
                    *cursor += 1;
                    return Some(argument);
                }
            }
            _ => {}
        }
        *cursor += 1;
    }

    None
}

fn parse_nth_pattern_expression(expression: &str) -> Option<NthPattern> {
    let bytes = expression.as_bytes();
    let mut cursor = 0;
    skip_spaces(bytes, &mut cursor);

    let pattern = if let Some(index) = parse_positive_integer(expression, &mut cursor) {
        NthPattern::Index(index)
    } else {
        match parse_identifier(expression, &mut cursor)
            .to_ascii_lowercase()
            .as_str()
        {
            "odd" => NthPattern::Odd,
            "even" => NthPattern::Even,
            _ => return None,
        }
    };

    skip_spaces(bytes, &mut cursor);
    (cursor == bytes.len()).then_some(pattern)
}

fn parse_nth_pattern_argument(source: &str, cursor: &mut usize) -> Option<NthPattern> {
    let argument = parse_parenthesized_argument(source, cursor)?;
    parse_nth_pattern_expression(&argument)
}

/// Parse the inside of `[…]`; the opening bracket is already consumed.
fn parse_attribute_selector(source: &str, cursor: &mut usize) -> Option<AttributeSelector> {
    let bytes = source.as_bytes();
    skip_spaces(bytes, cursor);
    let name = parse_identifier(source, cursor).to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    skip_spaces(bytes, cursor);
    if *cursor >= bytes.len() {
        return None;
    }

    if bytes[*cursor] == b']' {
        *cursor += 1;
        return Some(AttributeSelector {
            name,
            value: String::new(),
            op: AttributeOperator::Exists,
        });
    }

    let op = match bytes[*cursor] {
        b'=' => {
            // Bare `=` stays on the conservative accept list.
            if name != "id" && name != "class" {
                return None;
            }
            *cursor += 1;
            AttributeOperator::Exact
        }
        b'~' => {
            if name != "class" {
                return None;
            }
            *cursor += 1;
            if bytes.get(*cursor) != Some(&b'=') {
                return None;
            }
            *cursor += 1;
            AttributeOperator::ClassContainsToken
        }
        prefix @ (b'^' | b'$' | b'*') => {
            *cursor += 1;
            if bytes.get(*cursor) != Some(&b'=') {
                return None;
            }
            *cursor += 1;
            match prefix {
                b'^' => AttributeOperator::Prefix,
                b'$' => AttributeOperator::Suffix,
                _ => AttributeOperator::ContainsSubstring,
            }
        }
        _ => return None,
    };

    skip_spaces(bytes, cursor);
    if *cursor >= bytes.len() {
        return None;
    }

    let value = if matches!(bytes[*cursor], b'"' | b'\'') {
        let quote = bytes[*cursor];
        *cursor += 1;
        let value_start = *cursor;
        while *cursor < bytes.len() && bytes[*cursor] != quote {
            *cursor += 1;
        }
        if *cursor >= bytes.len() {
            return None;
        }
        let value = source[value_start..*cursor].to_owned();
        *cursor += 1;
        value
    } else {
        let value = parse_identifier(source, cursor);
        if value.is_empty() {
            return None;
        }
        value
    };

    skip_spaces(bytes, cursor);
    if bytes.get(*cursor) != Some(&b']') {
        return None;
    }
    *cursor += 1;

    Some(AttributeSelector { name, value, op })
}

/// Parse one compound selector from its full source text.
pub fn parse_compound_selector(source: &str) -> Option<CompoundSelector> {
    let bytes = source.as_bytes();
    let mut selector = CompoundSelector::default();
    let mut cursor = 0;

    if bytes.first() == Some(&b'*') {
        selector.has_universal = true;
        cursor += 1;
    } else if cursor < bytes.len() && !matches!(bytes[cursor], b'#' | b'.' | b':' | b'[') {
        let tag = parse_identifier(source, &mut cursor);
        if tag.is_empty() {
            return None;
        }
        selector.tag = tag.to_ascii_lowercase();
    }

    while cursor < bytes.len() {
        let kind = bytes[cursor];
        cursor += 1;

        match kind {
            b'#' => {
                let id = parse_identifier(source, &mut cursor);
                if id.is_empty() {
                    return None;
                }
                selector.ids.push(id);
            }
            b'.' => {
                let class_name = parse_identifier(source, &mut cursor);
                if class_name.is_empty() {
                    return None;
                }
                selector.classes.push(class_name);
            }
            b'[' => {
                let attribute_selector = parse_attribute_selector(source, &mut cursor)?;
                selector.attribute_selectors.push(attribute_selector);
            }
            b':' => {
                let pseudo_name = parse_identifier(source, &mut cursor);
                if pseudo_name.is_empty() {
                    return None;
                }

                let lowered = pseudo_name.to_ascii_lowercase();
                let pseudo = match lowered.as_str() {
                    "nth-child" | "nth-of-type" | "nth-last-child" | "nth-last-of-type" => {
                        let pattern = parse_nth_pattern_argument(source, &mut cursor)?;
                        match lowered.as_str() {
                            "nth-child" => PseudoClass::NthChild(pattern),
                            "nth-of-type" => PseudoClass::NthOfType(pattern),
                            "nth-last-child" => PseudoClass::NthLastChild(pattern),
                            _ => PseudoClass::NthLastOfType(pattern),
                        }
                    }
                    "not" => {
                        let negated = parse_parenthesized_argument(source, &mut cursor)?;
                        if negated.is_empty() {
                            return None;
                        }
                        // The inner compound must itself be valid.
                        parse_compound_selector(&negated)?;
                        PseudoClass::Not(negated)
                    }
                    _ => parse_simple_pseudo_class(&pseudo_name)?,
                };
                selector.pseudo_classes.push(pseudo);
            }
            _ => return None,
        }
    }

    if is_empty_compound(&selector) {
        return None;
    }
    Some(selector)
}

/// Scan the next compound's extent: stop at top-level whitespace or an
/// explicit combinator, honouring parens, brackets, and quotes.
fn next_compound_extent(source: &str, cursor: &mut usize) -> Option<(usize, usize)> {
    let bytes = source.as_bytes();
    let start = *cursor;
    let mut paren_depth = 0;
    let mut bracket_depth = 0;
    let mut attribute_quote: u8 = 0;

    while *cursor < bytes.len() {
        let current = bytes[*cursor];

        if attribute_quote != 0 {
            if current == attribute_quote {
                attribute_quote = 0;
            }
            *cursor += 1;
            continue;
        }

        if bracket_depth > 0 && matches!(current, b'"' | b'\'') {
            attribute_quote = current;
            *cursor += 1;
            continue;
        }

        match current {
            b'(' => paren_depth += 1,
            b')' => {
                if paren_depth <= 0 {
                    return None;
                }
                paren_depth -= 1;
            }
            b'[' => bracket_depth += 1,
            b']' => {
                if bracket_depth <= 0 {
                    return None;
                }
                bracket_depth -= 1;
            }
            _ => {
                if paren_depth == 0
                    && bracket_depth == 0
                    && (is_space(current) || matches!(current, b'>' | b'+' | b'~'))
                {
                    break;
                }
            }
        }
        *cursor += 1;
    }

    if paren_depth != 0 || bracket_depth != 0 || attribute_quote != 0 || start == *cursor {
        return None;
    }
    Some((start, *cursor))
}

/// Parse one full selector (compounds plus combinators).
#[must_use]
pub fn parse_selector(source: &str) -> Option<ParsedSelector> {
    let bytes = source.as_bytes();
    let mut cursor = 0;
    skip_spaces(bytes, &mut cursor);

    let (start, end) = next_compound_extent(source, &mut cursor)?;
    let first = parse_compound_selector(&source[start..end])?;

    let mut compounds = vec![first];
    let mut combinators = Vec::new();

    while cursor < bytes.len() {
        let mut saw_space = false;
        while cursor < bytes.len() && is_space(bytes[cursor]) {
            saw_space = true;
            cursor += 1;
        }
        if cursor >= bytes.len() {
            break;
        }

        let combinator = match bytes[cursor] {
            explicit @ (b'>' | b'+' | b'~') => {
                cursor += 1;
                skip_spaces(bytes, &mut cursor);
                if cursor >= bytes.len() {
                    return None;
                }
                match explicit {
                    b'>' => Combinator::Child,
                    b'+' => Combinator::AdjacentSibling,
                    _ => Combinator::GeneralSibling,
                }
            }
            _ => {
                if !saw_space {
                    return None;
                }
                Combinator::Descendant
            }
        };

        let (start, end) = next_compound_extent(source, &mut cursor)?;
        let compound = parse_compound_selector(&source[start..end])?;
        combinators.push(combinator);
        compounds.push(compound);
    }

    Some(ParsedSelector {
        compounds,
        combinators,
    })
}

/// Split a selector list on top-level commas. Commas inside `(…)`, `[…]`,
/// or quoted attribute values do not split.
#[must_use]
pub fn split_selector_list(source: &str) -> Vec<String> {
    let bytes = source.as_bytes();
    let mut selectors = Vec::new();
    let mut segment_start = 0;
    let mut paren_depth = 0;
    let mut bracket_depth = 0;
    let mut quote: u8 = 0;

    let mut push_segment = |start: usize, end: usize, selectors: &mut Vec<String>| {
        let segment = source[start..end].trim();
        if !segment.is_empty() {
            selectors.push(segment.to_owned());
        }
    };

    let mut cursor = 0;
    while cursor < bytes.len() {
        let current = bytes[cursor];
        if quote != 0 {
            if current == quote {
                quote = 0;
            }
        } else {
            match current {
                b'"' | b'\'' => quote = current,
                b'(' => paren_depth += 1,
                b')' => paren_depth = i32::max(0, paren_depth - 1),
                b'[' => bracket_depth += 1,
                b']' => bracket_depth = i32::max(0, bracket_depth - 1),
                b',' if paren_depth == 0 && bracket_depth == 0 => {
                    push_segment(segment_start, cursor, &mut selectors);
                    segment_start = cursor + 1;
                }
                _ => {}
            }
        }
        cursor += 1;
    }
    push_segment(segment_start, bytes.len(), &mut selectors);

    selectors
}

/// Specificity of an already-parsed selector.
#[must_use]
pub fn specificity_of(selector: &ParsedSelector) -> i32 {
    let mut specificity = 0;
    for compound in &selector.compounds {
        specificity += compound.ids.len() as i32 * ID_SPECIFICITY;
        specificity += compound.classes.len() as i32 * CLASS_SPECIFICITY;
        specificity += compound.attribute_selectors.len() as i32 * CLASS_SPECIFICITY;
        specificity += compound.pseudo_classes.len() as i32 * PSEUDO_CLASS_SPECIFICITY;
        if !compound.tag.is_empty() {
            specificity += TAG_SPECIFICITY;
        }
    }
    specificity
}

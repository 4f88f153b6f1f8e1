//! HTML-side utilities: void elements, closing-tag omission rules, and
//! character-reference decoding.

/// HTML void elements. These never take content or a closing tag.
/// See: https://developer.mozilla.org/en-US/docs/Glossary/Void_element
const VOID_ELEMENT_NAMES: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Returns true if `name` is a void element (or a `!doctype` spelling).
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENT_NAMES
        .iter()
        .any(|v| name.eq_ignore_ascii_case(v))
        || name.eq_ignore_ascii_case("!doctype")
}

/// Tags whose appearance implicitly closes a preceding open tag, per the
/// HTML optional-tag rules.
/// https://html.spec.whatwg.org/multipage/syntax.html#optional-tags
fn disallowed_contents(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "li" => Some(&["li"]),
        "dt" | "dd" => Some(&["dt", "dd"]),
        "p" => Some(&[
            "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer",
            "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "main", "menu",
            "nav", "ol", "p", "pre", "section", "table", "ul",
        ]),
        "rt" | "rp" => Some(&["rt", "rp"]),
        "optgroup" => Some(&["optgroup"]),
        "option" => Some(&["option", "optgroup"]),
        "thead" | "tbody" => Some(&["tbody", "tfoot"]),
        "tfoot" => Some(&["tbody"]),
        "tr" => Some(&["tr", "tbody"]),
        "td" | "th" => Some(&["td", "th", "tr"]),
        _ => None,
    }
}

/// Returns true when `<current>`'s closing tag may be omitted before an
/// opening `<next>` (or, with `next == None`, before the end of its
/// parent's content).
pub fn closing_tag_omitted(current: &str, next: Option<&str>) -> bool {
    match disallowed_contents(current) {
        Some(successors) => match next {
            Some(next) => successors.contains(&next),
            None => true,
        },
        None => false,
    }
}

/// Returns the closing bracket that pairs with an opening one.
pub fn bracket_pair(open: char) -> Option<char> {
    match open {
        '{' => Some('}'),
        '[' => Some(']'),
        '(' => Some(')'),
        _ => None,
    }
}

/// Returns true for characters that open a bracket group.
pub fn is_bracket_open(c: char) -> bool {
    matches!(c, '{' | '[' | '(')
}

/// Returns true for characters that close a bracket group.
pub fn is_bracket_close(c: char) -> bool {
    matches!(c, '}' | ']' | ')')
}

/// Windows-1252 corrections for the 0x80-0x9f range, which browsers decode
/// leniently. Indexed by `code - 128`.
const WINDOWS_1252: [u32; 32] = [
    8364, 129, 8218, 402, 8222, 8230, 8224, 8225, 710, 8240, 352, 8249, 338, 141, 381, 143, 144,
    8216, 8217, 8220, 8221, 8226, 8211, 8212, 732, 8482, 353, 8250, 339, 157, 382, 376,
];

/// Validates a numeric character-reference code the way browsers do.
/// Returns 0 for codes that cannot be represented.
fn validate_code(code: u32) -> u32 {
    if code == 10 {
        return 32;
    }
    if code < 128 {
        return code;
    }
    if code <= 159 {
        return WINDOWS_1252[(code - 128) as usize];
    }
    if code < 55296 {
        return code;
    }
    if code <= 57343 {
        return 0;
    }
    if code <= 196607 {
        return code;
    }
    0
}

/// The named entities recognized by the decoder. The full HTML table runs
/// to thousands of names; this covers the ones that occur in component
/// templates in practice. Unknown names pass through verbatim.
fn named_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "amp" | "AMP" => "&",
        "lt" | "LT" => "<",
        "gt" | "GT" => ">",
        "quot" | "QUOT" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" | "COPY" => "\u{a9}",
        "reg" | "REG" => "\u{ae}",
        "trade" => "\u{2122}",
        "deg" => "\u{b0}",
        "plusmn" => "\u{b1}",
        "frac12" => "\u{bd}",
        "frac14" => "\u{bc}",
        "frac34" => "\u{be}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "dagger" => "\u{2020}",
        "Dagger" => "\u{2021}",
        "prime" => "\u{2032}",
        "Prime" => "\u{2033}",
        "larr" => "\u{2190}",
        "uarr" => "\u{2191}",
        "rarr" => "\u{2192}",
        "darr" => "\u{2193}",
        "harr" => "\u{2194}",
        "euro" => "\u{20ac}",
        "pound" => "\u{a3}",
        "yen" => "\u{a5}",
        "cent" => "\u{a2}",
        "sect" => "\u{a7}",
        "para" => "\u{b6}",
        "middot" => "\u{b7}",
        "iexcl" => "\u{a1}",
        "iquest" => "\u{bf}",
        "szlig" => "\u{df}",
        "agrave" => "\u{e0}",
        "aacute" => "\u{e1}",
        "eacute" => "\u{e9}",
        "egrave" => "\u{e8}",
        "uuml" => "\u{fc}",
        "ouml" => "\u{f6}",
        "auml" => "\u{e4}",
        "ccedil" => "\u{e7}",
        "ntilde" => "\u{f1}",
        "oslash" => "\u{f8}",
        "aring" => "\u{e5}",
        "aelig" => "\u{e6}",
        "thinsp" => "\u{2009}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "shy" => "\u{ad}",
        "zwnj" => "\u{200c}",
        "zwj" => "\u{200d}",
        "infin" => "\u{221e}",
        "ne" => "\u{2260}",
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "minus" => "\u{2212}",
        _ => return None,
    })
}

/// Decodes HTML character references in `text`. References that do not
/// decode to a valid character are left verbatim, mirroring browser
/// leniency; a trailing `;` is optional.
pub fn decode_character_references(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'&' {
            let c = text[i..].chars().next().unwrap_or('\u{fffd}');
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        // collect the candidate entity body: `#?[a-zA-Z0-9]+`
        let body_start = i + 1;
        let mut j = body_start;
        if j < bytes.len() && bytes[j] == b'#' {
            j += 1;
        }
        while j < bytes.len() && bytes[j].is_ascii_alphanumeric() {
            j += 1;
        }
        if j == body_start || (j == body_start + 1 && bytes[body_start] == b'#') {
            out.push('&');
            i += 1;
            continue;
        }
        let body = &text[body_start..j];
        let consumed = if j < bytes.len() && bytes[j] == b';' { j + 1 } else { j };
        if let Some(decoded) = decode_entity_body(body) {
            out.push_str(&decoded);
            i = consumed;
        } else {
            out.push('&');
            i += 1;
        }
    }
    out
}

fn decode_entity_body(body: &str) -> Option<String> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = if let Some(hex) = numeric
            .strip_prefix('x')
            .or_else(|| numeric.strip_prefix('X'))
        {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            numeric.parse::<u32>().ok()?
        };
        let code = validate_code(code);
        if code == 0 {
            return None;
        }
        return char::from_u32(code).map(String::from);
    }
    named_entity(body).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_void_elements() {
        assert!(is_void("br"));
        assert!(is_void("IMG"));
        assert!(is_void("!doctype"));
        assert!(!is_void("div"));
    }

    #[test]
    fn test_closing_tag_omitted() {
        assert!(closing_tag_omitted("li", Some("li")));
        assert!(closing_tag_omitted("p", Some("div")));
        assert!(!closing_tag_omitted("p", Some("span")));
        assert!(closing_tag_omitted("td", None));
        assert!(!closing_tag_omitted("div", None));
    }

    #[test]
    fn test_decode_named_references() {
        assert_eq!(decode_character_references("a &amp; b"), "a & b");
        assert_eq!(decode_character_references("&lt;div&gt;"), "<div>");
        // missing semicolon is tolerated
        assert_eq!(decode_character_references("fish &amp chips"), "fish & chips");
        // unknown names pass through
        assert_eq!(decode_character_references("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_decode_numeric_references() {
        assert_eq!(decode_character_references("&#65;"), "A");
        assert_eq!(decode_character_references("&#x41;"), "A");
        // windows-1252 correction: 0x80 is the euro sign in browsers
        assert_eq!(decode_character_references("&#128;"), "\u{20ac}");
        // surrogate halves cannot be represented
        assert_eq!(decode_character_references("&#55296;"), "&#55296;");
    }

    #[test]
    fn test_bracket_pairing() {
        assert_eq!(bracket_pair('['), Some(']'));
        assert_eq!(bracket_pair('{'), Some('}'));
        assert!(is_bracket_open('('));
        assert!(is_bracket_close(')'));
        assert!(!is_bracket_open('<'));
    }
}

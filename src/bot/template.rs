use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `{{name}}` is substituted HTML-escaped, `{{{name}}}` verbatim.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(\{)?\s*([A-Za-z_][A-Za-z0-9_]*)\s*(\})?\}\}").expect("valid placeholder regex")
});

/// Renders a handlebars-style template from the `.clabot` file.
///
/// Only plain variable substitution is supported, which is all the policy messages use. Unknown
/// variables render as nothing.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let value = vars
                .iter()
                .find(|(name, _)| *name == &caps[2])
                .map_or("", |(_, value)| *value);

            let (open, close) = (caps.get(1).is_some(), caps.get(3).is_some());
            let mut out = String::new();
            if open && close {
                out.push_str(value);
                return out;
            }
            if open {
                out.push('{');
            }
            escape_html(value, &mut out);
            if close {
                out.push('}');
            }
            out
        })
        .into_owned()
}

fn escape_html(s: &str, out: &mut String) {
    let mut last = 0;
    for (i, c) in s.char_indices() {
        // NOTE: same set of characters handlebars escapes
        let escaped = match c {
            '>' => "&gt;",
            '<' => "&lt;",
            '&' => "&amp;",
            '\'' => "&#x27;",
            '"' => "&quot;",
            '`' => "&#x60;",
            '=' => "&#x3D;",
            _ => continue,
        };

        out.push_str(&s[last..i]);
        out.push_str(escaped);
        last = i + c.len_utf8();
    }

    if last < s.len() {
        out.push_str(&s[last..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_variables() {
        let rendered = render(
            "we don't seem to have the users {{usersWithoutCLA}} on file",
            &[("usersWithoutCLA", "@foo, @bob")],
        );

        assert_eq!(rendered, "we don't seem to have the users @foo, @bob on file");
    }

    #[test]
    fn tolerates_whitespace_and_repeats() {
        let rendered = render("{{ name }} and {{name}}", &[("name", "colin")]);

        assert_eq!(rendered, "colin and colin");
    }

    #[test]
    fn html_escape() {
        let rendered = render(
            "{{unidentifiedUsers}}",
            &[("unidentifiedUsers", "These should be escaped: < > & \" ' ` =")],
        );

        assert_eq!(
            rendered,
            "These should be escaped: &lt; &gt; &amp; &quot; &#x27; &#x60; &#x3D;"
        );
    }

    #[test]
    fn triple_braces_are_raw() {
        let rendered = render("{{{name}}}", &[("name", "<b>O'Neil</b>")]);

        assert_eq!(rendered, "<b>O'Neil</b>");
    }

    #[test]
    fn unknown_variables_are_empty() {
        assert_eq!(render("[{{missing}}]", &[("name", "x")]), "[]");
    }

    #[test]
    fn leaves_other_braces_alone() {
        assert_eq!(render("{ not a var } {{ 1nope }}", &[]), "{ not a var } {{ 1nope }}");
    }
}

//! Server-rendered quiz page
//!
//! The page is a pure function of a `SessionView`. Two forms post back to the
//! server: one submits the selected choice, the other asks for the next question.

use std::fmt::Write;

use crate::session::SessionView;

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render_page(view: &SessionView) -> String {
    let mut body = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(&view.title));

    if let Some(error) = &view.error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape_html(error));
    }

    if let Some(question) = &view.question {
        let _ = writeln!(body, "<p>{}</p>", escape_html(&view.prompt));
        let _ = writeln!(body, "<p class=\"question\">{}</p>", escape_html(question));

        let disabled = if view.can_answer { "" } else { " disabled" };
        let selected = view.outcome.as_ref().map(|o| o.choice).unwrap_or(1);
        let _ = writeln!(body, "<form method=\"post\" action=\"/answer\">");
        let _ = writeln!(body, "<fieldset{}><legend>Choices:</legend>", disabled);
        for choice in &view.choices {
            let checked = if choice.index == selected { " checked" } else { "" };
            let _ = writeln!(
                body,
                "<label><input type=\"radio\" name=\"choice\" value=\"{}\"{}> {}</label><br>",
                choice.index,
                checked,
                escape_html(&choice.label)
            );
        }
        let _ = writeln!(body, "<button type=\"submit\">Submit</button>");
        let _ = writeln!(body, "</fieldset></form>");
    }

    if let Some(outcome) = &view.outcome {
        if outcome.correct {
            let _ = writeln!(body, "<p class=\"success\">Correct!</p>");
        } else {
            let _ = writeln!(body, "<p class=\"error\">Incorrect...</p>");
            if let Some(explanation) = &outcome.explanation {
                let _ = writeln!(
                    body,
                    "<p class=\"explanation\">Explanation: {}</p>",
                    escape_html(explanation)
                );
            }
        }
    }

    let _ = writeln!(
        body,
        "<form method=\"post\" action=\"/next\"><button type=\"submit\">Next question</button></form>"
    );

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
<style>.error{{color:#b00020}}.success{{color:#1b7f3b}}.explanation{{white-space:pre-wrap}}</style>\n\
</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(&view.title),
        body
    )
}

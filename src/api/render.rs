// HTML for the single query page
use crate::error::AppError;
use crate::models::{display_value, QueryRun, ResultSet, ResultView};

const TITLE: &str = "Hospital Database NLP Query System";

/// The page: input form plus whatever the last request produced
pub fn page(question: &str, voice_enabled: bool, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
<p>Enter natural language questions about the hospital database and get answers instantly.
Examples: "Which doctors treat flu?", "Show me all patients over 40", etc.</p>
<form method="post" action="/">
<label for="question">Enter your question about the Hospital database:</label>
<input type="text" id="question" name="question" value="{question}" placeholder="e.g., Which doctors are assigned to treat Hypertension?">
<label><input type="checkbox" name="voice"{checked}> Enable Voice Output</label>
<button type="submit">Get Answer</button>
</form>
{body}
</body>
</html>
"#,
        title = TITLE,
        question = escape(question),
        checked = if voice_enabled { " checked" } else { "" },
        body = body,
    )
}

pub fn warning(message: &str) -> String {
    format!("<div class=\"warning\">{}</div>\n", escape(message))
}

fn error_block(error: &AppError) -> String {
    format!(
        "<div class=\"error\" data-code=\"{}\">{}</div>\n",
        error.code(),
        escape(&error.user_message())
    )
}

/// Everything a finished run has to show, in pipeline order
pub fn run(run: &QueryRun) -> String {
    let mut out = String::new();

    if let Some(generated) = &run.generated_text {
        out.push_str(&format!(
            "<details>\n<summary>View Generated SQL</summary>\n<pre><code class=\"language-sql\">{}</code></pre>\n</details>\n",
            escape(generated)
        ));
    }

    let notice = |pred: fn(&AppError) -> bool| -> String {
        run.notices.iter().filter(|n| pred(n)).map(error_block).collect()
    };

    match &run.results {
        ResultView::NotRun => {}
        ResultView::Empty => {
            out.push_str("<h2>Results</h2>\n<div class=\"info\">No results found.</div>\n");
        }
        ResultView::Table(set) => {
            out.push_str("<h2>Results</h2>\n");
            out.push_str(&table(set));
            if let Some(ms) = run.execution_time_ms {
                let rows = set.row_count();
                out.push_str(&format!(
                    "<p class=\"meta\">{} row{} in {} ms</p>\n",
                    rows,
                    if rows == 1 { "" } else { "s" },
                    ms
                ));
            }
        }
        ResultView::Unparsed(raw) => {
            out.push_str("<h2>Results</h2>\n");
            out.push_str(&notice(|n| matches!(n, AppError::Parse(_))));
            out.push_str(&format!("<pre class=\"raw\">{}</pre>\n", escape(raw)));
        }
    }

    let summary_notices = notice(|n| matches!(n, AppError::Summarization(_)));
    if run.summary.is_some() || !summary_notices.is_empty() {
        out.push_str("<h2>Summary</h2>\n");
        out.push_str(&summary_notices);
    }
    if let Some(summary) = &run.summary {
        out.push_str(&format!("<p class=\"summary\">{}</p>\n", escape(summary)));
    }

    let speech_notices = notice(|n| matches!(n, AppError::Synthesis(_)));
    if run.audio.is_some() || !speech_notices.is_empty() {
        out.push_str("<h2>Voice Summary</h2>\n");
        out.push_str(&speech_notices);
    }
    if let Some(audio) = &run.audio {
        out.push_str(&format!(
            "<p>Listen to the summary:</p>\n<audio controls autoplay>\n<source src=\"{}\" type=\"{}\">\nYour browser does not support the audio element.\n</audio>\n",
            audio.to_data_url(),
            audio.mime_type
        ));
    }

    if let Some(error) = &run.error {
        out.push_str(&error_block(error));
    }

    out
}

fn table(set: &ResultSet) -> String {
    let mut out = String::from("<table>\n<thead><tr>");
    for column in &set.columns {
        out.push_str(&format!("<th>{}</th>", escape(column)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in &set.rows {
        out.push_str("<tr>");
        for value in row {
            out.push_str(&format!("<td>{}</td>", escape(&display_value(value))));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

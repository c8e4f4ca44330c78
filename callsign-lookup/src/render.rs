//! HTML views
//!
//! Every page the service serves is small and static enough to build with
//! `format!`. All interpolated values go through [`escape_html`].

use axum::http::StatusCode;
use callsign_common::Member;

use crate::import::{ImportEvent, ImportSummary};

pub const ROOT_PAGE: &str = r#"<html>
	<body>
		<form action="/lookup" method="get">
			<div>Callsign: <input type="text" name="callsign"></input></div>
			<div><input type="submit" value="Lookup"></div>
		</form>
	</body>
</html>
"#;

pub const NOT_FOUND_PAGE: &str = r#"<html>
	<body>
		<div>Not Found.</div>
	</body>
</html>
"#;

/// Opening of the streamed update report
pub const REPORT_HEAD: &str = "<html><body>\n";

/// Closing of the streamed update report
pub const REPORT_TAIL: &str = "</body></html>\n";

/// Escape text for use in HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Directory entry view
pub fn lookup_page(member: &Member) -> String {
    format!(
        r#"<html>
	<body>
		<h3>{callsign}</h3>
		<div>{name}</div>
		<div>{street}</div>
		<div>{city}, {state} {zip}</div>
		<div>Joined: {joined}</div>
		<div>Expires: Q{quarter} {year}</div>
	</body>
</html>
"#,
        callsign = escape_html(&member.callsign),
        name = escape_html(&member.name),
        street = escape_html(&member.street),
        city = escape_html(&member.city),
        state = escape_html(&member.state),
        zip = escape_html(&member.zip),
        joined = escape_html(&member.date_joined),
        quarter = member.quarter_expiring,
        year = member.year_expiring,
    )
}

/// Upload form addressed to the signed-in user
pub fn update_form(user: &str) -> String {
    format!(
        r#"<html>
	<body>
		<form enctype="multipart/form-data" method="post">
			<p>Hello, {user}!</p>
			<p>Upload a new CSV file with callsigns.
			This will erase all data in favor of the new file.</p>
			<div><input type="file" name="csvfile"></input></div>
			<div><input type="submit" value="Update"></input></div>
		</form>
	</body>
</html>
"#,
        user = escape_html(user),
    )
}

/// Generic failure page
pub fn error_page(status: StatusCode, message: &str) -> String {
    format!(
        "<html><body><h3>{}</h3><div>{}</div></body></html>\n",
        status,
        escape_html(message)
    )
}

/// One fragment of the streamed update report
pub fn report_event(event: &ImportEvent) -> String {
    match event {
        ImportEvent::Adding(callsign) => {
            format!("<div>Adding {}</div>\n", escape_html(callsign))
        }
        ImportEvent::Diagnostic(diagnostic) => {
            format!("<div>{}</div>\n", escape_html(&diagnostic.to_string()))
        }
        ImportEvent::RowRejected(error) => {
            format!("<div>Skipped row: {}</div>\n", escape_html(&error.to_string()))
        }
        ImportEvent::WriteFailed(failure) => {
            format!("<div>Error: {}</div>\n", escape_html(&failure.to_string()))
        }
        ImportEvent::Deleting(callsign) => {
            format!("<div>Deleting {}</div>\n", escape_html(callsign))
        }
        ImportEvent::Finished(summary) => report_summary(summary),
        ImportEvent::Aborted(message) => format!(
            "<div><b>Import aborted:</b> {}</div>\n",
            escape_html(message)
        ),
    }
}

fn report_summary(summary: &ImportSummary) -> String {
    let mut html = format!("<div>{}</div>\n", summary);
    if !summary.duplicates.is_empty() {
        html.push_str(&format!(
            "<div>Found {} duplicates:<ul>\n",
            summary.duplicates.len()
        ));
        for callsign in &summary.duplicates {
            html.push_str(&format!("<li>{}</li>\n", escape_html(callsign)));
        }
        html.push_str("</ul></div>\n");
    }
    html
}

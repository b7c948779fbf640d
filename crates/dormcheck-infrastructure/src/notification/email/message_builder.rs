use dormcheck_domain::notification::NotificationMessage;

const CLOSING_LINE: &str = "感谢您使用 DormCheck 签到平台。";

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// One `<p>` per content line, blank lines dropped, closing line appended
pub(super) fn build_html_body(message: &NotificationMessage) -> String {
    let mut html = String::new();

    for line in message.content.lines().filter(|l| !l.trim().is_empty()) {
        html.push_str("<p>");
        html.push_str(&escape_html(line));
        html.push_str("</p>\n");
    }

    if let Some(link) = &message.link {
        let link = escape_html(link);
        html.push_str(&format!("<p><a href=\"{link}\">{link}</a></p>\n"));
    }

    html.push_str("<p>");
    html.push_str(CLOSING_LINE);
    html.push_str("</p>\n");
    html
}

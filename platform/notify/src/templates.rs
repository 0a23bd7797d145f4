//! HTML bodies for outbound mail.

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body style=\"font-family:Arial,sans-serif;background:#f4f4f4;padding:24px\">\
         <div style=\"max-width:600px;margin:0 auto;background:#ffffff;padding:24px;border-radius:8px\">\
         <h2 style=\"color:#333333\">{title}</h2>{content}</div></body></html>",
        title = escape(title),
    )
}

/// Status notification for a single task field.
pub fn task_update(title: &str, task_name: &str, status: &str, message: &str) -> String {
    let content = format!(
        "<p><strong>Task:</strong> {}</p><p><strong>Status:</strong> {}</p><p>{}</p>",
        escape(task_name),
        escape(status),
        escape(message),
    );
    layout(title, &content)
}

pub fn calendar_invite(summary: &str, description: &str) -> String {
    let content = format!(
        "<p>You have been invited to <strong>{}</strong>.</p><p>{}</p>\
         <p>Check your calendar for the event details.</p>",
        escape(summary),
        escape(description),
    );
    layout("Calendar Invite", &content)
}

pub fn reset_code(code: &str, ttl_minutes: i64) -> String {
    let content = format!(
        "<p>Your password reset code is:</p>\
         <p style=\"font-size:24px;letter-spacing:4px\"><strong>{}</strong></p>\
         <p>The code expires in {ttl_minutes} minutes.</p>",
        escape(code),
    );
    layout("Password Reset Code", &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_update_interpolates_and_escapes() {
        let html = task_update(
            "Planning Status Update",
            "Design <v2>",
            "Approved",
            "The planning for this task has been approved.",
        );
        assert!(html.contains("Planning Status Update"));
        assert!(html.contains("Design &lt;v2&gt;"));
        assert!(html.contains("Approved"));
        assert!(!html.contains("<v2>"));
    }

    #[test]
    fn newlines_become_line_breaks() {
        let html = task_update("t", "n", "s", "File Name: a.pdf\nFile URL: https://x");
        assert!(html.contains("a.pdf<br>File URL"));
    }

    #[test]
    fn reset_code_mentions_ttl() {
        let html = reset_code("AB12CD", 15);
        assert!(html.contains("AB12CD"));
        assert!(html.contains("15 minutes"));
    }
}

use url::Url;

use crate::application::use_cases::event::ActivityEventProfile;
use crate::domain::entities::event_level::EventLevel;

const BRAND_NAME: &str = "logledger";

fn origin_label(app_origin: &str) -> String {
    Url::parse(app_origin)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()))
        .unwrap_or_else(|| app_origin.to_string())
}

/// Where tenants manage their notification preferences.
pub fn settings_url(app_origin: &str) -> String {
    format!("{}/settings", app_origin.trim_end_matches('/'))
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn accent_color(level: EventLevel) -> &'static str {
    match level {
        EventLevel::Error => "#dc2626",
        _ => "#f59e0b",
    }
}

fn title_case(level: EventLevel) -> &'static str {
    match level {
        EventLevel::Debug => "Debug",
        EventLevel::Info => "Info",
        EventLevel::Warning => "Warning",
        EventLevel::Error => "Error",
    }
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        r#"<p style="margin:6px 0;font-size:14px;color:#111827;"><strong style="color:#4b5563;">{label}:</strong> {value}</p>"#
    )
}

/// Subject and HTML body for an activity event alert.
pub fn event_alert_email(
    app_origin: &str,
    project_name: &str,
    event: &ActivityEventProfile,
) -> (String, String) {
    let level = event.level;
    let subject = format!(
        "[{}] {} - {} Alert",
        level.label(),
        project_name,
        title_case(level)
    );

    let project = escape_html(project_name);
    let timestamp = event.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let mut details = vec![
        detail_row("Level", level.label()),
        detail_row("Project", &project),
        detail_row("Message", &escape_html(&event.message)),
        detail_row("User ID", &escape_html(&event.user_id)),
        detail_row("Timestamp", &timestamp),
    ];
    if !event.metadata.is_empty() {
        let metadata = serde_json::Value::Object(event.metadata.clone()).to_string();
        details.push(detail_row("Metadata", &escape_html(&metadata)));
    }

    let settings = settings_url(app_origin);
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <body style="background:#f8fafc;margin:0;padding:24px;font-family:Arial,Helvetica,sans-serif;">
    <div style="max-width:560px;margin:0 auto;background:#ffffff;border:1px solid #e5e7eb;border-radius:12px;overflow:hidden;">
      <div style="background:{accent};color:#ffffff;padding:20px 24px;">
        <h1 style="margin:0;font-size:20px;">{label} Alert</h1>
        <p style="margin:4px 0 0;font-size:14px;">{project}</p>
      </div>
      <div style="padding:24px;">
        <p style="margin:0 0 12px;font-size:15px;color:#111827;">A {level} event was received for your project.</p>
        {details}
        <div style="margin-top:20px;padding-top:16px;border-top:1px solid #e5e7eb;">
          <p style="margin:0;font-size:13px;color:#4b5563;"><a href="{settings}">Manage notification preferences</a></p>
        </div>
        <p style="margin:14px 0 0;font-size:12px;color:#9ca3af;">Sent by {brand} - {origin}</p>
      </div>
    </div>
  </body>
</html>
"#,
        accent = accent_color(level),
        label = level.label(),
        project = project,
        level = level.as_str(),
        details = details.join("\n        "),
        settings = settings,
        brand = BRAND_NAME,
        origin = origin_label(app_origin),
    );

    (subject, html)
}

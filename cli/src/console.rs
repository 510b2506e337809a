//! Terminal rendering of endpoints, forms and outcomes.

use std::io::{self, Write};

use trueshift_core::{
    EndpointId, Notification, NotificationLevel, Notifier, Outcome, RenderedField, Section,
    Session,
};

/// Prints notifications to stderr, one line each.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let mark = match notification.level {
            NotificationLevel::Success => "✔",
            NotificationLevel::Failure => "✖",
            NotificationLevel::Info => "ℹ",
        };
        eprintln!("{mark} {}", notification.message);
    }
}

pub fn auth_badge(session: &Session) -> &'static str {
    if session.is_authenticated() {
        "🔓 Authenticated"
    } else {
        "🔒 Not Authenticated"
    }
}

/// Numbered listing grouped by section. Numbers follow `EndpointId::ALL`.
pub fn print_endpoints(out: &mut impl Write) -> io::Result<()> {
    for section in Section::ALL {
        writeln!(out, "{} - {}", section.title(), section.description())?;
        for id in section.endpoints() {
            let number = EndpointId::ALL
                .iter()
                .position(|other| *other == id)
                .map_or(0, |i| i + 1);
            let descriptor = id.descriptor();
            let lock = if descriptor.requires_auth { " 🔒" } else { "" };
            writeln!(
                out,
                "  {number:>2}. {:<6} {:<34} {}{lock}  [{}]",
                descriptor.method.as_str(),
                descriptor.path,
                descriptor.description,
                id.slug(),
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn print_header(out: &mut impl Write, id: EndpointId) -> io::Result<()> {
    let descriptor = id.descriptor();
    writeln!(out, "{} {}", descriptor.method, descriptor.path)?;
    writeln!(out, "{}", descriptor.description)?;
    if descriptor.requires_auth {
        writeln!(out, "🔒 Requires JWT")?;
    }
    Ok(())
}

/// The prompt shown before reading a field value.
pub fn field_prompt(field: &RenderedField) -> String {
    let hint = if !field.display.is_empty() {
        field.display.as_str()
    } else {
        field.placeholder.unwrap_or_default()
    };
    let mut prompt = format!("{} ({})", field.label, field.input_type);
    if !hint.is_empty() {
        prompt.push_str(&format!(" [{hint}]"));
    }
    if field.multiline {
        prompt.push_str("\n  end with a line containing only '.'");
    }
    prompt.push_str(": ");
    prompt
}

pub fn print_outcome(out: &mut impl Write, outcome: &Outcome) -> io::Result<()> {
    writeln!(out, "Response:")?;
    writeln!(out, "{}", outcome.render())
}

//! # Alert Rendering
//!
//! Turns an [`ErrorRecord`] into the title and body of a chat message. The
//! layout is the same for every channel; what differs is the markup, which is
//! supplied by a [`Dialect`].
//!
//! Every value that ends up in the message (environment label, record fields,
//! detail keys and values) goes through the same pipeline: cut to
//! [`MAX_VALUE_CHARS`] characters, newlines replaced by a literal `\n`, then
//! escaped for the dialect. Values that were cut get [`TRUNCATION_MARKER`]
//! appended.

use std::collections::BTreeSet;

use crate::models::{ErrorRecord, NotificationMessage};

/// Longest value, in characters, rendered before truncation kicks in.
pub const MAX_VALUE_CHARS: usize = 1000;

/// Appended to values that were cut at [`MAX_VALUE_CHARS`].
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// The markup family a channel expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Telegram Bot API with `parse_mode: HTML`.
    Telegram,
    /// Discord Markdown.
    Discord,
    /// Unformatted text.
    Plain,
}

impl ChannelKind {
    /// The dialect used to format messages for this channel.
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            ChannelKind::Telegram => &TelegramHtml,
            ChannelKind::Discord => &DiscordMarkdown,
            ChannelKind::Plain => &PlainText,
        }
    }
}

/// Markup rules for one family of channels.
///
/// `escape` receives text that is already truncated and has its newlines
/// replaced. The formatting methods receive values that are already escaped.
pub trait Dialect: Send + Sync {
    /// Escapes characters that carry meaning in this markup.
    fn escape(&self, text: &str) -> String;

    /// The message title, including its trailing newline.
    fn title(&self) -> String;

    /// One `label: value` line of the summary block.
    fn field(&self, label: &str, value: &str) -> String;

    /// The line introducing the details block.
    fn details_header(&self) -> String;

    /// One line of the details block.
    fn detail(&self, key: &str, value: &str) -> String;
}

/// Telegram HTML.
pub struct TelegramHtml;

impl Dialect for TelegramHtml {
    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&#34;"),
                '\'' => out.push_str("&#39;"),
                _ => out.push(c),
            }
        }
        out
    }

    fn title(&self) -> String {
        "<b>❗ Error alert from Sentinel</b>\n".to_string()
    }

    fn field(&self, label: &str, value: &str) -> String {
        format!("<b>{label}:</b> {value}\n")
    }

    fn details_header(&self) -> String {
        "\n<b>📋 <i>Additional details</i></b>\n".to_string()
    }

    fn detail(&self, key: &str, value: &str) -> String {
        format!("<i>{key}</i>: <code>{value}</code>\n")
    }
}

/// Discord Markdown.
pub struct DiscordMarkdown;

impl Dialect for DiscordMarkdown {
    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if matches!(c, '*' | '_' | '`' | '~' | '|') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    fn title(&self) -> String {
        "**❗ Error from Sentinel**\n".to_string()
    }

    fn field(&self, label: &str, value: &str) -> String {
        format!("**{label}:** {value}\n")
    }

    fn details_header(&self) -> String {
        "\n**📋 _Additional details_**\n".to_string()
    }

    fn detail(&self, key: &str, value: &str) -> String {
        format!("_{key}_: `{value}`\n")
    }
}

/// Plain text, used for standard output.
pub struct PlainText;

impl Dialect for PlainText {
    fn escape(&self, text: &str) -> String {
        text.to_string()
    }

    fn title(&self) -> String {
        "❗ Error alert from Sentinel\n".to_string()
    }

    fn field(&self, label: &str, value: &str) -> String {
        format!("{label}: {value}\n")
    }

    fn details_header(&self) -> String {
        "\n📋 Additional details\n".to_string()
    }

    fn detail(&self, key: &str, value: &str) -> String {
        format!("{key}: {value}\n")
    }
}

/// Which detail keys may appear in an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailVisibility {
    /// Every key is shown.
    All,
    /// Only the listed keys are shown.
    Only(BTreeSet<String>),
}

impl DetailVisibility {
    /// Builds the policy from configured keys. A `*` entry shows everything.
    pub fn from_keys(keys: &[String]) -> Self {
        if keys.iter().any(|k| k == "*") {
            DetailVisibility::All
        } else {
            DetailVisibility::Only(keys.iter().cloned().collect())
        }
    }

    /// Whether `key` may be rendered.
    pub fn allows(&self, key: &str) -> bool {
        match self {
            DetailVisibility::All => true,
            DetailVisibility::Only(keys) => keys.contains(key),
        }
    }
}

/// Renders error records into channel-specific messages.
#[derive(Debug, Clone)]
pub struct AlertRenderer {
    environment: String,
    visibility: DetailVisibility,
}

impl AlertRenderer {
    /// Creates a renderer for the given deployment label and visible keys.
    pub fn new(environment: impl Into<String>, visible_details: &[String]) -> Self {
        Self {
            environment: environment.into(),
            visibility: DetailVisibility::from_keys(visible_details),
        }
    }

    /// Renders `record` for a channel of the given kind.
    pub fn render(&self, record: &ErrorRecord, kind: ChannelKind) -> NotificationMessage {
        let dialect = kind.dialect();
        let value = |text: &str| sanitize(text, dialect);

        let mut body = String::new();
        body.push_str(&dialect.field("🔍 Environment", &value(&self.environment)));
        body.push_str(&dialect.field("🛠️ Service", &value(&record.service)));
        body.push_str(&dialect.field("🔄 Operation", &value(&record.operation)));
        body.push_str(&dialect.field("🏷️ Code", &value(&record.code)));
        body.push_str(&dialect.field("💬 Message", &value(&record.message)));

        body.push_str(&dialect.details_header());
        for (key, val) in record.details.iter().filter(|(key, _)| self.visibility.allows(key)) {
            body.push_str(&dialect.detail(&value(key), &value(val)));
        }

        NotificationMessage { title: dialect.title(), body }
    }
}

/// Truncates, flattens newlines and escapes a single value.
fn sanitize(text: &str, dialect: &dyn Dialect) -> String {
    let truncated = text.chars().count() > MAX_VALUE_CHARS;
    let cut: String = if truncated {
        text.chars().take(MAX_VALUE_CHARS).collect()
    } else {
        text.to_string()
    };
    let mut out = dialect.escape(&cut.replace('\n', "\\n"));
    if truncated {
        out.push_str(TRUNCATION_MARKER);
    }
    out
}

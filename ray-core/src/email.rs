//! "Email me this" side effect
//!
//! The chat route recognises a small set of phrases asking for the last
//! answer by email. Sending never fails the chat request: the outcome is
//! reported in-band and merged into the response.

use tracing::{info, warn};

use crate::classifier::find_last_assistant_message;
use crate::transport::{Mailer, OutgoingEmail};
use crate::types::{ChatMessage, EmailOutcome};

const EMAIL_PHRASES: &[&str] = &[
    "email that to me",
    "email this to me",
    "email it to me",
    "email me that",
    "email me this",
    "send this to my email",
    "send that to my email",
    "send it to my email",
    "send to my email",
];

/// Subject line for answers sent from the chat
pub const DEFAULT_SUBJECT: &str = "From Ray";

pub fn is_email_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    EMAIL_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Render plain text as an HTML email body; blank lines separate paragraphs.
pub fn render_email_html(subject: &str, content: &str) -> String {
    let paragraphs: String = content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p).replace('\n', "<br>")))
        .collect();

    format!(
        "<div style=\"font-family: sans-serif; line-height: 1.5\"><h2>{}</h2>{}</div>",
        escape_html(subject),
        paragraphs
    )
}

/// In-band reply for an email request plus its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReply {
    pub message: String,
    pub outcome: EmailOutcome,
}

/// Email the last assistant answer in `history` to `to`.
pub async fn email_last_answer(
    mailer: &dyn Mailer,
    history: &[ChatMessage],
    to: Option<&str>,
) -> EmailReply {
    let to = to.map(str::trim).filter(|t| !t.is_empty());

    let Some(content) = find_last_assistant_message(history).map(str::trim) else {
        return EmailReply {
            message: "There's nothing to email yet. Ask me something first.".to_string(),
            outcome: EmailOutcome {
                sent: false,
                to: to.map(String::from),
                error: Some("nothing to email".to_string()),
            },
        };
    };

    let Some(address) = to else {
        return EmailReply {
            message: format!("I don't have an email address on file for you. Here it is again:\n\n{content}"),
            outcome: EmailOutcome {
                sent: false,
                to: None,
                error: Some("no email address on file".to_string()),
            },
        };
    };

    let email = OutgoingEmail {
        to: address.to_string(),
        subject: DEFAULT_SUBJECT.to_string(),
        html: render_email_html(DEFAULT_SUBJECT, content),
    };

    match mailer.send(email).await {
        Ok(id) => {
            info!("Emailed last answer to {} ({})", address, id);
            EmailReply {
                message: format!("Done, I've emailed that to {address}.\n\n{content}"),
                outcome: EmailOutcome {
                    sent: true,
                    to: Some(address.to_string()),
                    error: None,
                },
            }
        },
        Err(e) => {
            warn!("Email to {} failed: {}", address, e);
            EmailReply {
                message: format!(
                    "I tried to email that but something went wrong. Here it is again:\n\n{content}"
                ),
                outcome: EmailOutcome {
                    sent: false,
                    to: Some(address.to_string()),
                    error: Some(e.to_string()),
                },
            }
        },
    }
}

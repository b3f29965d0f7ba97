//! Labeled-section scanner for model replies
//!
//! Grammar: `Label: text` where the text runs to the label's terminator or
//! the end of the reply. `Thought:` and `Observation:` end at any following
//! label, `Action:` only at `Action Input:`, `Action Input:` only at
//! `Observation:`, and `Final Answer:` always runs to the end. Labels are
//! matched case-sensitively and the first occurrence of each label wins.
//! Every extracted value is trimmed.

/// Section labels recognized in a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Thought,
    Action,
    ActionInput,
    Observation,
    FinalAnswer,
}

impl Label {
    /// Longer labels first so `Action Input:` never scans as `Action:`
    const SCAN_ORDER: [Label; 5] = [
        Label::ActionInput,
        Label::FinalAnswer,
        Label::Observation,
        Label::Thought,
        Label::Action,
    ];

    /// Whether a section of this label stops where `next` begins
    fn ends_at(&self, next: Label) -> bool {
        match self {
            Label::Thought | Label::Observation => true,
            Label::Action => next == Label::ActionInput,
            Label::ActionInput => next == Label::Observation,
            Label::FinalAnswer => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Thought => "Thought:",
            Label::Action => "Action:",
            Label::ActionInput => "Action Input:",
            Label::Observation => "Observation:",
            Label::FinalAnswer => "Final Answer:",
        }
    }
}

/// Fields extracted from one reply. `Some("")` means the label was present
/// with no text after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    pub thought: Option<String>,
    pub action: Option<String>,
    pub action_input: Option<String>,
    pub observation: Option<String>,
    pub final_answer: Option<String>,
}

impl ParsedReply {
    /// The action name, if one was given and is non-empty
    pub fn action_name(&self) -> Option<&str> {
        self.action.as_deref().filter(|a| !a.is_empty())
    }
}

/// A label occurrence: where it starts and where its text starts
#[derive(Debug, Clone, Copy)]
struct Marker {
    label: Label,
    start: usize,
    body: usize,
}

fn scan_markers(text: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let hit = Label::SCAN_ORDER
            .iter()
            .find(|label| rest.starts_with(label.as_str()));

        match hit {
            Some(label) => {
                let body = pos + label.as_str().len();
                markers.push(Marker {
                    label: *label,
                    start: pos,
                    body,
                });
                pos = body;
            }
            None => {
                // Advance by one character, staying on a UTF-8 boundary
                pos += rest.chars().next().map(char::len_utf8).unwrap_or(1);
            }
        }
    }

    markers
}

/// Extract the labeled sections from a reply
pub fn parse_reply(text: &str) -> ParsedReply {
    let markers = scan_markers(text);
    let mut parsed = ParsedReply::default();

    for (i, marker) in markers.iter().enumerate() {
        let end = markers[i + 1..]
            .iter()
            .find(|next| marker.label.ends_at(next.label))
            .map(|next| next.start)
            .unwrap_or(text.len());
        let value = text[marker.body..end].trim().to_string();

        let slot = match marker.label {
            Label::Thought => &mut parsed.thought,
            Label::Action => &mut parsed.action,
            Label::ActionInput => &mut parsed.action_input,
            Label::Observation => &mut parsed.observation,
            Label::FinalAnswer => &mut parsed.final_answer,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    parsed
}

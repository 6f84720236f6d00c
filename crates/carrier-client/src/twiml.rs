//! Voice-control document builder.
//!
//! Builds the small XML documents returned to the carrier telling it
//! what to do with an answered leg. Pure string construction, no
//! network or state access; every embedded value is XML-escaped.

/// A single instruction in a voice-control document.
#[derive(Debug, Clone, PartialEq)]
enum Verb {
    Say { text: String, language: String },
    DialConference { room: String },
    Hangup,
}

/// Builder for the instruction document returned to the carrier.
#[derive(Debug, Clone, Default)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self { verbs: Vec::new() }
    }

    /// Speak `text` to the connected party before the next verb runs.
    pub fn say(mut self, text: &str, language: &str) -> Self {
        self.verbs.push(Verb::Say {
            text: text.into(),
            language: language.into(),
        });
        self
    }

    /// Join the named conference room.
    ///
    /// The first leg in opens the room and waits with audio open; the
    /// first leg out tears the room down, ending the other leg. Join
    /// beeps are disabled so neither party perceives the bridge.
    pub fn dial_conference(mut self, room: &str) -> Self {
        self.verbs.push(Verb::DialConference { room: room.into() });
        self
    }

    /// End the call.
    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    /// Render the XML document.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>");
        for verb in &self.verbs {
            match verb {
                Verb::Say { text, language } => {
                    xml.push_str(&format!(
                        "<Say language=\"{}\">{}</Say>",
                        escape_xml(language),
                        escape_xml(text)
                    ));
                }
                Verb::DialConference { room } => {
                    xml.push_str(&format!(
                        "<Dial><Conference beep=\"false\" startConferenceOnEnter=\"true\" endConferenceOnExit=\"true\">{}</Conference></Dial>",
                        escape_xml(room)
                    ));
                }
                Verb::Hangup => xml.push_str("<Hangup/>"),
            }
        }
        xml.push_str("</Response>");
        xml
    }
}

/// Escape a value for XML text or attribute position.
fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

//! Golden transcripts for the line protocol.
//!
//! Each vector pins the exact messages two harnesses exchange for a small
//! record set. Any other implementation of protocol version 1 must produce
//! the same bytes.

/// A golden two-party exchange.
#[derive(Debug, Clone)]
pub struct GoldenTranscript {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// `item` lines fed to the client before `seal`.
    pub client_items: &'static [&'static str],
    /// `item` lines fed to the server before `seal`.
    pub server_items: &'static [&'static str],
    /// Client `msg` payloads in order.
    pub client_messages: &'static [&'static str],
    /// Server `msg` payloads in order.
    pub server_messages: &'static [&'static str],
    pub have: &'static [&'static str],
    pub need: &'static [&'static str],
}

/// Get all golden transcripts.
pub fn all_transcripts() -> Vec<GoldenTranscript> {
    vec![
        GoldenTranscript {
            name: "server holds one extra record",
            client_items: &["item,100,aa"],
            server_items: &["item,100,aa", "item,200,bb"],
            client_messages: &["6100000201aa"],
            server_messages: &["6100000202aabb"],
            have: &[],
            need: &["bb"],
        },
        GoldenTranscript {
            name: "both sides empty",
            client_items: &[],
            server_items: &[],
            client_messages: &["6100000200"],
            server_messages: &["6100000200"],
            have: &[],
            need: &[],
        },
        GoldenTranscript {
            name: "disjoint single records",
            client_items: &["item,5,01"],
            server_items: &["item,6,02"],
            client_messages: &["610000020101"],
            server_messages: &["610000020102"],
            have: &["01"],
            need: &["02"],
        },
    ]
}

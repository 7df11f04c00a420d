use crate::render::RenderPolicy;

/// Controls how envelopes are recognized and records rendered.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Enum field holding the payload kind of an envelope.
    pub kind_field: String,
    /// Bytes field holding the serialized payload of an envelope.
    pub payload_field: String,
    /// Rendering policy applied at every level.
    pub render: RenderPolicy,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            kind_field: "payload_kind".to_string(),
            payload_field: "payload_buffer".to_string(),
            render: RenderPolicy::default(),
        }
    }
}

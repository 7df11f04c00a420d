//! Canonical rendering of decoded records to JSON.
//!
//! Enums render by symbolic name, fields keep their proto names, and
//! default-valued fields are emitted. Message types listed as big integers
//! collapse to the decimal string of their big-endian `bytes` field.

use chainpeek_schema::builtin::DETH_BIG_INT;
use num_bigint::BigUint;
use prost_reflect::{DynamicMessage, Kind, MessageDescriptor, ReflectMessage, SerializeOptions};
use serde_json::Value;

use crate::error::{DecodeError, Result};

#[derive(Debug, Clone)]
pub struct RenderPolicy {
    /// Fully-qualified message types rendered as decimal big integers.
    pub big_integer_types: Vec<String>,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            big_integer_types: vec![DETH_BIG_INT.to_string()],
        }
    }
}

impl RenderPolicy {
    /// Render with no big-integer overrides.
    pub fn plain() -> Self {
        Self {
            big_integer_types: Vec::new(),
        }
    }

    fn options() -> SerializeOptions {
        SerializeOptions::new()
            .use_enum_numbers(false)
            .use_proto_field_name(true)
            .skip_default_fields(false)
            .stringify_64_bit_integers(true)
    }

    pub fn render(&self, message: &DynamicMessage) -> Result<Value> {
        let descriptor = message.descriptor();
        if self.is_big_integer(&descriptor) {
            if let Some(value) = big_integer(message) {
                return Ok(value);
            }
        }

        let mut document = message
            .serialize_with_options(serde_json::value::Serializer, &Self::options())
            .map_err(|source| DecodeError::Render {
                message_type: descriptor.full_name().to_string(),
                source,
            })?;
        if !self.big_integer_types.is_empty() {
            self.rewrite_big_integers(message, &mut document);
        }
        Ok(document)
    }

    fn is_big_integer(&self, descriptor: &MessageDescriptor) -> bool {
        self.big_integer_types
            .iter()
            .any(|name| name == descriptor.full_name())
    }

    // Walks the message alongside its rendering. Map-valued fields are left
    // as rendered.
    fn rewrite_big_integers(&self, message: &DynamicMessage, document: &mut Value) {
        let Value::Object(map) = document else {
            return;
        };

        for field in message.descriptor().fields() {
            if !matches!(field.kind(), Kind::Message(_)) || !message.has_field(&field) {
                continue;
            }
            let Some(slot) = map.get_mut(field.name()) else {
                continue;
            };

            match (message.get_field(&field).as_ref(), slot) {
                (prost_reflect::Value::Message(inner), slot) => self.rewrite_nested(inner, slot),
                (prost_reflect::Value::List(items), Value::Array(slots)) => {
                    for (item, slot) in items.iter().zip(slots.iter_mut()) {
                        if let prost_reflect::Value::Message(inner) = item {
                            self.rewrite_nested(inner, slot);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn rewrite_nested(&self, message: &DynamicMessage, slot: &mut Value) {
        if self.is_big_integer(&message.descriptor()) {
            if let Some(value) = big_integer(message) {
                *slot = value;
            }
        } else {
            self.rewrite_big_integers(message, slot);
        }
    }
}

fn big_integer(message: &DynamicMessage) -> Option<Value> {
    let field = message.get_field_by_name("bytes")?;
    let prost_reflect::Value::Bytes(bytes) = field.as_ref() else {
        return None;
    };
    Some(Value::String(BigUint::from_bytes_be(bytes).to_string()))
}

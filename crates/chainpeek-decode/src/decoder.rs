use chainpeek_schema::{Protocol, SchemaRegistry, Selector};
use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, MessageDescriptor};
use serde_json::Value;
use tracing::trace;

use crate::budget::RecursionBudget;
use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};
use crate::splice::splice;

/// Decodes records and expands envelope payloads up to a recursion budget.
///
/// Holds only a shared reference to the registry, so any number of
/// decoders may run concurrently against one registry.
#[derive(Debug, Clone)]
pub struct EnvelopeDecoder<'r> {
    registry: &'r SchemaRegistry,
    config: DecoderConfig,
}

impl<'r> EnvelopeDecoder<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self::with_config(registry, DecoderConfig::default())
    }

    pub fn with_config(registry: &'r SchemaRegistry, config: DecoderConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one container frame using the registry's frame type.
    pub fn decode_frame(
        &self,
        protocol: Protocol,
        bytes: &[u8],
        budget: RecursionBudget,
    ) -> Result<Value> {
        let descriptor = self
            .registry
            .frame_type()
            .ok_or(DecodeError::MissingFrameType)?;
        self.decode(protocol, descriptor, bytes, budget)
    }

    /// Decode `bytes` as `descriptor` and render it.
    ///
    /// When the record is an envelope and the budget allows another layer,
    /// its payload is decoded with the descriptor registered for its kind and
    /// spliced over the payload field. The registry is not consulted at
    /// budget zero, so unknown kinds below the budget never fail.
    pub fn decode(
        &self,
        protocol: Protocol,
        descriptor: &MessageDescriptor,
        bytes: &[u8],
        budget: RecursionBudget,
    ) -> Result<Value> {
        let message = DynamicMessage::decode(descriptor.clone(), bytes).map_err(|source| {
            DecodeError::Deserialize {
                message_type: descriptor.full_name().to_string(),
                len: bytes.len(),
                source,
            }
        })?;
        let mut document = self.config.render.render(&message)?;

        let Some(next) = budget.descend() else {
            return Ok(document);
        };
        let Some((kind_field, payload_field)) = self.envelope_fields(descriptor) else {
            return Ok(document);
        };

        let (number, name) = payload_kind(&message, &kind_field);
        let child_descriptor = name
            .as_deref()
            .and_then(|name| self.registry.resolve(protocol, Selector::PayloadKind(name)))
            .ok_or_else(|| DecodeError::UnsupportedKind {
                protocol,
                kind: name.clone().unwrap_or_else(|| number.to_string()),
                message_type: descriptor.full_name().to_string(),
                field: kind_field.name().to_string(),
            })?;

        let payload = message.get_field(&payload_field);
        let payload: &[u8] = match payload.as_ref() {
            prost_reflect::Value::Bytes(bytes) => bytes,
            _ => &[],
        };
        trace!(
            parent = descriptor.full_name(),
            child = child_descriptor.full_name(),
            size = payload.len(),
            remaining = next.remaining(),
            "expanding envelope payload"
        );

        let child = self.decode(protocol, &child_descriptor, payload, next)?;
        splice(&mut document, payload_field.name(), child)?;
        Ok(document)
    }

    fn envelope_fields(
        &self,
        descriptor: &MessageDescriptor,
    ) -> Option<(FieldDescriptor, FieldDescriptor)> {
        let kind = descriptor.get_field_by_name(&self.config.kind_field)?;
        let payload = descriptor.get_field_by_name(&self.config.payload_field)?;
        let is_envelope = matches!(kind.kind(), Kind::Enum(_))
            && matches!(payload.kind(), Kind::Bytes)
            && !kind.is_list()
            && !payload.is_list();
        is_envelope.then_some((kind, payload))
    }
}

// The enumerant number and, when the enum declares it, its symbolic name.
fn payload_kind(message: &DynamicMessage, field: &FieldDescriptor) -> (i32, Option<String>) {
    let number = match message.get_field(field).as_ref() {
        prost_reflect::Value::EnumNumber(number) => *number,
        _ => 0,
    };
    let name = match field.kind() {
        Kind::Enum(enumeration) => enumeration
            .get_value(number)
            .map(|value| value.name().to_string()),
        _ => None,
    };
    (number, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpeek_schema::descriptor::{enum_field, enumeration, file, message, scalar};
    use chainpeek_schema::RegistryBuilder;
    use prost::Message;
    use prost_reflect::Value as ProtoValue;
    use prost_types::field_descriptor_proto::Type;
    use serde_json::json;

    const KIND_MIDDLE: i32 = 1;
    const KIND_LEAF: i32 = 2;
    const KIND_MYSTERY: i32 = 3;

    fn layered_registry() -> SchemaRegistry {
        let schema = file(
            "test/layers.proto",
            "test.v1",
            vec![
                message(
                    "Envelope",
                    vec![
                        scalar("number", 1, Type::Uint32),
                        enum_field("payload_kind", 2, "test.v1.Kind"),
                        scalar("payload_buffer", 3, Type::Bytes),
                    ],
                ),
                message(
                    "Leaf",
                    vec![
                        scalar("name", 1, Type::String),
                        scalar("count", 2, Type::Uint32),
                        enum_field("color", 3, "test.v1.Color"),
                    ],
                ),
            ],
            vec![
                enumeration(
                    "Kind",
                    &[("NONE", 0), ("MIDDLE", 1), ("LEAF", 2), ("MYSTERY", 3)],
                ),
                enumeration("Color", &[("COLOR_UNSET", 0), ("RED", 1), ("BLUE", 2)]),
            ],
        );

        let mut builder = RegistryBuilder::new();
        builder.add_files([schema]).unwrap();
        builder
            .register_payload_kind(Protocol::Eos, "MIDDLE", "test.v1.Envelope")
            .unwrap();
        builder
            .register_payload_kind(Protocol::Eos, "LEAF", "test.v1.Leaf")
            .unwrap();
        builder.set_frame_type("test.v1.Envelope").unwrap();
        builder.build()
    }

    fn envelope_type(registry: &SchemaRegistry) -> MessageDescriptor {
        registry.message("test.v1.Envelope").unwrap()
    }

    fn leaf(registry: &SchemaRegistry, name: &str, count: u32, color: i32) -> Vec<u8> {
        let mut leaf = DynamicMessage::new(registry.message("test.v1.Leaf").unwrap());
        leaf.set_field_by_name("name", ProtoValue::String(name.to_string()));
        leaf.set_field_by_name("count", ProtoValue::U32(count));
        leaf.set_field_by_name("color", ProtoValue::EnumNumber(color));
        leaf.encode_to_vec()
    }

    fn envelope(registry: &SchemaRegistry, number: u32, kind: i32, payload: Vec<u8>) -> Vec<u8> {
        let mut envelope = DynamicMessage::new(envelope_type(registry));
        envelope.set_field_by_name("number", ProtoValue::U32(number));
        envelope.set_field_by_name("payload_kind", ProtoValue::EnumNumber(kind));
        envelope.set_field_by_name("payload_buffer", ProtoValue::Bytes(payload.into()));
        envelope.encode_to_vec()
    }

    // envelope(MIDDLE) -> envelope(LEAF) -> leaf
    fn three_layers(registry: &SchemaRegistry) -> Vec<u8> {
        let inner = envelope(registry, 2, KIND_LEAF, leaf(registry, "bottom", 9, 2));
        envelope(registry, 1, KIND_MIDDLE, inner)
    }

    fn decode_at(registry: &SchemaRegistry, bytes: &[u8], depth: u32) -> Result<Value> {
        EnvelopeDecoder::new(registry).decode(
            Protocol::Eos,
            &envelope_type(registry),
            bytes,
            RecursionBudget::new(depth),
        )
    }

    #[test]
    fn leaf_record_renders_all_fields() {
        let registry = layered_registry();
        let bytes = leaf(&registry, "alice", 3, 1);
        let descriptor = registry.message("test.v1.Leaf").unwrap();

        for depth in [0, 1, 5] {
            let document = EnvelopeDecoder::new(&registry)
                .decode(Protocol::Eos, &descriptor, &bytes, RecursionBudget::new(depth))
                .unwrap();
            assert_eq!(document, json!({"name": "alice", "count": 3, "color": "RED"}));
        }
    }

    #[test]
    fn leaf_defaults_are_rendered() {
        let registry = layered_registry();
        let descriptor = registry.message("test.v1.Leaf").unwrap();
        let document = EnvelopeDecoder::new(&registry)
            .decode(Protocol::Eos, &descriptor, &[], RecursionBudget::new(1))
            .unwrap();
        assert_eq!(document, json!({"name": "", "count": 0, "color": "COLOR_UNSET"}));
    }

    #[test]
    fn budget_zero_leaves_payload_opaque() {
        let registry = layered_registry();
        let bytes = envelope(&registry, 7, KIND_LEAF, leaf(&registry, "a", 1, 1));

        let document = decode_at(&registry, &bytes, 0).unwrap();
        assert_eq!(document["number"], 7);
        assert_eq!(document["payload_kind"], "LEAF");
        assert!(document["payload_buffer"].is_string());
    }

    #[test]
    fn budget_one_expands_payload_in_place() {
        let registry = layered_registry();
        let bytes = envelope(&registry, 7, KIND_LEAF, leaf(&registry, "a", 1, 2));

        let shallow = decode_at(&registry, &bytes, 0).unwrap();
        let expanded = decode_at(&registry, &bytes, 1).unwrap();
        assert_eq!(
            expanded["payload_buffer"],
            json!({"name": "a", "count": 1, "color": "BLUE"})
        );
        assert_eq!(expanded["number"], 7);
        assert_eq!(expanded["payload_kind"], "LEAF");

        let keys = |doc: &Value| doc.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&shallow), keys(&expanded));
    }

    #[test]
    fn deeper_budget_reveals_more_layers() {
        let registry = layered_registry();
        let bytes = three_layers(&registry);

        let zero = decode_at(&registry, &bytes, 0).unwrap();
        assert!(zero["payload_buffer"].is_string());

        let one = decode_at(&registry, &bytes, 1).unwrap();
        assert_eq!(one["payload_buffer"]["number"], 2);
        assert_eq!(one["payload_buffer"]["payload_kind"], "LEAF");
        assert!(one["payload_buffer"]["payload_buffer"].is_string());

        let two = decode_at(&registry, &bytes, 2).unwrap();
        assert_eq!(
            two["payload_buffer"]["payload_buffer"],
            json!({"name": "bottom", "count": 9, "color": "BLUE"})
        );
        assert_eq!(two["number"], one["number"]);
    }

    #[test]
    fn budget_beyond_data_depth_is_idempotent() {
        let registry = layered_registry();
        let bytes = three_layers(&registry);

        let two = decode_at(&registry, &bytes, 2).unwrap();
        for depth in [3, 4, 10] {
            assert_eq!(decode_at(&registry, &bytes, depth).unwrap(), two);
        }
    }

    #[test]
    fn unknown_kind_is_lazy_at_budget_zero() {
        let registry = layered_registry();
        let bytes = envelope(&registry, 1, KIND_MYSTERY, vec![0xff, 0xff]);

        let document = decode_at(&registry, &bytes, 0).unwrap();
        assert_eq!(document["payload_kind"], "MYSTERY");
    }

    #[test]
    fn unknown_kind_fails_fast_when_expanding() {
        let registry = layered_registry();
        let bytes = envelope(&registry, 1, KIND_MYSTERY, vec![]);

        let err = decode_at(&registry, &bytes, 1).unwrap_err();
        match err {
            DecodeError::UnsupportedKind {
                protocol,
                kind,
                message_type,
                field,
            } => {
                assert_eq!(protocol, Protocol::Eos);
                assert_eq!(kind, "MYSTERY");
                assert_eq!(message_type, "test.v1.Envelope");
                assert_eq!(field, "payload_kind");
            }
            other => panic!("expected unsupported kind, got {other:?}"),
        }
    }

    #[test]
    fn undeclared_enum_number_is_unsupported() {
        let registry = layered_registry();
        let bytes = envelope(&registry, 1, 42, vec![]);

        assert!(decode_at(&registry, &bytes, 0).is_ok());
        let err = decode_at(&registry, &bytes, 1).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedKind { ref kind, .. } if kind == "42"));
    }

    #[test]
    fn nested_failure_aborts_whole_record() {
        let registry = layered_registry();
        let inner = envelope(&registry, 2, KIND_MYSTERY, vec![]);
        let bytes = envelope(&registry, 1, KIND_MIDDLE, inner);

        assert!(decode_at(&registry, &bytes, 1).is_ok());
        assert!(matches!(
            decode_at(&registry, &bytes, 2),
            Err(DecodeError::UnsupportedKind { .. })
        ));
    }

    #[test]
    fn kinds_resolve_within_protocol_only() {
        let registry = layered_registry();
        let bytes = envelope(&registry, 1, KIND_LEAF, leaf(&registry, "a", 1, 1));

        let err = EnvelopeDecoder::new(&registry)
            .decode(
                Protocol::Eth,
                &envelope_type(&registry),
                &bytes,
                RecursionBudget::new(1),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnsupportedKind {
                protocol: Protocol::Eth,
                ..
            }
        ));
    }

    #[test]
    fn malformed_bytes_fail_with_message_type() {
        let registry = layered_registry();
        let descriptor = registry.message("test.v1.Leaf").unwrap();
        let err = EnvelopeDecoder::new(&registry)
            .decode(
                Protocol::Eos,
                &descriptor,
                &[0x0a, 0x05, b'a'],
                RecursionBudget::new(0),
            )
            .unwrap_err();
        match err {
            DecodeError::Deserialize {
                message_type, len, ..
            } => {
                assert_eq!(message_type, "test.v1.Leaf");
                assert_eq!(len, 3);
            }
            other => panic!("expected deserialize error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_payload_only_fails_when_expanded() {
        let registry = layered_registry();
        let bytes = envelope(&registry, 1, KIND_LEAF, vec![0x0a, 0x05, b'a']);

        assert!(decode_at(&registry, &bytes, 0).is_ok());
        assert!(matches!(
            decode_at(&registry, &bytes, 1),
            Err(DecodeError::Deserialize { ref message_type, .. }) if message_type == "test.v1.Leaf"
        ));
    }

    #[test]
    fn custom_field_names_identify_envelopes() {
        let registry = layered_registry();
        let bytes = envelope(&registry, 7, KIND_LEAF, leaf(&registry, "a", 1, 1));
        let config = DecoderConfig {
            kind_field: "kind".to_string(),
            ..DecoderConfig::default()
        };

        let document = EnvelopeDecoder::with_config(&registry, config)
            .decode(
                Protocol::Eos,
                &envelope_type(&registry),
                &bytes,
                RecursionBudget::new(3),
            )
            .unwrap();
        assert!(document["payload_buffer"].is_string());
    }

    #[test]
    fn decode_frame_uses_configured_frame_type() {
        let registry = layered_registry();
        let bytes = envelope(&registry, 7, KIND_LEAF, leaf(&registry, "a", 1, 1));
        let document = EnvelopeDecoder::new(&registry)
            .decode_frame(Protocol::Eos, &bytes, RecursionBudget::new(1))
            .unwrap();
        assert_eq!(document["payload_buffer"]["name"], "a");

        let bare = RegistryBuilder::new().build();
        let err = EnvelopeDecoder::new(&bare)
            .decode_frame(Protocol::Eos, &bytes, RecursionBudget::new(1))
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingFrameType));
    }

    fn bstream_block(registry: &SchemaRegistry, kind: i32, payload: Vec<u8>) -> Vec<u8> {
        let mut block = DynamicMessage::new(registry.frame_type().unwrap().clone());
        block.set_field_by_name("number", ProtoValue::U64(42));
        block.set_field_by_name("id", ProtoValue::String("0000002a".to_string()));
        block.set_field_by_name("payload_kind", ProtoValue::EnumNumber(kind));
        block.set_field_by_name("payload_buffer", ProtoValue::Bytes(payload.into()));
        block.encode_to_vec()
    }

    #[test]
    fn builtin_eos_block_expands() {
        let registry = SchemaRegistry::builtin().unwrap();
        let mut header =
            DynamicMessage::new(registry.message("dfuse.codecs.deos.BlockHeader").unwrap());
        header.set_field_by_name("producer", ProtoValue::String("eosio".to_string()));
        let mut block = DynamicMessage::new(registry.message("dfuse.codecs.deos.Block").unwrap());
        block.set_field_by_name("number", ProtoValue::U32(42));
        block.set_field_by_name("header", ProtoValue::Message(header));

        let bytes = bstream_block(&registry, 1, block.encode_to_vec());
        let document = EnvelopeDecoder::new(&registry)
            .decode_frame(Protocol::Eos, &bytes, RecursionBudget::new(1))
            .unwrap();

        assert_eq!(document["number"], "42");
        assert_eq!(document["payload_kind"], "EOS");
        assert_eq!(document["payload_buffer"]["number"], 42);
        assert_eq!(document["payload_buffer"]["header"]["producer"], "eosio");
    }

    #[test]
    fn builtin_eth_block_renders_big_integers() {
        let registry = SchemaRegistry::builtin().unwrap();
        let mut difficulty =
            DynamicMessage::new(registry.message("dfuse.codecs.deth.BigInt").unwrap());
        difficulty.set_field_by_name("bytes", ProtoValue::Bytes(vec![0x01_u8, 0x00].into()));
        let mut header =
            DynamicMessage::new(registry.message("dfuse.codecs.deth.BlockHeader").unwrap());
        header.set_field_by_name("difficulty", ProtoValue::Message(difficulty));
        let mut block = DynamicMessage::new(registry.message("dfuse.codecs.deth.Block").unwrap());
        block.set_field_by_name("header", ProtoValue::Message(header));

        let bytes = bstream_block(&registry, 2, block.encode_to_vec());
        let document = EnvelopeDecoder::new(&registry)
            .decode_frame(Protocol::Eth, &bytes, RecursionBudget::new(1))
            .unwrap();
        assert_eq!(document["payload_kind"], "ETH");
        assert_eq!(document["payload_buffer"]["header"]["difficulty"], "256");
    }

    #[test]
    fn builtin_mismatched_payload_protocol_is_unsupported() {
        let registry = SchemaRegistry::builtin().unwrap();
        let bytes = bstream_block(&registry, 2, Vec::new());
        let err = EnvelopeDecoder::new(&registry)
            .decode_frame(Protocol::Eos, &bytes, RecursionBudget::new(1))
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedKind { ref kind, .. } if kind == "ETH"));
    }

    #[test]
    fn builtin_unknown_protocol_kind_fails_only_when_expanding() {
        let registry = SchemaRegistry::builtin().unwrap();
        let bytes = bstream_block(&registry, 0, Vec::new());
        let decoder = EnvelopeDecoder::new(&registry);

        let shallow = decoder
            .decode_frame(Protocol::Eos, &bytes, RecursionBudget::new(0))
            .unwrap();
        assert_eq!(shallow["payload_kind"], "UNKNOWN");
        assert!(decoder
            .decode_frame(Protocol::Eos, &bytes, RecursionBudget::new(1))
            .is_err());
    }
}

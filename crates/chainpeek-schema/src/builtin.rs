//! Built-in chain schemas and their lookup tables.
//!
//! These cover the bstream envelope plus the EOS (`deos`) and Ethereum
//! (`deth`) block codecs, restricted to the fields the inspector renders.

use prost_types::field_descriptor_proto::Type;
use prost_types::FileDescriptorProto;

use crate::descriptor::{
    enum_field, enumeration, file, message, message_field, repeated, scalar,
};
use crate::protocol::Protocol;

pub const BSTREAM_PACKAGE: &str = "dfuse.bstream.v1";
pub const DEOS_PACKAGE: &str = "dfuse.codecs.deos";
pub const DETH_PACKAGE: &str = "dfuse.codecs.deth";

/// Envelope carried by every dbin frame.
pub const BSTREAM_BLOCK: &str = "dfuse.bstream.v1.Block";

/// Big-endian unsigned integers rendered as decimal strings.
pub const DETH_BIG_INT: &str = "dfuse.codecs.deth.BigInt";

/// (protocol, payload-kind enumerant, message type).
pub const PAYLOAD_KIND_MAPPINGS: &[(Protocol, &str, &str)] = &[
    (Protocol::Eos, "EOS", "dfuse.codecs.deos.Block"),
    (Protocol::Eth, "ETH", "dfuse.codecs.deth.Block"),
];

/// (protocol, column name, message type).
pub const COLUMN_MAPPINGS: &[(Protocol, &str, &str)] = &[
    (Protocol::Eos, "block_proto", "dfuse.codecs.deos.Block"),
    (Protocol::Eos, "trxs_trxRefsProto", "dfuse.codecs.deos.TransactionRefs"),
    (Protocol::Eos, "trxs_traceRefsProto", "dfuse.codecs.deos.TransactionRefs"),
    (Protocol::Eos, "trx_proto", "dfuse.codecs.deos.SignedTransaction"),
    (Protocol::Eos, "trace_proto", "dfuse.codecs.deos.TransactionTrace"),
    (Protocol::Eos, "dtrx_created-by", "dfuse.codecs.deos.ExtDTrxOp"),
    (Protocol::Eos, "dtrx_canceled-by", "dfuse.codecs.deos.ExtDTrxOp"),
    (Protocol::Eos, "meta_blockheader", "dfuse.codecs.deos.BlockHeader"),
    (Protocol::Eth, "block_headerProto", "dfuse.codecs.deth.BlockHeader"),
    (Protocol::Eth, "block_trxRefsProto", "dfuse.codecs.deth.TransactionRefs"),
    (Protocol::Eth, "block_uncles", "dfuse.codecs.deth.UnclesHeaders"),
    (Protocol::Eth, "trx_proto", "dfuse.codecs.deth.TransactionTrace"),
    (Protocol::Eth, "trx_blkRefProto", "dfuse.codecs.deth.BlockRef"),
];

/// Every built-in file, in dependency order.
pub fn file_descriptors() -> Vec<FileDescriptorProto> {
    vec![bstream(), deos(), deth()]
}

fn bstream() -> FileDescriptorProto {
    let protocol = "dfuse.bstream.v1.Protocol";
    file(
        "dfuse/bstream/v1/bstream.proto",
        BSTREAM_PACKAGE,
        vec![message(
            "Block",
            vec![
                scalar("number", 1, Type::Uint64),
                scalar("id", 2, Type::String),
                scalar("previous_id", 3, Type::String),
                scalar("timestamp", 4, Type::String),
                scalar("lib_num", 5, Type::Uint64),
                enum_field("payload_kind", 6, protocol),
                scalar("payload_version", 7, Type::Int32),
                scalar("payload_buffer", 8, Type::Bytes),
            ],
        )],
        vec![enumeration(
            "Protocol",
            &[("UNKNOWN", 0), ("EOS", 1), ("ETH", 2)],
        )],
    )
}

fn deos() -> FileDescriptorProto {
    let pkg = |name: &str| format!("{DEOS_PACKAGE}.{name}");
    file(
        "dfuse/codecs/deos/deos.proto",
        DEOS_PACKAGE,
        vec![
            message(
                "Block",
                vec![
                    scalar("id", 1, Type::String),
                    scalar("number", 2, Type::Uint32),
                    scalar("version", 3, Type::Uint32),
                    message_field("header", 4, &pkg("BlockHeader")),
                    scalar("producer_signature", 5, Type::String),
                    scalar("dpos_proposed_irreversible_blocknum", 6, Type::Uint32),
                    scalar("dpos_irreversible_blocknum", 7, Type::Uint32),
                    scalar("transaction_count", 8, Type::Uint32),
                    repeated(message_field(
                        "transaction_traces",
                        9,
                        &pkg("TransactionTrace"),
                    )),
                ],
            ),
            message(
                "BlockHeader",
                vec![
                    scalar("timestamp", 1, Type::String),
                    scalar("producer", 2, Type::String),
                    scalar("confirmed", 3, Type::Uint32),
                    scalar("previous", 4, Type::String),
                    scalar("transaction_mroot", 5, Type::Bytes),
                    scalar("action_mroot", 6, Type::Bytes),
                    scalar("schedule_version", 7, Type::Uint32),
                ],
            ),
            message(
                "TransactionRefs",
                vec![repeated(scalar("hashes", 1, Type::Bytes))],
            ),
            message(
                "PermissionLevel",
                vec![
                    scalar("actor", 1, Type::String),
                    scalar("permission", 2, Type::String),
                ],
            ),
            message(
                "Action",
                vec![
                    scalar("account", 1, Type::String),
                    scalar("name", 2, Type::String),
                    repeated(message_field(
                        "authorization",
                        3,
                        &pkg("PermissionLevel"),
                    )),
                    scalar("json_data", 4, Type::String),
                    scalar("raw_data", 5, Type::Bytes),
                ],
            ),
            message(
                "SignedTransaction",
                vec![
                    scalar("expiration", 1, Type::String),
                    scalar("ref_block_num", 2, Type::Uint32),
                    scalar("ref_block_prefix", 3, Type::Uint32),
                    repeated(message_field("actions", 4, &pkg("Action"))),
                    repeated(scalar("signatures", 5, Type::String)),
                    repeated(scalar("context_free_data", 6, Type::Bytes)),
                ],
            ),
            message(
                "ActionTrace",
                vec![
                    scalar("receiver", 1, Type::String),
                    message_field("action", 2, &pkg("Action")),
                    scalar("elapsed", 3, Type::Int64),
                    scalar("console", 4, Type::String),
                    scalar("transaction_id", 5, Type::String),
                    scalar("block_num", 6, Type::Uint64),
                ],
            ),
            message(
                "TransactionTrace",
                vec![
                    scalar("id", 1, Type::String),
                    scalar("block_num", 2, Type::Uint64),
                    scalar("block_time", 3, Type::String),
                    enum_field("status", 4, &pkg("TransactionStatus")),
                    scalar("elapsed", 5, Type::Int64),
                    scalar("net_usage", 6, Type::Uint64),
                    scalar("scheduled", 7, Type::Bool),
                    repeated(message_field("action_traces", 8, &pkg("ActionTrace"))),
                ],
            ),
            message(
                "ExtDTrxOp",
                vec![
                    scalar("source_transaction_id", 1, Type::String),
                    scalar("block_num", 2, Type::Uint64),
                    scalar("block_id", 3, Type::String),
                    scalar("block_time", 4, Type::String),
                    enum_field("operation", 5, &pkg("DTrxOperation")),
                    scalar("sender", 6, Type::String),
                    scalar("sender_id", 7, Type::String),
                    scalar("payer", 8, Type::String),
                    scalar("published_at", 9, Type::String),
                    scalar("delay_until", 10, Type::String),
                    scalar("expiration_at", 11, Type::String),
                    scalar("trx_id", 12, Type::String),
                    message_field("transaction", 13, &pkg("SignedTransaction")),
                ],
            ),
        ],
        vec![
            enumeration(
                "TransactionStatus",
                &[
                    ("TRANSACTIONSTATUS_NONE", 0),
                    ("TRANSACTIONSTATUS_EXECUTED", 1),
                    ("TRANSACTIONSTATUS_SOFTFAIL", 2),
                    ("TRANSACTIONSTATUS_HARDFAIL", 3),
                    ("TRANSACTIONSTATUS_DELAYED", 4),
                    ("TRANSACTIONSTATUS_EXPIRED", 5),
                    ("TRANSACTIONSTATUS_UNKNOWN", 6),
                    ("TRANSACTIONSTATUS_CANCELED", 7),
                ],
            ),
            enumeration(
                "DTrxOperation",
                &[
                    ("OPERATION_UNKNOWN", 0),
                    ("OPERATION_CREATE", 1),
                    ("OPERATION_PUSH_CREATE", 2),
                    ("OPERATION_FAILED", 3),
                    ("OPERATION_CANCEL", 4),
                    ("OPERATION_MODIFY_CANCEL", 5),
                    ("OPERATION_MODIFY_CREATE", 6),
                ],
            ),
        ],
    )
}

fn deth() -> FileDescriptorProto {
    let pkg = |name: &str| format!("{DETH_PACKAGE}.{name}");
    file(
        "dfuse/codecs/deth/deth.proto",
        DETH_PACKAGE,
        vec![
            message("BigInt", vec![scalar("bytes", 1, Type::Bytes)]),
            message(
                "Block",
                vec![
                    scalar("hash", 1, Type::Bytes),
                    scalar("number", 2, Type::Uint64),
                    scalar("size", 3, Type::Uint64),
                    message_field("header", 4, &pkg("BlockHeader")),
                    repeated(message_field("uncles", 5, &pkg("BlockHeader"))),
                    repeated(message_field(
                        "transaction_traces",
                        6,
                        &pkg("TransactionTrace"),
                    )),
                ],
            ),
            message(
                "BlockHeader",
                vec![
                    scalar("parent_hash", 1, Type::Bytes),
                    scalar("uncle_hash", 2, Type::Bytes),
                    scalar("coinbase", 3, Type::Bytes),
                    scalar("state_root", 4, Type::Bytes),
                    scalar("transactions_root", 5, Type::Bytes),
                    scalar("receipt_root", 6, Type::Bytes),
                    scalar("logs_bloom", 7, Type::Bytes),
                    message_field("difficulty", 8, &pkg("BigInt")),
                    scalar("number", 9, Type::Uint64),
                    scalar("gas_limit", 10, Type::Uint64),
                    scalar("gas_used", 11, Type::Uint64),
                    scalar("timestamp", 12, Type::String),
                    scalar("extra_data", 13, Type::Bytes),
                    scalar("mix_hash", 14, Type::Bytes),
                    scalar("nonce", 15, Type::Uint64),
                    scalar("hash", 16, Type::Bytes),
                ],
            ),
            message(
                "TransactionRefs",
                vec![repeated(scalar("hashes", 1, Type::Bytes))],
            ),
            message(
                "UnclesHeaders",
                vec![repeated(message_field("uncles", 1, &pkg("BlockHeader")))],
            ),
            message(
                "TransactionTrace",
                vec![
                    scalar("to", 1, Type::Bytes),
                    scalar("nonce", 2, Type::Uint64),
                    message_field("gas_price", 3, &pkg("BigInt")),
                    scalar("gas_limit", 4, Type::Uint64),
                    message_field("value", 5, &pkg("BigInt")),
                    scalar("input", 6, Type::Bytes),
                    scalar("hash", 7, Type::Bytes),
                    scalar("from", 8, Type::Bytes),
                    scalar("gas_used", 9, Type::Uint64),
                    scalar("index", 10, Type::Uint32),
                    enum_field("status", 11, &pkg("TransactionTraceStatus")),
                ],
            ),
            message(
                "BlockRef",
                vec![
                    scalar("hash", 1, Type::Bytes),
                    scalar("number", 2, Type::Uint64),
                ],
            ),
        ],
        vec![enumeration(
            "TransactionTraceStatus",
            &[
                ("UNKNOWN", 0),
                ("SUCCEEDED", 1),
                ("FAILED", 2),
                ("REVERTED", 3),
            ],
        )],
    )
}

#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use chainpeek::frame::{ContainerWriter, ContentKind};
use chainpeek::schema::SchemaRegistry;
use prost::Message;
use prost_reflect::{DynamicMessage, Value as ProtoValue};
use serde_json::Value;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "chainpeek-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn chainpeek(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chainpeek"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .env_remove("CHAINPEEK_DESCRIPTOR_SET")
        .env_remove("CHAINPEEK_MAPPING")
        .output()
        .expect("chainpeek should run")
}

fn json_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout lines should be JSON"))
        .collect()
}

fn eos_block(registry: &SchemaRegistry, number: u32, producer: &str) -> Vec<u8> {
    let mut header =
        DynamicMessage::new(registry.message("dfuse.codecs.deos.BlockHeader").unwrap());
    header.set_field_by_name("producer", ProtoValue::String(producer.to_string()));
    let mut block = DynamicMessage::new(registry.message("dfuse.codecs.deos.Block").unwrap());
    block.set_field_by_name("number", ProtoValue::U32(number));
    block.set_field_by_name("header", ProtoValue::Message(header));
    block.encode_to_vec()
}

fn bstream_block(registry: &SchemaRegistry, number: u64, kind: i32, payload: Vec<u8>) -> Vec<u8> {
    let mut block = DynamicMessage::new(registry.message("dfuse.bstream.v1.Block").unwrap());
    block.set_field_by_name("number", ProtoValue::U64(number));
    block.set_field_by_name("id", ProtoValue::String(format!("{number:08x}")));
    block.set_field_by_name("payload_kind", ProtoValue::EnumNumber(kind));
    block.set_field_by_name("payload_buffer", ProtoValue::Bytes(payload.into()));
    block.encode_to_vec()
}

fn eos_container(registry: &SchemaRegistry, count: u32) -> Vec<u8> {
    let mut writer =
        ContainerWriter::create(Vec::new(), ContentKind::Eos).expect("header should encode");
    for number in 1..=count {
        let payload = eos_block(registry, number, "eosio");
        let frame = bstream_block(registry, u64::from(number), 1, payload);
        writer.write_frame(&frame).expect("frame should encode");
    }
    writer.into_inner()
}

#[test]
fn dbin_expands_payloads_at_depth_one() {
    let registry = SchemaRegistry::builtin().unwrap();
    let dir = unique_temp_dir("dbin-depth1");
    let path = dir.join("blocks.dbin");
    std::fs::write(&path, eos_container(&registry, 2)).unwrap();

    let output = chainpeek(&["dbin", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let docs = json_lines(&output);
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["number"], "1");
    assert_eq!(docs[1]["number"], "2");
    assert_eq!(docs[0]["payload_kind"], "EOS");
    assert_eq!(docs[0]["payload_buffer"]["number"], 1);
    assert_eq!(docs[1]["payload_buffer"]["header"]["producer"], "eosio");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dbin_depth_zero_keeps_payload_opaque() {
    let registry = SchemaRegistry::builtin().unwrap();
    let dir = unique_temp_dir("dbin-depth0");
    let path = dir.join("blocks.dbin");
    std::fs::write(&path, eos_container(&registry, 1)).unwrap();

    let output = chainpeek(&["dbin", path.to_str().unwrap(), "--depth", "0"]);
    assert!(output.status.success());
    let docs = json_lines(&output);
    assert_eq!(docs.len(), 1);
    assert!(docs[0]["payload_buffer"].is_string());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dbin_reads_stdin() {
    let registry = SchemaRegistry::builtin().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_chainpeek"))
        .args(["--log-level", "error", "--format", "json", "dbin", "-"])
        .env_remove("CHAINPEEK_DESCRIPTOR_SET")
        .env_remove("CHAINPEEK_MAPPING")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("dbin should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&eos_container(&registry, 3))
        .expect("container should be written");

    let output = child.wait_with_output().expect("dbin should finish");
    assert!(output.status.success());
    assert_eq!(json_lines(&output).len(), 3);
}

#[test]
fn dbin_truncated_frame_prints_complete_frames_then_fails() {
    let registry = SchemaRegistry::builtin().unwrap();
    let dir = unique_temp_dir("dbin-truncated");
    let path = dir.join("blocks.dbin");
    let mut bytes = eos_container(&registry, 2);
    bytes.truncate(bytes.len() - 3);
    std::fs::write(&path, bytes).unwrap();

    let output = chainpeek(&["dbin", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert_eq!(json_lines(&output).len(), 1);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("truncated frame"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dbin_rejects_bad_magic() {
    let dir = unique_temp_dir("dbin-magic");
    let path = dir.join("not.dbin");
    std::fs::write(&path, b"nope\x01EOS01").unwrap();

    let output = chainpeek(&["dbin", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert!(output.stdout.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dbin_payload_from_other_protocol_is_unsupported() {
    let registry = SchemaRegistry::builtin().unwrap();
    let dir = unique_temp_dir("dbin-kind");
    let path = dir.join("blocks.dbin");
    let mut writer = ContainerWriter::create(Vec::new(), ContentKind::Eos).unwrap();
    writer
        .write_frame(&bstream_block(&registry, 1, 2, Vec::new()))
        .unwrap();
    std::fs::write(&path, writer.into_inner()).unwrap();

    let output = chainpeek(&["dbin", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported"));

    let shallow = chainpeek(&["dbin", path.to_str().unwrap(), "--depth", "0"]);
    assert!(shallow.status.success());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dbin_negative_depth_is_usage_error() {
    let output = chainpeek(&["dbin", "/nonexistent.dbin", "--depth=-1"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn dbin_missing_file_fails() {
    let output = chainpeek(&["dbin", "/nonexistent/chainpeek/blocks.dbin"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn pb_decodes_standalone_record() {
    let registry = SchemaRegistry::builtin().unwrap();
    let dir = unique_temp_dir("pb");
    let path = dir.join("block.pb");
    std::fs::write(&path, eos_block(&registry, 77, "bp.one")).unwrap();

    let output = chainpeek(&[
        "pb",
        path.to_str().unwrap(),
        "--type",
        "dfuse.codecs.deos.Block",
        "--protocol",
        "EOS",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let docs = json_lines(&output);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["number"], 77);
    assert_eq!(docs[0]["header"]["producer"], "bp.one");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn pb_expands_envelopes() {
    let registry = SchemaRegistry::builtin().unwrap();
    let dir = unique_temp_dir("pb-envelope");
    let path = dir.join("block.pb");
    let payload = eos_block(&registry, 5, "eosio");
    std::fs::write(&path, bstream_block(&registry, 5, 1, payload)).unwrap();

    let output = chainpeek(&[
        "pb",
        path.to_str().unwrap(),
        "--type",
        "bstream.v1.Block",
        "--protocol",
        "eos",
    ]);
    assert!(output.status.success());
    assert_eq!(json_lines(&output)[0]["payload_buffer"]["number"], 5);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn pb_ambiguous_type_is_usage_error() {
    let dir = unique_temp_dir("pb-ambiguous");
    let path = dir.join("empty.pb");
    std::fs::write(&path, b"").unwrap();

    let output = chainpeek(&[
        "pb",
        path.to_str().unwrap(),
        "--type",
        "Block",
        "--protocol",
        "EOS",
    ]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ambiguous"));

    let _ = std::fs::remove_dir_all(&dir);
}

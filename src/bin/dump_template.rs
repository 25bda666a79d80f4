//! Build a sample Ether / IP / TCP template and print both compiled descriptors as JSON.
//!
//! Usage:
//!   dump_template [--pretty]
//!
//! Options:
//!   --pretty, -p   Indent the JSON output
//!   --help, -h     Show this help
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `warn`).

use packet_template::{
    lint, Catalog, Document, FeInstructionParameterMeta, FeParameterMeta, FieldMetadata, FieldType,
    FieldValue, InstructionKind, ProtocolMetadata, Severity, SPLIT_BY_PARAMETER,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn sample_catalog() -> anyhow::Result<Catalog> {
    let ether = ProtocolMetadata::new(
        "Ether",
        vec![
            FieldMetadata::new("dst", FieldType::MacAddress).with_default("ff:ff:ff:ff:ff:ff"),
            FieldMetadata::new("src", FieldType::MacAddress).with_default("00:00:00:00:00:00"),
            FieldMetadata::new("type", FieldType::Enum)
                .with_default(0x0800)
                .with_dictionary(vec![
                    ("IPv4".to_string(), FieldValue::Int(0x0800)),
                    ("ARP".to_string(), FieldValue::Int(0x0806)),
                ]),
        ],
    );
    let ip = ProtocolMetadata::new(
        "IP",
        vec![
            FieldMetadata::new("ttl", FieldType::Number).with_default(64),
            FieldMetadata::new("proto", FieldType::Number).with_default(6),
            FieldMetadata::new("src", FieldType::Ipv4Address).with_default("127.0.0.1"),
            FieldMetadata::new("dst", FieldType::Ipv4Address).with_default("127.0.0.1"),
        ],
    );
    let tcp = ProtocolMetadata::new(
        "TCP",
        vec![
            FieldMetadata::new("sport", FieldType::Number).with_default(20),
            FieldMetadata::new("dport", FieldType::Number).with_default(80),
            FieldMetadata::new("flags", FieldType::Bitmask).with_default(2),
        ],
    );
    let raw = ProtocolMetadata::new("Raw", vec![FieldMetadata::new("load", FieldType::String)]);

    let catalog = Catalog::resolve(
        vec![ether, ip, tcp, raw],
        vec![
            FeParameterMeta::new("cache_size", ""),
            FeParameterMeta::new(SPLIT_BY_PARAMETER, ""),
        ],
        vec![
            FeInstructionParameterMeta::new("min_value", "0"),
            FeInstructionParameterMeta::new("max_value", "255"),
            FeInstructionParameterMeta::new("step", "1"),
        ],
    )?;
    Ok(catalog)
}

fn build_document(catalog: &Catalog) -> anyhow::Result<Document> {
    let mut doc = Document::new();
    doc.init_parameters(catalog.fe_parameters());
    for id in ["Ether", "IP", "TCP", "Raw"] {
        doc.push_from_catalog(catalog, id)?;
    }
    doc.set_field_value(&["Ether", "IP"], "src", "16.0.0.1")?;
    doc.set_field_value(&["Ether", "IP"], "ttl", "32")?;
    doc.set_field_value(&["Ether", "IP", "TCP", "Raw"], "load", FieldValue::Bytes(b"hello".to_vec()))?;

    doc.create_instruction(&["Ether", "IP"], "src", catalog.instruction_parameters())?;
    doc.set_instruction_parameter(&["Ether", "IP"], "src", "max_value", "16.0.0.254")?;
    doc.set_instruction_parameter(&["Ether", "IP"], "src", "min_value", "16.0.0.1")?;
    doc.create_instruction(&["Ether", "IP", "TCP"], "sport", catalog.instruction_parameters())?;
    doc.set_instruction_kind(&["Ether", "IP", "TCP"], "sport", InstructionKind::Random)?;
    doc.set_parameter_value("cache_size", "255")?;
    Ok(doc)
}

fn main() -> anyhow::Result<()> {
    let mut pretty = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--pretty" | "-p" => pretty = true,
            "--help" | "-h" => {
                eprintln!("Usage: dump_template [--pretty]");
                return Ok(());
            }
            other => anyhow::bail!("unknown argument: {}", other),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let catalog = sample_catalog()?;
    let doc = build_document(&catalog)?;

    for m in lint(&doc, Some(&catalog)) {
        let severity = match m.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        eprintln!("{}: {} [{}]", severity, m.message, m.rule.id());
    }

    let out = json!({
        "reconstruction": doc.reconstruction_json()?,
        "program": doc.compile_field_engine_program().to_json()?,
    });
    if pretty {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", out);
    }
    Ok(())
}

//! Reads a model description, reports what it contains and writes it back
//! at the latest version of every kind.

use std::fs;

use model_description::codec::{encode_model, Document};
use model_description::{decode_model, validate_all, EntityKind, Registry};

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "model.json".to_string());
    let out = args.next();

    println!("Reading: {}", path);
    let text = fs::read_to_string(&path).expect("Failed to read file");
    println!("File size: {} bytes", text.len());

    let doc = Document::from_json_str(&text).expect("Failed to parse");
    let model = decode_model(&doc).expect("Failed to decode");

    println!("\n=== Model ===");
    println!("Owner: {}", model.owner);
    if let Some(uuid) = model.uuid() {
        println!("UUID: {}", uuid);
    }
    if let Some(name) = model.name() {
        println!("Name: {}", name);
    }
    println!("Type: {}", model.model_type.as_str());
    println!("Cloud: {} / {}", model.cloud, model.cloud_region);

    println!("\n=== Entities ===");
    println!("  Machines: {} ({} with containers)", model.machines().len(), model.all_machines().len());
    println!("  Applications: {}", model.applications().len());
    println!("  Units: {}", model.all_units().count());
    println!("  Relations: {}", model.relations().len());
    println!("  Spaces: {}", model.spaces().len());
    println!("  Subnets: {}", model.subnets().len());
    println!("  Storage instances: {}", model.storages().len());
    println!("  Volumes: {}", model.volumes().len());
    println!("  Filesystems: {}", model.filesystems().len());
    println!("  Secrets: {}", model.secrets().len());

    println!("\n=== Latest Versions ===");
    let registry = Registry::global();
    for kind in EntityKind::ALL {
        println!("  {}: v{}", kind, registry.latest_version(kind));
    }

    let problems = validate_all(&model);
    println!("\n=== Validation ({}) ===", problems.len());
    for problem in problems.iter().take(20) {
        println!("  {}", problem);
    }
    if problems.len() > 20 {
        println!("  ... and {} more", problems.len() - 20);
    }

    if let Some(out) = out {
        let upgraded = encode_model(&model).to_json_string_pretty();
        fs::write(&out, upgraded).expect("Failed to write file");
        println!("\nWrote: {}", out);
    }
}

//! Dump a CMap program
//!
//! Parses a CMap file (or a predefined CMap by name from the resource
//! directory) and prints a JSON summary. With `--decode`, splits a hex
//! string into codes and shows the CID and Unicode text of each. With
//! `--font`, writes a predefined CJK font over the CMap instead and prints
//! the resulting objects in PDF syntax.
//!
//! Usage:
//!   cargo run --bin cmap_dump -- path/to/UniGB-UCS2-H
//!   cargo run --bin cmap_dump -- UniGB-UCS2-H --resource-dir cmaps --decode 00204E2D
//!   cargo run --bin cmap_dump -- UniGB-UCS2-H --resource-dir cmaps --font STSong-Light --text 中文
//!
//! Set `RUST_LOG=debug` for parser diagnostics.

use font_oxide::cmap::{CMapCache, CMapData, CMapEncoding, CMapToUnicode};
use font_oxide::config::FontConfig;
use font_oxide::writer::ObjectSerializer;
use font_oxide::{FontFactory, MemoryObjectStore, PdfFont};
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

struct DumpConfig {
    source: String,
    resource_dir: Option<PathBuf>,
    decode: Option<String>,
    font: Option<String>,
    text: String,
    pretty: bool,
}

impl DumpConfig {
    fn from_args() -> Option<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut source = None;
        let mut resource_dir = None;
        let mut decode = None;
        let mut font = None;
        let mut text = String::new();
        let mut pretty = true;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--resource-dir" => {
                    i += 1;
                    if i < args.len() {
                        resource_dir = Some(PathBuf::from(&args[i]));
                    }
                },
                "--decode" => {
                    i += 1;
                    if i < args.len() {
                        decode = Some(args[i].clone());
                    }
                },
                "--font" => {
                    i += 1;
                    if i < args.len() {
                        font = Some(args[i].clone());
                    }
                },
                "--text" => {
                    i += 1;
                    if i < args.len() {
                        text = args[i].clone();
                    }
                },
                "--compact" => {
                    pretty = false;
                },
                other => source = Some(other.to_string()),
            }
            i += 1;
        }

        Some(Self {
            source: source?,
            resource_dir,
            decode,
            font,
            text,
            pretty,
        })
    }
}

fn parse_hex(hex: &str) -> Option<Vec<u8>> {
    let hex: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

fn load(config: &DumpConfig, cache: &CMapCache) -> font_oxide::Result<(String, CMapData)> {
    let path = Path::new(&config.source);
    if path.is_file() {
        let program = std::fs::read(path)?;
        let data = cache.resolve_parents(font_oxide::cmap::parse_cmap(&program)?);
        let name = data.name.clone().unwrap_or_else(|| config.source.clone());
        return Ok((name, data));
    }
    let data = cache.cmap(&config.source)?;
    Ok((config.source.clone(), (*data).clone()))
}

fn summary(name: &str, data: &CMapData) -> serde_json::Value {
    let codespace: Vec<String> = data
        .codespace
        .iter()
        .map(|r| format!("<{}> <{}>", hex(r.low()), hex(r.high())))
        .collect();
    json!({
        "name": name,
        "registry": data.registry,
        "ordering": data.ordering,
        "supplement": data.supplement,
        "wmode": data.wmode,
        "usecmap": data.usecmap,
        "codespace": codespace,
        "cid_mappings": data.cids.len(),
        "unicode_mappings": data.unicode.len(),
    })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

fn decode(name: &str, data: &CMapData, bytes: &[u8]) -> serde_json::Value {
    let encoding = CMapEncoding::from_cmap_data(name, data);
    let to_unicode = CMapToUnicode::from_cmap_data(data.clone());
    let mut codes = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let (code, matched) = encoding.next_code(rest);
        rest = &rest[(code.len as usize).clamp(1, rest.len())..];
        codes.push(json!({
            "code": code.to_string(),
            "matched": matched,
            "cid": encoding.cid_of(code),
            "text": to_unicode.lookup_string(code.value),
        }));
    }
    serde_json::Value::Array(codes)
}

/// Write `font_name` over `cmap_name` with `text` and serialize the font's objects.
fn write_font(
    font_config: FontConfig,
    cache: Arc<CMapCache>,
    font_name: &str,
    cmap_name: &str,
    text: &str,
) -> font_oxide::Result<Vec<u8>> {
    let factory = FontFactory::with_cmap_cache(font_config, cache);
    let program = factory.load_cid_program(font_name)?;
    let mut font = factory.create_font(program.into(), cmap_name, None)?.ok_or_else(|| {
        font_oxide::Error::FontProgram(format!("{} cannot be used with {}", font_name, cmap_name))
    })?;
    font.convert_to_bytes(text);
    let mut store = MemoryObjectStore::new();
    let font_ref = font.flush(&mut store)?;
    Ok(ObjectSerializer::new().serialize_reachable(&store, font_ref))
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(config) = DumpConfig::from_args() else {
        eprintln!(
            "Usage: cmap_dump <file-or-name> [--resource-dir DIR] [--decode HEX] [--font NAME --text TEXT] [--compact]"
        );
        return ExitCode::from(2);
    };

    let mut font_config = FontConfig::new();
    if let Some(dir) = &config.resource_dir {
        font_config = font_config.with_cmap_resource_dir(dir);
    }
    let cache = Arc::new(CMapCache::from_config(&font_config));

    if let Some(font_name) = &config.font {
        return match write_font(font_config, Arc::clone(&cache), font_name, &config.source, &config.text) {
            Ok(pdf) => match std::io::stdout().write_all(&pdf) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                },
            },
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            },
        };
    }

    let (name, data) = match load(&config, &cache) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let mut output = summary(&name, &data);
    if let Some(hex) = &config.decode {
        match parse_hex(hex) {
            Some(bytes) => output["decoded"] = decode(&name, &data, &bytes),
            None => {
                eprintln!("Error: --decode expects an even number of hex digits");
                return ExitCode::from(2);
            },
        }
    }

    let rendered = if config.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    };
    match rendered {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

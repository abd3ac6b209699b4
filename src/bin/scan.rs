use std::env;
use std::process::ExitCode;

use polycode::{DecodeEngine, FormatMask, ReaderOptions, Symbology};

fn main() -> ExitCode {
    env_logger::init();

    let mut path: Option<String> = None;
    let mut all = false;
    let mut opts = ReaderOptions::new();

    let mut args = env::args().skip(1);
    while let Some(a) = args.next() {
        match a.as_str() {
            "--all" => all = true,
            "--no-harder" => opts = opts.with_try_harder(false),
            "--no-rotate" => opts = opts.with_try_rotate(false),
            "--invert" => opts = opts.with_try_invert(true),
            "--no-downscale" => opts = opts.with_try_downscale(false),
            "--formats" => {
                let Some(list) = args.next() else {
                    eprintln!("--formats требует список (например: qr,ean13)");
                    return ExitCode::from(2);
                };
                match parse_formats(&list) {
                    Some(mask) => opts = opts.with_formats(mask),
                    None => {
                        eprintln!("Неизвестный формат в списке: {list}");
                        return ExitCode::from(2);
                    }
                }
            }
            "--help" | "-h" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            other => {
                if path.is_none() {
                    path = Some(other.to_string());
                } else {
                    eprintln!("Лишний аргумент: {other}");
                    print_help();
                    return ExitCode::from(2);
                }
            }
        }
    }

    let Some(path) = path else {
        print_help();
        return ExitCode::from(2);
    };

    let engine = DecodeEngine::new();

    if all {
        match engine.decode_file_all(&path, &opts) {
            Ok(results) => {
                for r in results {
                    print_result(&r);
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        }
    } else {
        match engine.decode_file(&path, &opts) {
            Ok(r) => {
                print_result(&r);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        }
    }
}

fn print_result(r: &polycode::DecodeResult) {
    let bb = r.quad.bounding_box();
    println!(
        "{}: {}  (conf={:.2}, bbox={},{}..{},{})",
        r.format, r.text, r.confidence, bb.0, bb.1, bb.2, bb.3
    );
}

fn parse_formats(list: &str) -> Option<FormatMask> {
    let mut mask = FormatMask::empty();
    for name in list.split(',') {
        let f = match name.trim().to_ascii_lowercase().as_str() {
            "qr" | "qrcode" => Symbology::QrCode,
            "datamatrix" | "dm" => Symbology::DataMatrix,
            "code128" | "128" => Symbology::Code128,
            "ean13" => Symbology::Ean13,
            "ean8" => Symbology::Ean8,
            "upca" | "upc" => Symbology::UpcA,
            _ => return None,
        };
        mask = mask.with(f);
    }
    Some(mask)
}

fn print_help() {
    eprintln!(
        r#"Использование:
  cargo run --bin scan -- <image> [--all] [--formats <list>]
          [--no-harder] [--no-rotate] [--invert] [--no-downscale]

Поддерживаются PNG/JPEG/BMP и другие форматы крейта image.
Примеры:
  cargo run --bin scan -- ./ticket.png
  cargo run --bin scan -- ./shelf.jpg --all --formats ean13,code128
"#
    );
}

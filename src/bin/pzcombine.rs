/// pzcombine – combine checksums of adjacent byte ranges.
///
///   pzcombine crc32 CRC1 CRC2 LEN2        → CRC32 of A ++ B
///   pzcombine adler32 ADLER1 ADLER2 LEN2  → Adler-32 of A ++ B
///   pzcombine trailer a.gz b.gz           → trailer of the payloads of a then b
///   pzcombine inject -p frag -c CRC -n LEN page.gz -o out.gz
///   cat page.gz | pzcombine inject --html banner.html > out.gz
use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process::{self, ExitCode};

use log::{debug, LevelFilter};

use pzcombine::gzip::{self, InjectFragment};
use pzcombine::{adler32_combine, crc32_combine};

fn usage() {
    eprintln!("pzcombine - combine checksums without re-reading data");
    eprintln!();
    eprintln!("Usage: pzcombine [OPTIONS] COMMAND [ARGS]...");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  crc32 CRC1 CRC2 LEN2         CRC32 of A ++ B from crc32(A), crc32(B), len(B)");
    eprintln!("  adler32 ADLER1 ADLER2 LEN2   Adler-32 of A ++ B");
    eprintln!("  trailer A.gz B.gz            Combined gzip trailer of two members");
    eprintln!("  inject [MEMBER.gz]           Splice a gzip fragment in front of MEMBER");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --html FILE           Compress FILE into the fragment for inject");
    eprintln!("  -p, --fragment FILE   Prebuilt fragment (gzip header + flushed blocks)");
    eprintln!("  -c, --crc N           CRC32 of the fragment's uncompressed bytes");
    eprintln!("  -n, --len N           Uncompressed length of the fragment");
    eprintln!("  -o, --output FILE     Write inject output to FILE (default: stdout)");
    eprintln!("  -q, --quiet           Only log errors");
    eprintln!("  -v, --verbose         Verbose output");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Numbers may be decimal or 0x-prefixed hex.");
    eprintln!("If no MEMBER is given, or it is '-', inject reads stdin.");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Crc32,
    Adler32,
    Trailer,
    Inject,
}

#[derive(Debug)]
struct Opts {
    command: Command,
    verbose: bool,
    quiet: bool,
    html: Option<String>,
    fragment: Option<String>,
    fragment_crc: Option<u32>,
    fragment_len: Option<u32>,
    output: Option<String>,
    args: Vec<String>,
}

/// Parse a decimal or 0x-prefixed hex number.
fn parse_num(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn parse_u32(what: &str, s: &str) -> u32 {
    match parse_num(s).and_then(|n| u32::try_from(n).ok()) {
        Some(n) => n,
        None => {
            eprintln!("pzcombine: invalid {what} '{s}'");
            process::exit(1);
        }
    }
}

fn parse_u64(what: &str, s: &str) -> u64 {
    match parse_num(s) {
        Some(n) => n,
        None => {
            eprintln!("pzcombine: invalid {what} '{s}'");
            process::exit(1);
        }
    }
}

fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> &'a str {
    *i += 1;
    if *i >= args.len() {
        eprintln!("pzcombine: missing argument for {flag}");
        process::exit(1);
    }
    &args[*i]
}

fn parse_args() -> Opts {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut command = None;
    let mut opts = Opts {
        command: Command::Crc32,
        verbose: false,
        quiet: false,
        html: None,
        fragment: None,
        fragment_crc: None,
        fragment_len: None,
        output: None,
        args: Vec::new(),
    };

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-v" | "--verbose" => opts.verbose = true,
            "-q" | "--quiet" => opts.quiet = true,
            "-h" | "--help" => {
                usage();
                process::exit(0);
            }
            "--html" => {
                opts.html = Some(next_value(&args, &mut i, "--html").to_string());
            }
            "-p" | "--fragment" => {
                opts.fragment = Some(next_value(&args, &mut i, "-p").to_string());
            }
            "-c" | "--crc" => {
                let v = next_value(&args, &mut i, "-c");
                opts.fragment_crc = Some(parse_u32("fragment crc", v));
            }
            "-n" | "--len" => {
                let v = next_value(&args, &mut i, "-n");
                opts.fragment_len = Some(parse_u32("fragment length", v));
            }
            "-o" | "--output" => {
                opts.output = Some(next_value(&args, &mut i, "-o").to_string());
            }
            s if s.starts_with('-') && s.len() > 1 => {
                eprintln!("pzcombine: unknown flag '{s}'");
                process::exit(1);
            }
            _ if command.is_none() => {
                command = Some(match arg.as_str() {
                    "crc32" => Command::Crc32,
                    "adler32" => Command::Adler32,
                    "trailer" => Command::Trailer,
                    "inject" => Command::Inject,
                    other => {
                        eprintln!("pzcombine: unknown command '{other}'");
                        eprintln!("pzcombine: run 'pzcombine --help' for usage");
                        process::exit(1);
                    }
                });
            }
            _ => opts.args.push(arg.clone()),
        }
        i += 1;
    }

    match command {
        Some(c) => opts.command = c,
        None => {
            usage();
            process::exit(1);
        }
    }

    let expected = match opts.command {
        Command::Crc32 | Command::Adler32 => 3..=3,
        Command::Trailer => 2..=2,
        Command::Inject => 0..=1,
    };
    if !expected.contains(&opts.args.len()) {
        eprintln!(
            "pzcombine: expected {} argument(s), got {}",
            expected.end(),
            opts.args.len()
        );
        process::exit(1);
    }

    opts
}

fn init_logging(opts: &Opts) {
    let level = if opts.quiet {
        LevelFilter::Error
    } else if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();
}

fn read_file(path: &str) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("{path}: {e}"))
}

/// Read `path`, or stdin when it is `-`.
fn read_input(path: &str) -> Result<Vec<u8>, String> {
    if path == "-" {
        let mut data = Vec::new();
        io::stdin()
            .read_to_end(&mut data)
            .map_err(|e| format!("stdin: {e}"))?;
        Ok(data)
    } else {
        read_file(path)
    }
}

/// Fragment from `--html`, or from `-p` with an explicit CRC and length.
fn load_fragment(opts: &Opts) -> Result<InjectFragment, String> {
    if let Some(html) = opts.html.as_deref() {
        let payload = read_file(html)?;
        return InjectFragment::from_payload(&payload).map_err(|e| format!("{html}: {e}"));
    }

    let frag_path = opts
        .fragment
        .as_deref()
        .ok_or_else(|| "inject requires --html FILE or -p FRAGMENT".to_string())?;
    let crc = opts
        .fragment_crc
        .ok_or_else(|| "inject requires -c CRC".to_string())?;
    let len = opts
        .fragment_len
        .ok_or_else(|| "inject requires -n LEN".to_string())?;
    Ok(InjectFragment::new(read_file(frag_path)?, crc, len))
}

fn run_trailer(opts: &Opts) -> Result<(), String> {
    let mut trailers = Vec::with_capacity(2);
    for path in &opts.args {
        let data = read_file(path)?;
        let t = gzip::member_trailer(&data).map_err(|e| format!("{path}: {e}"))?;
        debug!("{path}: crc {:#010x}, isize {}", t.crc32, t.isize);
        trailers.push(t);
    }
    let combined = trailers[0].combine(&trailers[1]);
    println!("crc32 {:#010x} isize {}", combined.crc32, combined.isize);
    Ok(())
}

fn run_inject(opts: &Opts) -> Result<(), String> {
    let fragment = load_fragment(opts)?;
    let member_path = opts.args.first().map_or("-", String::as_str);
    let member = read_input(member_path)?;
    let spliced =
        gzip::inject(&fragment, &member).map_err(|e| format!("{member_path}: {e}"))?;

    match opts.output.as_deref() {
        Some(out) => fs::write(out, &spliced).map_err(|e| format!("{out}: {e}"))?,
        None => io::stdout()
            .write_all(&spliced)
            .map_err(|e| format!("stdout: {e}"))?,
    }
    debug!("{member_path}: {} → {} bytes", member.len(), spliced.len());
    Ok(())
}

fn run(opts: &Opts) -> Result<(), String> {
    match opts.command {
        Command::Crc32 => {
            let crc1 = parse_u32("crc1", &opts.args[0]);
            let crc2 = parse_u32("crc2", &opts.args[1]);
            let len2 = parse_u64("len2", &opts.args[2]);
            println!("{:#010x}", crc32_combine(crc1, crc2, len2));
            Ok(())
        }
        Command::Adler32 => {
            let adler1 = parse_u32("adler1", &opts.args[0]);
            let adler2 = parse_u32("adler2", &opts.args[1]);
            let len2 = parse_u64("len2", &opts.args[2]);
            println!("{:#010x}", adler32_combine(adler1, adler2, len2));
            Ok(())
        }
        Command::Trailer => run_trailer(opts),
        Command::Inject => run_inject(opts),
    }
}

fn main() -> ExitCode {
    let opts = parse_args();
    init_logging(&opts);
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pzcombine: {e}");
            ExitCode::FAILURE
        }
    }
}

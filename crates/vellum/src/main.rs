//! Vellum command-line entry point: render one page to an artifact.

use log::error;
use page_handler::{Engine, RenderOptions};
use std::process::exit;

const PROGRAM_NAME: &str = "vellum";
const VERSION_STRING: &str = "vellum 0.1.0";

fn print_usage_line() -> String {
    format!("usage: {PROGRAM_NAME} <url> [output.ppm] [width] [height] [--size=WIDTHxHEIGHT]")
}

fn is_help_flag(argument: &str) -> bool {
    argument == "-h" || argument == "--help"
}

fn is_version_flag(argument: &str) -> bool {
    argument == "-V" || argument == "--version"
}

fn parse_positive_int(text: &str) -> Option<i32> {
    let parsed: i32 = text.parse().ok()?;
    (parsed > 0).then_some(parsed)
}

/// Parse `--size=WIDTHxHEIGHT` with exactly one `x` separator.
fn parse_size_flag(argument: &str) -> Option<(i32, i32)> {
    let dimensions = argument.strip_prefix("--size=")?;
    let (width_text, height_text) = dimensions.split_once('x')?;
    if height_text.contains('x') {
        return None;
    }
    let width = parse_positive_int(width_text)?;
    let height = parse_positive_int(height_text)?;
    Some((width, height))
}

fn main() {
    env_logger::init();

    let arguments: Vec<String> = std::env::args().skip(1).collect();

    if arguments.len() == 1 && is_help_flag(&arguments[0]) {
        println!("{}", print_usage_line());
        return;
    }
    if arguments.len() == 1 && is_version_flag(&arguments[0]) {
        println!("{VERSION_STRING}");
        return;
    }

    let Some(url) = arguments.first() else {
        eprintln!("{}", print_usage_line());
        exit(1);
    };

    let mut options = RenderOptions::default();
    let mut positional_args: Vec<&String> = Vec::new();
    let mut has_size_flag = false;

    for argument in arguments.iter().skip(1) {
        let is_size_argument = argument == "--size" || argument.starts_with("--size=");
        if is_size_argument {
            if has_size_flag {
                eprintln!("Invalid --size: duplicate flag '{argument}'");
                eprintln!("{}", print_usage_line());
                exit(1);
            }
            match parse_size_flag(argument) {
                Some((width, height)) => {
                    options.viewport_width = width;
                    options.viewport_height = height;
                    has_size_flag = true;
                }
                None => {
                    eprintln!(
                        "Invalid --size: '{argument}' (expected --size=WIDTHxHEIGHT with positive integers)"
                    );
                    eprintln!("{}", print_usage_line());
                    exit(1);
                }
            }
            continue;
        }
        positional_args.push(argument);
    }

    if positional_args.len() > 3 {
        eprintln!("{}", print_usage_line());
        exit(1);
    }

    if let Some(output_path) = positional_args.first() {
        options.output_path = (*output_path).clone();
    }
    if let Some(width_arg) = positional_args.get(1) {
        match parse_positive_int(width_arg) {
            Some(width) => options.viewport_width = width,
            None => {
                eprintln!("Invalid width: {width_arg}");
                eprintln!("{}", print_usage_line());
                exit(1);
            }
        }
    }
    if let Some(height_arg) = positional_args.get(2) {
        match parse_positive_int(height_arg) {
            Some(height) => options.viewport_height = height,
            None => {
                eprintln!("Invalid height: {height_arg}");
                eprintln!("{}", print_usage_line());
                exit(1);
            }
        }
    }

    let mut engine = Engine::new();
    let result = engine.navigate(url, &options);

    if !result.ok {
        error!("navigation failed: {}", result.message);
        eprintln!("{}", result.message);
        exit(1);
    }

    println!("{}", result.message);
}

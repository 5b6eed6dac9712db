// Scenario Runner - Load and execute MANET scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/line.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/line.yaml --seed 0x1234...
//   cargo run --bin scenario_runner scenarios/line.yaml --log-level debug

mod manet;

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::LevelFilter;
use manet::runner::write_trace;
use manet::{ManetRunner, ScenarioFile};
use simple_logger::SimpleLogger;

struct Options {
    seed: Option<[u8; 32]>,
    level: LevelFilter,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <scenario.yaml | directory/> [--seed SEED_HEX] [--log-level LEVEL]",
            args[0]
        );
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/line.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/line.yaml --seed 0x123456...", args[0]);
        std::process::exit(1);
    }

    let options = parse_options(&args[2..]).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = SimpleLogger::new().with_level(options.level).init() {
        eprintln!("Failed to initialise logger: {}", e);
    }

    let path = Path::new(&args[1]);

    if path.is_file() {
        run_scenario_file(path, options.seed);
    } else if path.is_dir() {
        run_scenario_directory(path, options.seed);
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    }
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        seed: None,
        level: LevelFilter::Info,
    };

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("missing value for {}", flag))?;
        match flag.as_str() {
            "--seed" => options.seed = Some(parse_seed_hex(value)?),
            "--log-level" => {
                options.level = LevelFilter::from_str(value)
                    .map_err(|_| format!("unknown log level: {}", value))?
            }
            other => return Err(format!("unknown option: {}", other)),
        }
    }

    Ok(options)
}

fn run_scenario_directory(dir: &Path, seed: Option<[u8; 32]>) {
    let mut scenarios = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        std::process::exit(1);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                  ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        run_scenario_file(scenario_path, seed);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete!                               ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
}

fn run_scenario_file(path: &Path, seed: Option<[u8; 32]>) {
    println!("Loading scenario from: {}", path.display());

    let yaml_content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path.display(), e);
        std::process::exit(1);
    });

    let scenario = ScenarioFile::from_yaml(&yaml_content).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path.display(), e);
        std::process::exit(1);
    });

    let name = scenario.display_name(path);
    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  {}{}║", name, " ".repeat(54_usize.saturating_sub(name.len())));
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    let runner = ManetRunner::new(&scenario, seed).unwrap_or_else(|e| {
        eprintln!("Invalid scenario {}: {}", path.display(), e);
        std::process::exit(1);
    });

    println!("Configuration:");
    println!("  Nodes: {}", runner.network().nodes().len());
    println!("  Max ticks: {}", scenario.config.max_ticks);
    println!("  Placement: {:?}", scenario.config.placement);
    println!("  Route discoveries: {}", scenario.route_discoveries.len());
    println!("\nStarting simulation...\n");

    let (result, events) = runner.run();

    if scenario.output.print_events {
        for event in &events {
            println!("{}", event);
        }
        println!();
    }

    result.print_summary();

    if let Some(ref trace_path) = scenario.output.trace_path {
        match write_trace(trace_path, &events) {
            Ok(()) => println!("Trace written to {}", trace_path.display()),
            Err(e) => eprintln!("Failed to write trace {}: {}", trace_path.display(), e),
        }
    }

    println!("\n✓ Scenario complete!\n");
}

fn parse_seed_hex(hex: &str) -> Result<[u8; 32], String> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut seed = [0u8; 32];

    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte_str = std::str::from_utf8(chunk).map_err(|e| e.to_string())?;
        seed[i] = u8::from_str_radix(byte_str, 16)
            .map_err(|e| format!("invalid hex seed: {}", e))?;
    }

    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_hex() {
        let seed = parse_seed_hex("0x01ff").unwrap();
        assert_eq!(seed[0], 0x01);
        assert_eq!(seed[1], 0xff);
        assert!(seed[2..].iter().all(|b| *b == 0));

        assert!(parse_seed_hex("zz").is_err());
    }

    #[test]
    fn test_parse_options() {
        let args: Vec<String> = ["--log-level", "debug", "--seed", "ab"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let options = parse_options(&args).unwrap();
        assert_eq!(options.level, LevelFilter::Debug);
        assert_eq!(options.seed.map(|s| s[0]), Some(0xab));

        assert!(parse_options(&["--seed".to_string()]).is_err());
        assert!(parse_options(&["--fast".to_string(), "1".to_string()]).is_err());
    }
}

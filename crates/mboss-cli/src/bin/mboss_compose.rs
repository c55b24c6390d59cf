// mboss-compose: Compose machines left to right.
//
// Loads each machine JSON file, composes them in order (the output of each
// machine feeds the input of the next) and prints the composite machine as
// JSON on stdout.
//
// Usage:
//   mboss-compose MACHINE.json [MACHINE.json ...]
//
// Options:
//   -h, --help   Print help
//
// Environment:
//   MBOSS_LOG    Log filter (default: warn)

use mboss_core::jsonio::JsonDocument;
use mboss_fst::Machine;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if mboss_cli::wants_help(&args) || args.is_empty() {
        println!("mboss-compose: Compose machines left to right.");
        println!();
        println!("Usage: mboss-compose MACHINE.json [MACHINE.json ...]");
        println!();
        println!("Prints the composite machine as JSON.");
        println!();
        println!("Options:");
        println!("  -h, --help   Print this help");
        return;
    }

    mboss_cli::init_logging();

    let mut composite: Option<Machine> = None;
    for path in &args {
        let machine = mboss_cli::load_machine(path).unwrap_or_else(|e| mboss_cli::fatal(&e));
        tracing::info!(
            path = path.as_str(),
            states = machine.n_states(),
            transitions = machine.n_transitions(),
            "loaded machine"
        );
        composite = Some(match composite {
            Some(acc) => Machine::compose(&acc, &machine),
            None => machine,
        });
    }

    let Some(composite) = composite else {
        return;
    };
    let json = composite
        .to_json_value()
        .unwrap_or_else(|e| mboss_cli::fatal(&e.to_string()));
    mboss_cli::print_json(&json).unwrap_or_else(|e| mboss_cli::fatal(&e));
}

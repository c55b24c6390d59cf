// mboss-eval: Evaluate a machine under a parameter assignment.
//
// Converts the machine to advancing form, resolves its weights and prints the
// evaluated machine (states with incoming and outgoing log-weights) as JSON.
//
// Usage:
//   mboss-eval [-p PARAMS.json]... [--sum-silent] MACHINE.json
//
// Options:
//   -p, --params PATH   Parameter assignment; repeat to layer files, later
//                       ones overriding earlier (default: every weight is 1)
//   --sum-silent        Also print the log silent-path sum matrix
//   -h, --help          Print help

use mboss_fst::{EvalConfig, EvaluatedMachine};
use serde_json::json;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if mboss_cli::wants_help(&args) {
        println!("mboss-eval: Evaluate a machine under a parameter assignment.");
        println!();
        println!("Usage: mboss-eval [-p PARAMS.json]... [--sum-silent] MACHINE.json");
        println!();
        println!("Options:");
        println!("  -p, --params PATH   Parameter assignment; repeat to layer files, later");
        println!("                      ones overriding earlier (default: every weight is 1)");
        println!("  --sum-silent        Also print the log silent-path sum matrix");
        println!("  -h, --help          Print this help");
        return;
    }

    mboss_cli::init_logging();

    let (params_paths, args) = mboss_cli::parse_option_values(&args, "-p", "--params")
        .unwrap_or_else(|e| mboss_cli::fatal(&e));
    let sum_silent = args.iter().any(|a| a == "--sum-silent");
    let files: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
    if let Some(unknown) = args
        .iter()
        .find(|a| a.starts_with('-') && a.as_str() != "--sum-silent")
    {
        mboss_cli::fatal(&format!("unknown option: {unknown}"));
    }
    let [path] = files.as_slice() else {
        mboss_cli::fatal("expected exactly one machine file (see --help)");
    };

    let params =
        mboss_cli::load_layered_params(&params_paths).unwrap_or_else(|e| mboss_cli::fatal(&e));
    let machine = mboss_cli::load_machine(path).unwrap_or_else(|e| mboss_cli::fatal(&e));
    let machine = machine
        .advancing_machine()
        .unwrap_or_else(|e| mboss_cli::fatal(&e.to_string()));

    let evaluated = EvaluatedMachine::with_config(
        &machine,
        params.as_ref(),
        &EvalConfig::default(),
        |done, total| tracing::trace!(done, total, "evaluating"),
    )
    .unwrap_or_else(|e| mboss_cli::fatal(&e.to_string()));

    let mut json = evaluated.to_json_value();
    if sum_silent {
        let sum = evaluated
            .sum_in_trans()
            .unwrap_or_else(|e| mboss_cli::fatal(&e.to_string()));
        // -inf has no JSON number form; such entries print as null.
        json["sumInTrans"] = json!(sum);
    }
    mboss_cli::print_json(&json).unwrap_or_else(|e| mboss_cli::fatal(&e));
}

// mboss-transform: Apply structural transforms to a machine.
//
// Transforms are applied in the order given on the command line, and the
// resulting machine is printed as JSON on stdout.
//
// Usage:
//   mboss-transform [TRANSFORM ...] MACHINE.json
//
// Transforms:
//   --ergodic     Drop states unreachable from the start
//   --waiting     Split states that exit both with and without input
//   --advancing   Reorder states so silent transitions go forward
//   --aligning    Merge transitions with equal labels and destination
//   --reverse     Run the machine backwards
//   --flip        Swap input and output labels
//   -h, --help    Print help

use mboss_core::jsonio::JsonDocument;
use mboss_fst::{Machine, MachineError};

#[derive(Debug, Clone, Copy)]
enum Transform {
    Ergodic,
    Waiting,
    Advancing,
    Aligning,
    Reverse,
    Flip,
}

impl Transform {
    fn from_flag(flag: &str) -> Option<Self> {
        Some(match flag {
            "--ergodic" => Transform::Ergodic,
            "--waiting" => Transform::Waiting,
            "--advancing" => Transform::Advancing,
            "--aligning" => Transform::Aligning,
            "--reverse" => Transform::Reverse,
            "--flip" => Transform::Flip,
            _ => return None,
        })
    }

    fn apply(self, m: &Machine) -> Result<Machine, MachineError> {
        Ok(match self {
            Transform::Ergodic => m.ergodic_machine(),
            Transform::Waiting => m.waiting_machine(),
            Transform::Advancing => m.advancing_machine()?,
            Transform::Aligning => m.aligning_machine(),
            Transform::Reverse => m.reverse(),
            Transform::Flip => m.flip_in_out(),
        })
    }
}

fn print_help() {
    println!("mboss-transform: Apply structural transforms to a machine.");
    println!();
    println!("Usage: mboss-transform [TRANSFORM ...] MACHINE.json");
    println!();
    println!("Transforms are applied in the order given.");
    println!();
    println!("Transforms:");
    println!("  --ergodic     Drop states unreachable from the start");
    println!("  --waiting     Split states that exit both with and without input");
    println!("  --advancing   Reorder states so silent transitions go forward");
    println!("  --aligning    Merge transitions with equal labels and destination");
    println!("  --reverse     Run the machine backwards");
    println!("  --flip        Swap input and output labels");
    println!("  -h, --help    Print this help");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if mboss_cli::wants_help(&args) {
        print_help();
        return;
    }

    mboss_cli::init_logging();

    let mut transforms = Vec::new();
    let mut path = None;
    for arg in &args {
        if let Some(t) = Transform::from_flag(arg) {
            transforms.push(t);
        } else if arg.starts_with('-') {
            mboss_cli::fatal(&format!("unknown option: {arg}"));
        } else if path.replace(arg.as_str()).is_some() {
            mboss_cli::fatal("expected exactly one machine file");
        }
    }
    let Some(path) = path else {
        mboss_cli::fatal("missing machine file (see --help)");
    };

    let mut machine = mboss_cli::load_machine(path).unwrap_or_else(|e| mboss_cli::fatal(&e));
    for t in transforms {
        machine = t
            .apply(&machine)
            .unwrap_or_else(|e| mboss_cli::fatal(&format!("{t:?}: {e}")));
        tracing::debug!(
            transform = ?t,
            states = machine.n_states(),
            transitions = machine.n_transitions(),
            "applied transform"
        );
    }

    let json = machine
        .to_json_value()
        .unwrap_or_else(|e| mboss_cli::fatal(&e.to_string()));
    mboss_cli::print_json(&json).unwrap_or_else(|e| mboss_cli::fatal(&e));
}

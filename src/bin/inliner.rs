//! Inlining planner binary.
//!
//! Reads a test program, plans inlining for one of its methods and prints
//! the decisions. `RUST_LOG=debug` traces tree building and packing.

use benefit_inliner::core::{InlinerConfig, InliningSession, MethodHotness};
use benefit_inliner::inliner::{BenefitInliner, InliningReport};
use benefit_inliner::proposal::NodeSet;
use benefit_inliner::test_ir::{parse_program, TestProgramAdaptor};
use bumpalo::Bump;
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "inliner", version, about = "Plan benefit-driven inlining for a test program")]
struct Args {
    /// Test program to read ('-' for stdin)
    program: PathBuf,

    /// Method to compile
    #[arg(long, default_value = "main")]
    root: String,

    /// Explicit budget instead of the hotness-based one
    #[arg(long)]
    budget: Option<i64>,

    /// Hotness of the root method
    #[arg(long, value_enum, default_value_t = MethodHotness::Warm)]
    hotness: MethodHotness,

    /// How often a method may appear on the inlining call stack
    #[arg(long, default_value_t = 3)]
    self_inlining_limit: usize,

    /// Keep every target of polymorphic call sites
    #[arg(long)]
    multiple_targets: bool,

    /// Print the dependency tree
    #[arg(long)]
    print_idt: bool,

    /// Print the selected proposal
    #[arg(long)]
    print_proposal: bool,

    /// Print session statistics
    #[arg(long)]
    print_stats: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let text = if args.program.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(&args.program)?
    };

    let program = parse_program(&text)?;
    let mut adaptor = TestProgramAdaptor::new(&program, &args.root)?;

    let config = InlinerConfig {
        budget: args.budget,
        hotness: args.hotness,
        self_inlining_limit: args.self_inlining_limit,
        allow_multiple_targets: args.multiple_targets,
        ..InlinerConfig::default()
    };

    let arena = Bump::new();
    let session = InliningSession::new(&arena);
    let inliner = BenefitInliner::new(&session, &config);

    let root = adaptor.root();
    let idt = inliner.obtain_idt(&mut adaptor, root)?;
    if args.print_idt {
        println!("{}", idt.print());
    }

    let proposal = inliner.compute_proposal(&idt);
    if args.print_proposal {
        println!("{}", proposal.print());
    }

    let outcome = inliner.perform_inlining(&idt, &proposal, &mut adaptor);
    let report = InliningReport {
        method: idt.root().signature().to_string(),
        budget: idt.budget(),
        tree_nodes: idt.num_nodes(),
        tree_cost: idt.total_cost(),
        selected_nodes: proposal.num_nodes(),
        selected_cost: proposal.cost(),
        selected_benefit: proposal.benefit(),
        outcome,
    };
    print!("{}", report);
    print!("{}", adaptor.describe_inlining());

    if args.print_stats {
        print!("{}", session.stats());
    }
    Ok(())
}

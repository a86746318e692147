//! Drives the simulator to quiescence on a trace and prints the retirement
//! table and statistics block.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use clap::Parser;
use procsim::cli::CliArgs;
use procsim::error::SimError;
use procsim::simulator::{Simulator, SimulatorConfig};

fn main() -> Result<(), SimError> {
    env_logger::init();
    let args = CliArgs::parse();

    let config = SimulatorConfig {
        num_result_buses: args.r,
        fetch_rate: args.f,
        k0_size: args.k0,
        k1_size: args.k1,
        k2_size: args.k2,
    };

    log::info!(
        "starting run: r={} f={} k0={} k1={} k2={}",
        config.num_result_buses,
        config.fetch_rate,
        config.k0_size,
        config.k1_size,
        config.k2_size
    );

    match args.input {
        Some(path) => {
            let file = File::open(&path).map_err(|source| SimError::TraceOpen {
                path: path.clone(),
                source,
            })?;
            run(config, BufReader::new(file));
        }
        None => {
            let stdin = io::stdin();
            run(config, stdin.lock());
        }
    }

    Ok(())
}

fn run<R: BufRead>(config: SimulatorConfig, trace_source: R) {
    let r = config.num_result_buses;
    let f = config.fetch_rate;
    let k0 = config.k0_size;
    let k1 = config.k1_size;
    let k2 = config.k2_size;

    let mut sim = Simulator::new(config, trace_source);
    sim.run_to_completion();

    println!("Processor Settings");
    println!("R: {r}");
    println!("k0: {k0}");
    println!("k1: {k1}");
    println!("k2: {k2}");
    println!("F: {f}");
    println!();

    let mut retired = sim.retired.clone();
    retired.sort_by_key(|r| r.dest_tag.0);

    println!("INST\tFETCH\tDISP\tSCHED\tEXEC\tSTATE");
    for r in &retired {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            r.dest_tag.0 + 1,
            r.fetch_cycle,
            r.dispatch_cycle,
            r.schedule_cycle,
            r.execute_cycle,
            r.state_cycle
        );
    }

    let m = &sim.metrics;
    println!();
    println!("total_branch_instructions: {}", m.total_branch_instr());
    println!("total_correct_branch_predictions: {}", m.total_correct_branch());
    println!("branch_prediction_accuracy: {:.6}", m.prediction_accuracy());
    println!("avg_disp_queue_size: {:.6}", m.avg_dispatch_queue());
    println!("max_disp_queue_size: {}", m.max_dispatch_queue());
    println!("avg_inst_issued_per_cycle: {:.6}", m.avg_inst_issue_per_cycle());
    println!("avg_inst_retired_per_cycle: {:.6}", m.avg_inst_retired_per_cycle());
    println!("total_runtime_cycles: {}", m.total_runtime());
}

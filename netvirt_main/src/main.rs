// NetVirt: Topology Virtualization and Traffic Engineering
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use netvirt::backend::virtualize;
use netvirt::lp::{create_solver, optimize, TrafficEngineering};
use netvirt::printer;
use netvirt::virtual_net::VirtualNetwork;
use netvirt::Diagnostics;
use netvirt_runtime::ScriptBackend;

use chrono::Local;
use clap::Parser;
use log::*;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

mod log_file;
mod topology_file;
use log_file::Tee;
use topology_file::TopologyFile;

fn main() -> Result<(), Box<dyn Error>> {
    // run clap
    let args = CommandLineArguments::parse();

    init_logger(&args)?;

    run(&args).map_err(|e| {
        error!("{}", e);
        e
    })
}

/// Initialize the env logger. With a log directory, every record is written to the console and
/// to a new log file in that directory.
fn init_logger(args: &CommandLineArguments) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::Debug
    } else if args.silent {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    let filters = std::env::var("RUST_LOG").ok();

    let dir = match args.log.as_ref() {
        Some(dir) => dir,
        None => {
            let mut builder = pretty_env_logger::formatted_builder();
            builder.filter_level(level);
            if let Some(filters) = filters.as_ref() {
                builder.parse_filters(filters);
            }
            builder.init();
            return Ok(());
        }
    };

    let (tee, path) = Tee::create(dir, &Local::now())?;
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(tee)));
    if let Some(filters) = filters.as_ref() {
        builder.parse_filters(filters);
    }
    builder.init();
    info!("Writing the log to {}", path.display());
    Ok(())
}

fn run(args: &CommandLineArguments) -> Result<(), Box<dyn Error>> {
    check_definition_path(&args.definition)?;
    let file = TopologyFile::load(&args.definition)?;

    let mut diagnostics = Diagnostics::new();
    let topo = file.builder()?.build(&mut diagnostics)?;

    if args.draw {
        println!("{}", printer::topology_dot(&topo));
        return Ok(());
    }

    let vnet = VirtualNetwork::build(&topo, &mut diagnostics)?;
    for e in vnet.elements() {
        debug!("{}", e);
        for line in printer::route_table(&vnet, e.id())? {
            debug!("{}", line);
        }
    }

    let mut solver = create_solver(&args.solver)?;
    solver.set_verbose(args.verbose);

    if args.lp {
        let te = TrafficEngineering::new(&topo, &vnet, &mut diagnostics)?;
        println!("{}", te.task().to_cplex());
        return Ok(());
    }

    let shaping = if topo.demands().is_empty() {
        info!("No demands declared, skipping traffic engineering");
        Vec::new()
    } else {
        let (te, plan) = optimize(&topo, &vnet, solver.as_mut(), &mut diagnostics)?;
        for flow in plan.flows.iter() {
            let line = printer::flow_result(&topo, &vnet, flow)?;
            if args.print {
                println!("{}", line);
            } else {
                info!("{}", line);
            }
        }
        if args.print {
            return Ok(());
        }
        let rules = plan.shaping_rules(&te, &vnet)?;
        for rule in rules.iter() {
            debug!("{}", printer::shaping_rule(rule));
        }
        rules
    };

    let mut backend = ScriptBackend::default();
    virtualize(&topo, &vnet, &shaping, &mut backend, &mut diagnostics)?;
    match args.output.as_ref() {
        Some(path) => {
            std::fs::write(path, backend.script())?;
            let teardown = path.with_extension("teardown.sh");
            std::fs::write(&teardown, backend.teardown_script())?;
            info!(
                "Setup script written to {}, teardown to {}",
                path.display(),
                teardown.display()
            );
        }
        None => print!("{}", backend.script()),
    }

    if !diagnostics.is_empty() {
        warn!("{} warnings were raised", diagnostics.warnings().len());
    }
    Ok(())
}

fn check_definition_path(path: &Path) -> Result<(), Box<dyn Error>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(()),
        _ => Err(format!("{} is not a YAML file", path.display()).into()),
    }
}

/// Read a network topology written in YAML, compute the traffic-engineering plan, and emit the
/// script instantiating it.
#[derive(Parser, Debug)]
#[command(name = "netvirt", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Path to the YAML file containing the network definition
    definition: PathBuf,
    /// Output the physical topology in GraphViz format, and exit
    #[arg(short, long)]
    draw: bool,
    /// Output the linear program in CPLEX format, and exit
    #[arg(long)]
    lp: bool,
    /// Print the goodput of every demand instead of virtualizing the network
    #[arg(short, long)]
    print: bool,
    /// Show debug output, including the solved value of every variable
    #[arg(short, long, conflicts_with = "silent")]
    verbose: bool,
    /// Only show errors
    #[arg(short, long)]
    silent: bool,
    /// Solver backend
    #[arg(long, default_value = "microlp")]
    solver: String,
    /// Write the setup script to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Directory to store the log files
    #[arg(short, long)]
    log: Option<PathBuf>,
}

//! RL78/G13 promotion board command line.
//!
//! This binary is the outermost failure boundary for bring-up. It performs:
//! 1. **Boot:** Builds a configuration from an optional JSON file plus flags, brings the board up,
//!    and prints the resulting memory map.
//! 2. **Machines:** Lists the machines this build can bring up.
//!
//! Any bring-up error is printed to stderr and the process exits with status 1.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rl78sim_core::config::Config;
use rl78sim_core::core::CpuModel;
use rl78sim_core::soc::{Board, MACHINE};
use rl78sim_core::BringUpError;

#[derive(Parser, Debug)]
#[command(
    name = "rl78sim",
    author,
    version,
    about = "Renesas RL78/G13 promotion board",
    long_about = "Map the RL78/G13 promotion board memory, load a firmware ELF into code flash and realize the CPU.\n\nExamples:\n  rl78sim boot -b blinky.elf\n  rl78sim boot -b blinky.elf -L /usr/share/rl78 -m 4096\n  rl78sim boot --config board.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bring the board up and print its memory map.
    Boot {
        /// JSON configuration file; flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Firmware ELF file name.
        #[arg(short = 'b', long = "bios")]
        bios: Option<String>,

        /// Directory searched for the firmware (repeatable).
        #[arg(short = 'L', long = "search-dir")]
        search_dirs: Vec<PathBuf>,

        /// Requested RAM size in bytes.
        #[arg(short = 'm', long = "ram-size")]
        ram_size: Option<usize>,

        /// CPU model.
        #[arg(long)]
        cpu: Option<String>,

        /// Number of CPUs.
        #[arg(long)]
        smp: Option<usize>,
    },

    /// List supported machines and CPU models.
    Machines,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Boot {
            config,
            bios,
            search_dirs,
            ram_size,
            cpu,
            smp,
        } => {
            let result = build_config(config, bios, search_dirs, ram_size, cpu, smp)
                .and_then(|config| cmd_boot(&config));
            if let Err(e) = result {
                eprintln!("rl78sim: {e}");
                process::exit(1);
            }
        }
        Commands::Machines => cmd_machines(),
    }
}

/// Loads the configuration file if given and applies command-line overrides.
fn build_config(
    path: Option<PathBuf>,
    bios: Option<String>,
    search_dirs: Vec<PathBuf>,
    ram_size: Option<usize>,
    cpu: Option<String>,
    smp: Option<usize>,
) -> Result<Config, BringUpError> {
    let mut config = match path {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    if bios.is_some() {
        config.firmware.name = bios;
    }
    config.firmware.search_path.extend(search_dirs);
    if let Some(size) = ram_size {
        config.memory.ram_size = size;
    }
    if cpu.is_some() {
        config.machine.cpu_model = cpu;
    }
    if let Some(smp) = smp {
        config.machine.smp = smp;
    }
    Ok(config)
}

/// Brings the board up and prints the memory map.
fn cmd_boot(config: &Config) -> Result<(), BringUpError> {
    debug!(?config, "effective configuration");
    let board = Board::new(config)?;
    let machine = &board.machine;

    println!("[*] {} ({})", MACHINE.desc, MACHINE.name);
    println!(
        "    CPU: {}  RAM: {} bytes  Firmware: {} bytes, entry {:#x}",
        machine.cpu.model(),
        machine.ram_size,
        machine.firmware.size,
        machine.firmware.entry
    );
    println!();
    print!("{}", board.space);
    Ok(())
}

/// Prints the machine table.
fn cmd_machines() {
    let default = if MACHINE.is_default { " (default)" } else { "" };
    println!("Supported machines:");
    println!("  {:<12} {}{}", MACHINE.name, MACHINE.desc, default);
    println!();
    println!("CPU models:");
    for model in CpuModel::ALL {
        println!("  {model}");
    }
}

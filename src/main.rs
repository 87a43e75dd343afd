#![deny(missing_debug_implementations, rust_2018_idioms)]

use std::path::PathBuf;
use std::process::ExitCode;

use abcross::binfmt::Binfmt;
use abcross::config::Config;
use abcross::errors::ParseArchError;
use abcross::shell::MessageInfo;
use abcross::Architecture;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

const APP_NAME: &str = "abcross";
static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), abcross::commit_info!());

#[derive(Parser, Debug)]
#[clap(about, long_about = None, name = APP_NAME, version = VERSION)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
    /// Provide verbose diagnostic output.
    #[clap(short, long, global = true)]
    verbose: bool,
    /// Do not print abcross log messages.
    #[clap(short, long, global = true)]
    quiet: bool,
    /// Coloring: auto, always, never
    #[clap(long, global = true)]
    color: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the architecture of the running system.
    Host,
    /// List supported architectures.
    List(List),
    /// Check that binfmt_misc can run binaries of the given architectures.
    Check(Check),
    /// Print the standard sysroot of an architecture.
    Sysroot(Sysroot),
}

#[derive(Args, Debug)]
struct List {
    /// Print as JSON.
    #[clap(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct Check {
    /// Architectures to check, such as arm64 or riscv64.
    #[clap(value_parser = parse_architecture, required = true)]
    architectures: Vec<Architecture>,
}

#[derive(Args, Debug)]
struct Sysroot {
    /// Architecture name, such as loongson3.
    #[clap(value_parser = parse_architecture)]
    architecture: Architecture,
}

#[derive(Serialize, Debug)]
struct ArchInfo {
    name: Architecture,
    qemu_arch: &'static str,
    qemu_bin: String,
    sysroot: PathBuf,
    retro: bool,
}

impl From<Architecture> for ArchInfo {
    fn from(arch: Architecture) -> Self {
        ArchInfo {
            name: arch,
            qemu_arch: arch.qemu_arch(),
            qemu_bin: arch.qemu_bin(),
            sysroot: arch.standard_sysroot(),
            retro: arch.is_retro(),
        }
    }
}

fn parse_architecture(s: &str) -> Result<Architecture, ParseArchError> {
    s.parse()
}

fn host(msg_info: &mut MessageInfo) -> abcross::Result<bool> {
    match Architecture::match_current_arch()? {
        Some(arch) => {
            msg_info.print(arch)?;
            Ok(true)
        }
        None => {
            msg_info.warn("the running system does not match a supported architecture")?;
            Ok(false)
        }
    }
}

fn list(args: &List, msg_info: &mut MessageInfo) -> abcross::Result<bool> {
    let infos = Architecture::ALL
        .into_iter()
        .map(ArchInfo::from)
        .collect::<Vec<_>>();
    if args.json {
        msg_info.print(serde_json::to_string_pretty(&infos)?)?;
    } else {
        for info in &infos {
            msg_info.print(format_args!(
                "{:<12} {:<10} {}{}",
                info.name,
                info.qemu_arch,
                info.sysroot.display(),
                if info.retro { " (retro)" } else { "" }
            ))?;
        }
    }
    Ok(true)
}

fn check(args: &Check, msg_info: &mut MessageInfo) -> abcross::Result<bool> {
    let binfmt = Binfmt::from_config(&Config::new());
    match binfmt.is_enabled() {
        Ok(true) => {}
        Ok(false) => msg_info.warn("binfmt_misc support is disabled on this system")?,
        Err(e) => msg_info.warn(format_args!("unable to read binfmt_misc status: {e}"))?,
    }

    let mut all_available = true;
    for &arch in &args.architectures {
        match binfmt.have_qemu(arch, msg_info)? {
            Some(interpreter) => {
                msg_info.print(format_args!("{arch}: {}", interpreter.display()))?;
            }
            None => all_available = false,
        }
    }
    Ok(all_available)
}

pub fn main() -> abcross::Result<ExitCode> {
    abcross::install_panic_hook()?;
    let cli = Cli::parse();
    let mut msg_info = MessageInfo::create(cli.verbose, cli.quiet, cli.color.as_deref())?;

    let success = match &cli.command {
        Commands::Host => host(&mut msg_info)?,
        Commands::List(args) => list(args, &mut msg_info)?,
        Commands::Check(args) => check(args, &mut msg_info)?,
        Commands::Sysroot(args) => {
            msg_info.print(args.architecture.standard_sysroot().display())?;
            true
        }
    };

    if success && !msg_info.should_fail() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

//! zk-shell binary entry point.

use std::io::{self, Write};
use std::process;

use tracing::{debug, info};
use zk_shell::config::Config;
use zk_shell::{cli, logging, repl, Command, MemoryEnsemble, Shell};

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Try 'zk-shell --help' for more information.");
            process::exit(1);
        }
    };

    if args.help {
        cli::print_help();
        return;
    }

    if args.version {
        cli::print_version();
        return;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    logging::init(config.log_filter());
    info!("zk-shell v{}", env!("CARGO_PKG_VERSION"));
    debug!(servers = ?config.servers, "configuration loaded");

    let mut shell = Shell::new(config.to_client_config(), Box::new(MemoryEnsemble::new()));
    if let Err(e) = shell.open() {
        println!("{e}");
        process::exit(1);
    }

    if !args.command.is_empty() {
        let cmd = Command::from_args(args.command);
        let mut out = io::stdout().lock();
        let code = shell.run(&cmd, &mut out);
        let _ = out.flush();
        shell.shutdown();
        process::exit(code);
    }

    if let Err(e) = repl::run(shell) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

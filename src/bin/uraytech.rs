use clap::{ArgAction, CommandFactory, Parser};
use log::debug;
use std::process;
use std::time::Duration;
use tvctl::uraytech;

const COMMAND_HELP: &str = "\
Commands:
  channelup     Next channel
  channeldown   Previous channel
  channel:<id>  Tune to channel <id> (ids start at 1)
  reboot        Reboot the decoder
  status        Fetch and print the decoder's status page";

/// Send a control command to a URayTech decoder.
#[derive(Parser, Debug)]
#[command(version, about, disable_help_flag = true, after_help = COMMAND_HELP)]
struct Args {
    /// Hostname of the decoder to connect to.
    #[arg(short = 'H', long)]
    host: String,

    /// Command to send.
    #[arg(short = 'c', long)]
    command: String,

    /// Port the decoder's web interface listens on.
    #[arg(short = 'P', long, default_value_t = uraytech::DEFAULT_PORT)]
    port: u16,

    /// Username for basic auth.
    #[arg(
        short = 'u',
        long,
        env = "URAYTECH_USERNAME",
        default_value = uraytech::DEFAULT_USERNAME
    )]
    username: String,

    /// Password for basic auth.
    #[arg(
        short = 'p',
        long,
        env = "URAYTECH_PASSWORD",
        default_value = uraytech::DEFAULT_PASSWORD
    )]
    password: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Print the request and response.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Print this usage text and exit.
    #[arg(short = 'h', long = "help", action = ArgAction::Help)]
    help: Option<bool>,

    /// Same as -h.
    #[arg(short = '?', hide = true, action = ArgAction::Help)]
    help_alias: Option<bool>,
}

fn run(args: &Args) -> Result<(), uraytech::Error> {
    let query = uraytech::encode(&args.command)?;
    debug!("query: {query}");
    let body = uraytech::send(
        &args.host,
        args.port,
        &query,
        &args.username,
        &args.password,
        Duration::from_secs(args.timeout),
    )?;
    if args.command == "status" {
        print!("{body}");
        if !body.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // Help takes the same nonzero exit as bad flags, so scripted callers
        // cannot mistake a usage dump for a dispatched command.
        Err(err) => {
            let _ = err.print();
            process::exit(2);
        }
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "warn" }),
    )
    .format_timestamp(None)
    .target(env_logger::Target::Stdout)
    .init();
    debug!("hostname: {}", args.host);
    debug!("port: {}", args.port);

    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        if matches!(err, uraytech::Error::UnknownCommand(_)) {
            let _ = Args::command().print_help();
            process::exit(2);
        }
        process::exit(1);
    }
}

use clap::{ArgAction, CommandFactory, Parser};
use log::debug;
use std::process;
use std::time::Duration;
use tvctl::aquos;

const COMMAND_HELP: &str = "\
Commands:
  poweroff  POWR   0  Power off
  poweron   POWR   1  Power on
  hdmi1     INPS   2  Input HDMI1
  hdmi2     INPS   3  Input HDMI2
  hdmi3     INPS   4  Input HDMI3
  vol:<n>   VOLM <n>  Volume to <n> percent, 0 to 100
  mute      MUTE   1  Mute sound
  unmute    MUTE   0  Unmute sound";

/// Send a control command to a Sharp Aquos TV.
#[derive(Parser, Debug)]
#[command(version, about, disable_help_flag = true, after_help = COMMAND_HELP)]
struct Args {
    /// Hostname of the TV to connect to.
    #[arg(short = 'H', long)]
    host: String,

    /// Command to send.
    #[arg(short = 'c', long)]
    command: String,

    /// Port the TV listens on.
    #[arg(short = 'P', long, default_value_t = aquos::DEFAULT_PORT)]
    port: u16,

    /// Username for the login prompt.
    #[arg(
        short = 'u',
        long,
        env = "AQUOS_USERNAME",
        default_value = aquos::DEFAULT_USERNAME
    )]
    username: String,

    /// Password for the login prompt.
    #[arg(
        short = 'p',
        long,
        env = "AQUOS_PASSWORD",
        default_value = aquos::DEFAULT_PASSWORD
    )]
    password: String,

    /// Skip the login prompt (panels such as the 4P-B86EJ2U run without one).
    #[arg(short = 'n', long)]
    no_login: bool,

    /// Connect and prompt-wait timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Print the exchange with the TV.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Print this usage text and exit.
    #[arg(short = 'h', long = "help", action = ArgAction::Help)]
    help: Option<bool>,

    /// Same as -h.
    #[arg(short = '?', hide = true, action = ArgAction::Help)]
    help_alias: Option<bool>,
}

fn run(args: &Args) -> Result<(), aquos::Error> {
    let command = aquos::encode(&args.command)?;
    debug!("command: {command:?}");
    let mut session = aquos::Session::connect(
        &args.host,
        args.port,
        Duration::from_secs(args.timeout),
    )?;
    if !args.no_login {
        session.login(&args.username, &args.password)?;
    }
    session.send_command(&command)
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
    debug!("login: {}", !args.no_login);

    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        if matches!(err, aquos::Error::UnknownCommand(_)) {
            let _ = Args::command().print_help();
            process::exit(2);
        }
        process::exit(1);
    }
}

use clap::{ArgAction, CommandFactory, Parser};
use log::debug;
use std::process;
use std::time::Duration;
use tvctl::samsung;

const COMMAND_HELP: &str = "\
Commands:
  poweroff  aa:11:fe:01:00:10  Power off
  poweron   aa:11:fe:01:01:11  Power on
  hdmi1     aa:14:fe:01:21:34  Input HDMI1
  hdmi2     aa:14:fe:01:23:36  Input HDMI2
  hdmi3     aa:14:fe:01:31:44  Input HDMI3
  vol:<n>   aa:12:01:01:nn:cc  Volume to <n>, 0 (min) to 64 (max)
  mute      aa:13:fe:01:01:01  Mute sound
  unmute    aa:13:fe:01:00:12  Unmute sound";

/// Send a control command to a Samsung TV.
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
    #[arg(short = 'P', long, default_value_t = samsung::DEFAULT_PORT)]
    port: u16,

    /// Connect and write timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Print what is being sent.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Print this usage text and exit.
    #[arg(short = 'h', long = "help", action = ArgAction::Help)]
    help: Option<bool>,

    /// Same as -h.
    #[arg(short = '?', hide = true, action = ArgAction::Help)]
    help_alias: Option<bool>,
}

fn run(args: &Args) -> Result<(), samsung::Error> {
    let frame = samsung::encode(&args.command)?;
    debug!("command: {frame:02x?}");
    samsung::send(
        &args.host,
        args.port,
        &frame,
        Duration::from_secs(args.timeout),
    )
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
        if matches!(err, samsung::Error::UnknownCommand(_)) {
            let _ = Args::command().print_help();
            process::exit(2);
        }
        process::exit(1);
    }
}

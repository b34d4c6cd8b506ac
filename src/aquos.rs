// Sharp's Aquos control protocol is line-oriented text on TCP port 10008:
// eight-column commands, a literal OK for every accepted one, and on most
// panels a Login:/Password: prompt gating the session.

use log::debug;
use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

pub const DEFAULT_PORT: u16 = 10008;
pub const DEFAULT_USERNAME: &str = "USER";
pub const DEFAULT_PASSWORD: &str = "PWD";

const COMMANDS: &[(&str, &str)] = &[
    ("poweroff", "POWR   0"),
    ("poweron", "POWR   1"),
    ("hdmi1", "INPS   2"),
    ("hdmi2", "INPS   3"),
    ("hdmi3", "INPS   4"),
    ("mute", "MUTE   1"),
    ("unmute", "MUTE   0"),
];

/// The tokens a dispatch waits on, in the order the panel produces them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Prompt {
    Login,
    Password,
    Ack,
}

impl Prompt {
    fn pattern(self) -> &'static [u8] {
        match self {
            Prompt::Login => b"login:",
            Prompt::Password => b"password:",
            Prompt::Ack => b"OK",
        }
    }

    // The login prompts vary in case across firmware revisions; OK does not.
    fn ignore_case(self) -> bool {
        !matches!(self, Prompt::Ack)
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Prompt::Login => write!(f, "Login:"),
            Prompt::Password => write!(f, "Password:"),
            Prompt::Ack => write!(f, "OK"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown command {0:?}")]
    UnknownCommand(String),
    #[error("Bad volume value {0:?}")]
    BadVolume(String),
    #[error("No addresses found for {0}")]
    NoAddress(String),
    #[error("Timed out waiting for {0}")]
    PromptTimeout(Prompt),
    #[error("Connection closed while waiting for {0}")]
    ConnectionClosed(Prompt),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn encode(command: &str) -> Result<String, Error> {
    if let Some(value) = command.strip_prefix("vol:") {
        return encode_volume(value);
    }
    COMMANDS
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, text)| (*text).to_string())
        .ok_or_else(|| Error::UnknownCommand(command.to_string()))
}

// Commands are a fixed eight columns, so the volume value is right-aligned
// after VOLM with one, two or three digits of room.
fn encode_volume(value: &str) -> Result<String, Error> {
    let level: u32 = value
        .parse()
        .map_err(|_| Error::BadVolume(value.to_string()))?;
    match level {
        100 => Ok(format!("VOLM {level}")),
        10..=99 => Ok(format!("VOLM  {level}")),
        0..=9 => Ok(format!("VOLM   {level}")),
        _ => Err(Error::BadVolume(value.to_string())),
    }
}

/// One control connection to a panel. The exchange is strictly linear:
/// connect, optionally log in, send the command, wait for OK, say BYE.
pub struct Session {
    stream: TcpStream,
    pending: Vec<u8>,
    timeout: Duration,
}

impl Session {
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Session, Error> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::NoAddress(host.to_string()))?;
        debug!("connecting to {addr}");
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(Session {
            stream,
            pending: Vec::new(),
            timeout,
        })
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), Error> {
        self.expect(Prompt::Login)?;
        self.send_line(username)?;
        self.expect(Prompt::Password)?;
        self.send_line(password)?;
        self.expect(Prompt::Ack)?;
        Ok(())
    }

    /// Sends one encoded command (with its trailing space), waits for the
    /// panel's OK and closes the exchange with BYE.
    pub fn send_command(&mut self, command: &str) -> Result<(), Error> {
        self.send_line(&format!("{command} "))?;
        self.expect(Prompt::Ack)?;
        self.send_line("BYE ")?;
        Ok(())
    }

    fn send_line(&mut self, line: &str) -> Result<(), Error> {
        debug!("sending {line:?}");
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\n")?;
        Ok(())
    }

    // Blocks until the prompt shows up in the incoming byte stream or the
    // deadline passes. Bytes past the match stay buffered for the next wait.
    fn expect(&mut self, prompt: Prompt) -> Result<(), Error> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(end) = find_prompt(&self.pending, prompt) {
                debug!("matched {prompt}");
                self.pending.drain(..end);
                return Ok(());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::PromptTimeout(prompt));
            }
            self.stream.set_read_timeout(Some(remaining))?;
            let mut chunk = [0u8; 512];
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(Error::ConnectionClosed(prompt)),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(Error::PromptTimeout(prompt))
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

// Returns the offset just past the first occurrence of the prompt.
fn find_prompt(haystack: &[u8], prompt: Prompt) -> Option<usize> {
    let pattern = prompt.pattern();
    if haystack.len() < pattern.len() {
        return None;
    }
    haystack
        .windows(pattern.len())
        .position(|window| {
            if prompt.ignore_case() {
                window.eq_ignore_ascii_case(pattern)
            } else {
                window == pattern
            }
        })
        .map(|start| start + pattern.len())
}

#[cfg(test)]
mod tests {
    use crate::aquos::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    macro_rules! test_command {
        ($name:ident, $command:expr, $want:expr) => {
            #[test]
            fn $name() {
                assert_eq!(encode($command).unwrap(), $want);
            }
        };
    }

    test_command! {poweroff, "poweroff", "POWR   0"}
    test_command! {poweron, "poweron", "POWR   1"}
    test_command! {hdmi1, "hdmi1", "INPS   2"}
    test_command! {hdmi2, "hdmi2", "INPS   3"}
    test_command! {hdmi3, "hdmi3", "INPS   4"}
    test_command! {mute, "mute", "MUTE   1"}
    test_command! {unmute, "unmute", "MUTE   0"}
    test_command! {vol_one_digit, "vol:5", "VOLM   5"}
    test_command! {vol_two_digits, "vol:50", "VOLM  50"}
    test_command! {vol_max, "vol:100", "VOLM 100"}
    test_command! {vol_leading_zero, "vol:050", "VOLM  50"}

    #[test]
    fn test_commands_are_eight_columns() {
        for (_, text) in COMMANDS {
            assert_eq!(text.len(), 8, "{text:?}");
        }
        for value in ["0", "9", "10", "99", "100"] {
            let command = encode(&format!("vol:{value}")).unwrap();
            assert_eq!(command.len(), 8, "{command:?}");
        }
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(encode("volume"), Err(Error::UnknownCommand(_))));
    }

    #[test]
    fn test_bad_volume() {
        assert!(matches!(encode("vol:101"), Err(Error::BadVolume(_))));
        assert!(matches!(encode("vol:loud"), Err(Error::BadVolume(_))));
    }

    #[test]
    fn test_find_prompt() {
        assert_eq!(find_prompt(b"\r\nLogin:", Prompt::Login), Some(8));
        assert_eq!(find_prompt(b"\r\nlogin:", Prompt::Login), Some(8));
        assert_eq!(find_prompt(b"Log", Prompt::Login), None);
        assert_eq!(find_prompt(b"OK\r\n", Prompt::Ack), Some(2));
        assert_eq!(find_prompt(b"ok\r\n", Prompt::Ack), None);
        assert_eq!(find_prompt(b"", Prompt::Ack), None);
    }

    // Speaks the panel's side of one logged-in dispatch and returns every
    // line the client sent.
    fn fake_panel(listener: TcpListener) -> thread::JoinHandle<Vec<String>> {
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut received = Vec::new();
            let read_line = |reader: &mut BufReader<TcpStream>| {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                line
            };
            stream.write_all(b"Welcome\r\nlogin:").unwrap();
            received.push(read_line(&mut reader));
            stream.write_all(b"Password:").unwrap();
            received.push(read_line(&mut reader));
            stream.write_all(b"OK\r\n").unwrap();
            received.push(read_line(&mut reader));
            stream.write_all(b"OK\r\n").unwrap();
            received.push(read_line(&mut reader));
            received
        })
    }

    #[test]
    fn test_login_and_dispatch() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let panel = fake_panel(listener);

        let mut session = Session::connect("127.0.0.1", port, Duration::from_secs(5)).unwrap();
        session.login("USER", "PWD").unwrap();
        session.send_command("POWR   1").unwrap();

        let received = panel.join().unwrap();
        assert_eq!(received, ["USER\n", "PWD\n", "POWR   1 \n", "BYE \n"]);
    }

    #[test]
    fn test_dispatch_without_login() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let panel = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            stream.write_all(b"OK\r\n").unwrap();
            let mut bye = String::new();
            reader.read_line(&mut bye).unwrap();
            (line, bye)
        });

        let mut session = Session::connect("127.0.0.1", port, Duration::from_secs(5)).unwrap();
        session.send_command("MUTE   1").unwrap();

        let (line, bye) = panel.join().unwrap();
        assert_eq!(line, "MUTE   1 \n");
        assert_eq!(bye, "BYE \n");
    }

    #[test]
    fn test_login_prompt_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        // Accepts and then says nothing.
        let panel = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let mut session = Session::connect("127.0.0.1", port, Duration::from_millis(50)).unwrap();
        let err = session.login("USER", "PWD").unwrap_err();
        assert!(matches!(err, Error::PromptTimeout(Prompt::Login)), "{err:?}");
        panel.join().unwrap();
    }

    #[test]
    fn test_closed_before_ack() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let panel = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            stream.write_all(b"Login:").unwrap();
            let mut username = String::new();
            reader.read_line(&mut username).unwrap();
            // Hang up instead of asking for the password.
        });

        let mut session = Session::connect("127.0.0.1", port, Duration::from_secs(5)).unwrap();
        let err = session.login("USER", "PWD").unwrap_err();
        assert!(
            matches!(err, Error::ConnectionClosed(Prompt::Password)),
            "{err:?}"
        );
        panel.join().unwrap();
    }
}

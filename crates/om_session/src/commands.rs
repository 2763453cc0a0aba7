//! The `/omemo` command surface.

/// Root command registered with the host.
pub const COMMAND: &str = "/omemo";

/// Subcommands offered for completion at the root.
pub const SUBCOMMANDS: &[&str] = &[
    "start",
    "end",
    "announce",
    "account",
    "fulljid",
    "show_devices",
];

/// A parsed `/omemo` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start encrypting to a peer.
    Start(String),
    /// Stop encrypting to a peer.
    End(String),
    /// Re-announce our bundle.
    Announce,
    /// Print the connected account address.
    Account,
    /// Print the connection's full JID.
    FullJid,
    /// List the cached devices of a peer.
    ShowDevices(String),
}

impl Command {
    /// Parse the argument vector after `/omemo`. `None` means unknown or
    /// incomplete input; the caller prints usage.
    pub fn parse(args: &[&str]) -> Option<Command> {
        match args {
            ["start", peer] => Some(Command::Start((*peer).to_owned())),
            ["end", peer] => Some(Command::End((*peer).to_owned())),
            ["announce"] => Some(Command::Announce),
            ["account"] => Some(Command::Account),
            ["fulljid"] => Some(Command::FullJid),
            ["show_devices", peer] => Some(Command::ShowDevices((*peer).to_owned())),
            _ => None,
        }
    }
}

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "teller")]
#[command(about = "Browse and export Stacks, ordinals and BOB indexer data from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of the platform default.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fungible tokens and their holders (Hiro)
    #[command(subcommand)]
    Token(TokenCommand),
    /// Transactions of one principal (Hiro)
    #[command(subcommand)]
    Transactions(TransactionsCommand),
    /// BNS names (Hiro)
    #[command(subcommand)]
    Names(NamesCommand),
    /// Token balances of one address or of every configured wallet (Hiro)
    #[command(subcommand)]
    Wallet(WalletCommand),
    /// Rune index from an ord server
    Runes,
    #[command(subcommand)]
    Bob(BobCommand),
    #[command(subcommand)]
    Contracts(ContractsCommand),
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Browse every fungible token
    Ft(FtArgs),
    /// Holders of one token, optionally as of a block height
    Holders(HoldersArgs),
    /// Holder balances of one token at two block heights
    Compare(CompareArgs),
}

#[derive(Args, Debug, Default)]
pub struct FtArgs {
    /// First block height for the holder compare action.
    #[arg(long, value_name = "HEIGHT", requires = "second")]
    pub first: Option<u64>,

    #[arg(long, value_name = "HEIGHT", requires = "first")]
    pub second: Option<u64>,
}

impl FtArgs {
    pub fn compare_heights(&self) -> Option<(u64, u64)> {
        self.first.zip(self.second)
    }
}

#[derive(Args, Debug)]
pub struct HoldersArgs {
    #[arg(short, long, value_name = "CONTRACT_ID")]
    pub contract: String,

    /// Balances as of this block height; 0 means latest.
    #[arg(short = 'b', long, value_name = "HEIGHT")]
    pub until_block: Option<u64>,

    #[arg(short, long, default_value_t = 0)]
    pub decimals: u32,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[arg(short, long, value_name = "CONTRACT_ID")]
    pub contract: String,

    #[arg(short, long, value_name = "HEIGHT")]
    pub first: u64,

    #[arg(short, long, value_name = "HEIGHT")]
    pub second: u64,

    #[arg(short, long, default_value_t = 0)]
    pub decimals: u32,
}

#[derive(Subcommand, Debug)]
pub enum TransactionsCommand {
    View { principal: String },
    /// Merge every transaction into `{principal}_transactions.json`
    Sync {
        /// Defaults to every configured wallet.
        principal: Option<String>,
        /// Snapshot directory; defaults to the configured export directory.
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NamesCommand {
    View,
    /// Owner of one BNS name
    Lookup {
        #[arg(short, long)]
        name: String,
    },
    /// Write every BNS name to a file
    Sync {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = SyncFormat::Json)]
        format: SyncFormat,
    },
}

#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    Balance {
        #[arg(short, long)]
        principal: String,
    },
    /// Balances summed over every configured wallet
    Balances,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncFormat {
    Json,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum BobCommand {
    Tokens,
}

#[derive(Subcommand, Debug)]
pub enum ContractsCommand {
    /// Print the Clarity source of a contract
    Source {
        #[arg(short, long, value_name = "CONTRACT_ID")]
        contract: String,

        /// Write the source to this file instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Print deployment details of a contract as JSON
    Details {
        #[arg(short, long, value_name = "CONTRACT_ID")]
        contract: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    /// Point hiro, ord or bob at another base URL
    SetEndpoint { name: String, url: String },
    AddWallet { principal: String },
    RemoveWallet { principal: String },
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_ft_with_heights() {
        let cli = Cli::try_parse_from(["teller", "token", "ft", "--first", "100", "--second", "200"])
            .unwrap();
        let Commands::Token(TokenCommand::Ft(args)) = cli.command else {
            panic!("expected token ft");
        };
        assert_eq!(args.compare_heights(), Some((100, 200)));
    }

    #[test]
    fn test_ft_heights_come_in_pairs() {
        assert!(Cli::try_parse_from(["teller", "token", "ft", "--first", "100"]).is_err());
    }

    #[test]
    fn test_parse_holders() {
        let cli = Cli::try_parse_from(["teller", "token", "holders", "-c", "SP1.alex", "-b", "42"])
            .unwrap();
        let Commands::Token(TokenCommand::Holders(args)) = cli.command else {
            panic!("expected token holders");
        };
        assert_eq!(args.contract, "SP1.alex");
        assert_eq!(args.until_block, Some(42));
        assert_eq!(args.decimals, 0);
    }

    #[test]
    fn test_parse_names_sync_csv() {
        let cli = Cli::try_parse_from([
            "teller", "names", "sync", "--file", "names.csv", "--format", "csv",
        ])
        .unwrap();
        let Commands::Names(NamesCommand::Sync { file, format }) = cli.command else {
            panic!("expected names sync");
        };
        assert_eq!(file, PathBuf::from("names.csv"));
        assert_eq!(format, SyncFormat::Csv);
    }

    #[test]
    fn test_parse_wallet_and_lookup() {
        let cli = Cli::try_parse_from(["teller", "wallet", "balance", "-p", "SP1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Wallet(WalletCommand::Balance { principal }) if principal == "SP1"
        ));

        let cli = Cli::try_parse_from(["teller", "wallet", "balances"]).unwrap();
        assert!(matches!(cli.command, Commands::Wallet(WalletCommand::Balances)));

        let cli = Cli::try_parse_from(["teller", "names", "lookup", "-n", "muneeb.btc"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Names(NamesCommand::Lookup { name }) if name == "muneeb.btc"
        ));
        assert!(Cli::try_parse_from(["teller", "names", "lookup"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["teller", "runes", "--config", "/tmp/t.toml", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
        assert!(matches!(cli.command, Commands::Runes));
    }
}

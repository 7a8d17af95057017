use teller::api::bob::BobTokens;
use teller::api::hiro::{AddressTransactions, FungibleTokens, HiroClient, Names};
use teller::api::ord::Runes;
use teller::app::Browser;
use teller::api::NameRecord;
use teller::cli::{
    BobCommand, Cli, Commands, ConfigCommand, ContractsCommand, NamesCommand, SyncFormat,
    TokenCommand, TransactionsCommand, WalletCommand,
};
use teller::config::Config;
use teller::export::{self, ExportFormat};
use teller::fetch::Fetcher;
use teller::project::{
    BalanceProjector, BobTokenProjector, CompareProjector, HolderProjector, NameProjector,
    Projector, RuneProjector, TokenProjector, TransactionProjector,
};
use teller::store::{transactions_key, SnapshotStore};
use teller::tui::{self, load_cursor, load_offset, Services};

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = cli.load_config()?;

    run(cli.command, config).await
}

/// The TUI owns the terminal, so logs go to `teller.log` in the cache directory.
fn init_logging(verbose: bool) -> Result<()> {
    let dir = dirs::cache_dir()
        .map(|p| p.join("teller"))
        .context("Could not determine cache directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {dir:?}"))?;

    let path = dir.join("teller.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {path:?}"))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

async fn run(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Token(command) => run_token(command, &config).await,
        Commands::Transactions(command) => run_transactions(command, &config).await,
        Commands::Names(command) => run_names(command, &config).await,
        Commands::Wallet(command) => run_wallet(command, &config).await,
        Commands::Runes => {
            let services = services(&config)?;
            let fetcher = services.fetcher();
            let source = Runes::new(&config.endpoints.ord)?;
            let browser = browser(&RuneProjector, "Runes", "runes", &config);
            tui::run(browser, services, load_cursor(fetcher, source, RuneProjector)).await
        }
        Commands::Bob(BobCommand::Tokens) => {
            let services = services(&config)?;
            let fetcher = services.fetcher();
            let source = BobTokens::new(&config.endpoints.bob)?;
            let browser = browser(&BobTokenProjector, "BOB tokens", "bob-tokens", &config);
            tui::run(browser, services, load_cursor(fetcher, source, BobTokenProjector)).await
        }
        Commands::Contracts(ContractsCommand::Source { contract, out }) => {
            let client = HiroClient::new(&config.endpoints.hiro)?;
            let source = client
                .contract_source(&contract)
                .await
                .with_context(|| format!("Failed to fetch source of {contract}"))?;
            match out {
                Some(path) => {
                    std::fs::write(&path, source)
                        .with_context(|| format!("Failed to write {path:?}"))?;
                    println!("Saved {}", path.display());
                }
                None => println!("{source}"),
            }
            Ok(())
        }
        Commands::Contracts(ContractsCommand::Details { contract }) => {
            let client = HiroClient::new(&config.endpoints.hiro)?;
            let details = client
                .contract_details(&contract)
                .await
                .with_context(|| format!("Failed to fetch details of {contract}"))?;
            println!("{}", serde_json::to_string_pretty(&details)?);
            Ok(())
        }
        Commands::Config(command) => run_config(command, &mut config),
    }
}

async fn run_token(command: TokenCommand, config: &Config) -> Result<()> {
    let services = services(config)?;
    let client = services.hiro.clone();

    match command {
        TokenCommand::Ft(args) => {
            let browser = browser(&TokenProjector, "Fungible tokens", "tokens", config)
                .with_compare_heights(args.compare_heights());
            let source = FungibleTokens::new(client);
            let fetcher = services.fetcher();
            tui::run(browser, services, load_offset(fetcher, source, TokenProjector)).await
        }
        TokenCommand::Holders(args) => {
            let projector = HolderProjector {
                decimals: args.decimals,
            };
            let title = format!("Holders of {}", args.contract);
            let stem = format!("{}-holders", args.contract);
            let browser = browser(&projector, title, stem, config);
            let request = services.guarded(async move {
                client.holders(&args.contract, args.until_block).await
            });
            let load = async move {
                request
                    .await
                    .map(|holders| projector.project_all(&holders))
                    .map_err(|e| e.to_string())
            };
            tui::run(browser, services, load).await
        }
        TokenCommand::Compare(args) => {
            let projector = CompareProjector {
                decimals: args.decimals,
            };
            let title = format!(
                "{} holders at {} vs {}",
                args.contract, args.first, args.second
            );
            let stem = format!("{}-compare-{}-{}", args.contract, args.first, args.second);
            let browser = browser(&projector, title, stem, config);
            let request = services.guarded(async move {
                tui::compare_rows(&client, &args.contract, args.first, args.second, args.decimals)
                    .await
            });
            let load = async move { request.await.map_err(|e| e.to_string()) };
            tui::run(browser, services, load).await
        }
    }
}

async fn run_transactions(command: TransactionsCommand, config: &Config) -> Result<()> {
    match command {
        TransactionsCommand::View { principal } => {
            let services = services(config)?;
            let fetcher = services.fetcher();
            let stem = transactions_key(&principal);
            let title = format!("Transactions of {principal}");
            let browser = browser(&TransactionProjector, title, stem, config);
            let source = AddressTransactions::new(services.hiro.clone(), principal);
            tui::run(browser, services, load_offset(fetcher, source, TransactionProjector)).await
        }
        TransactionsCommand::Sync { principal, dir } => {
            let principals = match principal {
                Some(principal) => vec![principal],
                None if config.wallets.is_empty() => {
                    bail!("No principal given and no wallets configured (see `teller config add-wallet`)")
                }
                None => config.wallets.clone(),
            };
            let store = SnapshotStore::new(dir.unwrap_or_else(|| config.export_dir()));
            let client = HiroClient::new(&config.endpoints.hiro)?;

            for principal in principals {
                let source = AddressTransactions::new(client.clone(), principal.clone());
                let fetched = Fetcher::new(config.fetch_options())
                    .fetch_offset(&source)
                    .await
                    .with_context(|| format!("Failed to fetch transactions of {principal}"))?;
                let report = store
                    .sync(&transactions_key(&principal), fetched.into_records())
                    .with_context(|| format!("Failed to sync transactions of {principal}"))?;
                println!(
                    "{principal}: {} existing, {} added, {} total -> {}",
                    report.existing,
                    report.added,
                    report.total,
                    report.path.display()
                );
            }
            Ok(())
        }
    }
}

async fn run_names(command: NamesCommand, config: &Config) -> Result<()> {
    let services = services(config)?;
    let source = Names::new(services.hiro.clone());

    match command {
        NamesCommand::View => {
            let browser = browser(&NameProjector, "BNS names", "names", config);
            let fetcher = services.fetcher();
            tui::run(browser, services, load_offset(fetcher, source, NameProjector)).await
        }
        NamesCommand::Lookup { name } => {
            let client = services.hiro.clone();
            let browser = browser(&NameProjector, format!("BNS name {name}"), name.clone(), config);
            let request = services.guarded(async move {
                let details = client.name_details(&name).await?;
                Ok::<_, teller::Error>(NameRecord {
                    name,
                    address: details.address,
                    expire_block: details.expire_block,
                    registered_at: None,
                })
            });
            let load = async move {
                request
                    .await
                    .map(|record| NameProjector.project_all(&[record]))
                    .map_err(|e| e.to_string())
            };
            tui::run(browser, services, load).await
        }
        NamesCommand::Sync { file, format } => {
            let mut fetcher = services.fetcher();
            let names = fetcher
                .fetch_offset(&source)
                .await
                .context("Failed to fetch names")?
                .into_records();
            info!(names = names.len(), path = %file.display(), "names fetched");

            match format {
                SyncFormat::Json => {
                    let (dir, key) = snapshot_location(&file)?;
                    let report = SnapshotStore::new(dir).sync(&key, names)?;
                    println!(
                        "{} existing, {} added, {} total -> {}",
                        report.existing,
                        report.added,
                        report.total,
                        report.path.display()
                    );
                }
                SyncFormat::Csv => {
                    let rows: Vec<Vec<String>> = NameProjector
                        .project_all(&names)
                        .into_iter()
                        .map(|row| row.cells)
                        .collect();
                    export::export(
                        NameProjector.headers(),
                        &rows,
                        &file,
                        ExportFormat::CsvWithHeader,
                    )?;
                    println!("Wrote {} names to {}", rows.len(), file.display());
                }
            }
            Ok(())
        }
    }
}

async fn run_wallet(command: WalletCommand, config: &Config) -> Result<()> {
    let (principals, title, stem) = match command {
        WalletCommand::Balance { principal } => (
            vec![principal.clone()],
            format!("Balances of {principal}"),
            format!("{principal}_balances"),
        ),
        WalletCommand::Balances => {
            if config.wallets.is_empty() {
                bail!("No wallets configured (see `teller config add-wallet`)");
            }
            (
                config.wallets.clone(),
                format!("Balances of {} wallets", config.wallets.len()),
                "balances".to_string(),
            )
        }
    };

    let services = services(config)?;
    let client = services.hiro.clone();
    let width = services.options.width;
    let browser = browser(&BalanceProjector, title, stem, config);
    let request = services.guarded(async move {
        tui::balance_rows(&client, &principals, width).await
    });
    let load = async move { request.await.map_err(|e| e.to_string()) };
    tui::run(browser, services, load).await
}

fn run_config(command: ConfigCommand, config: &mut Config) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            if let Some(path) = config.path() {
                println!("# {}", path.display());
            }
            print!(
                "{}",
                toml::to_string_pretty(config).context("Failed to serialize config")?
            );
        }
        ConfigCommand::SetEndpoint { name, url } => {
            config.set_endpoint(&name, url)?;
            println!("Updated {name} endpoint");
        }
        ConfigCommand::AddWallet { principal } => {
            config.add_wallet(principal.clone())?;
            println!("Added wallet {principal}");
        }
        ConfigCommand::RemoveWallet { principal } => {
            config.remove_wallet(&principal)?;
            println!("Removed wallet {principal}");
        }
    }
    Ok(())
}

/// Shared Hiro client, fetch options and the session's cancel token.
fn services(config: &Config) -> Result<Services> {
    let hiro = HiroClient::new(&config.endpoints.hiro)?;
    Ok(Services::new(hiro, config.fetch_options()))
}

fn browser<P: Projector>(
    projector: &P,
    title: impl Into<String>,
    stem: impl Into<String>,
    config: &Config,
) -> Browser {
    Browser::for_projector(projector, title, stem).with_export_dir(config.export_dir())
}

/// `names.json` → (parent dir, `names`), matching the store's `{key}.json` layout.
fn snapshot_location(file: &Path) -> Result<(std::path::PathBuf, String)> {
    if file.extension().and_then(|e| e.to_str()) != Some("json") {
        bail!("JSON snapshots must end in .json: {}", file.display());
    }
    let key = file
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Snapshot file needs a name")?
        .to_string();
    let dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ".".into());
    Ok((dir, key))
}

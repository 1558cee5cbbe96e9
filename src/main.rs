use cardano_signer::{
    KeyMaterial, MasterKeyScheme, PathSpec, Signer, SignerError, SignerResult,
    SignerSettings,
};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use zeroize::Zeroizing;

const MNEMONIC_ENV: &str = "CARDANO_SIGNER_MNEMONIC";
const BECH32_ENV: &str = "CARDANO_SIGNER_BECH32";

#[derive(Parser)]
#[command(name = "cardano-signer", version, about = "Add a vkey witness to a Cardano transaction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a transaction and print the signed hex
    Sign(SignArgs),
    /// Print the verification key a key source resolves to
    Pubkey(PubkeyArgs),
}

#[derive(Args)]
struct KeySourceArgs {
    /// File holding a BIP-39 mnemonic (or set CARDANO_SIGNER_MNEMONIC)
    #[arg(long, conflicts_with_all = ["bech32_file", "skey_file"])]
    mnemonic_file: Option<PathBuf>,

    /// Name of the environment variable holding the mnemonic passphrase
    #[arg(long)]
    passphrase_env: Option<String>,

    /// File holding a bech32 extended signing key (or set CARDANO_SIGNER_BECH32)
    #[arg(long, conflicts_with = "skey_file")]
    bech32_file: Option<PathBuf>,

    /// Signing key file: cardano-cli text envelope or hex
    #[arg(long)]
    skey_file: Option<PathBuf>,

    /// Master key scheme for mnemonics (icarus or ledger)
    #[arg(long)]
    master_key: Option<MasterKeyScheme>,
}

#[derive(Args)]
struct PathArgs {
    /// Derivation path, e.g. m/1852'/1815'/0'/0/0
    #[arg(long, conflicts_with_all = ["account", "index"])]
    path: Option<String>,

    /// Account number (legacy form, with --index)
    #[arg(long, requires = "index")]
    account: Option<u32>,

    /// Key index on the external chain (legacy form, with --account)
    #[arg(long, requires = "account")]
    index: Option<u32>,
}

#[derive(Args)]
struct SignArgs {
    #[command(flatten)]
    key: KeySourceArgs,

    #[command(flatten)]
    path: PathArgs,

    /// Unsigned transaction hex
    #[arg(long, conflicts_with = "tx_file")]
    tx: Option<String>,

    /// File holding the unsigned transaction hex (stdin when neither is given)
    #[arg(long)]
    tx_file: Option<PathBuf>,

    /// Emit new witness lists without the set tag (pre-Conway tooling)
    #[arg(long)]
    legacy: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PubkeyArgs {
    #[command(flatten)]
    key: KeySourceArgs,

    #[command(flatten)]
    path: PathArgs,

    /// Print the key, key hash and path as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> SignerResult<String> {
    match cli.command {
        Commands::Sign(args) => {
            let mut settings = SignerSettings::from_env()?;
            if args.legacy {
                settings.tag_new_witness_sets = false;
            }
            let signer = build_signer(settings, &args.key);
            let material = read_key_material(&args.key)?;
            let path = path_spec(&args.path, &material);
            let tx_hex = read_transaction(args.tx, args.tx_file.as_deref())?;

            let signed = signer.sign(&material, path, &tx_hex)?;
            if args.json {
                Ok(serde_json::to_string_pretty(&signed)?)
            } else {
                Ok(signed.tx_hex)
            }
        }
        Commands::Pubkey(args) => {
            let signer = build_signer(SignerSettings::from_env()?, &args.key);
            let material = read_key_material(&args.key)?;
            let path = path_spec(&args.path, &material);

            let info = signer.public_key(&material, path)?;
            if args.json {
                Ok(serde_json::to_string_pretty(&info)?)
            } else {
                Ok(info.public_key)
            }
        }
    }
}

fn build_signer(mut settings: SignerSettings, key: &KeySourceArgs) -> Signer {
    if let Some(scheme) = key.master_key {
        settings.master_key_scheme = scheme;
    }
    for warning in settings.validate() {
        cardano_signer::log_warn!("cli", warning);
    }
    Signer::new(settings)
}

fn read_key_material(args: &KeySourceArgs) -> SignerResult<KeyMaterial> {
    if let Some(path) = &args.skey_file {
        let text = read_secret_file(path)?;
        return Ok(KeyMaterial::raw_text(&text));
    }

    if let Some(path) = &args.bech32_file {
        let text = read_secret_file(path)?;
        return Ok(KeyMaterial::bech32(&text));
    }

    let phrase = match &args.mnemonic_file {
        Some(path) => Some(read_secret_file(path)?),
        None => std::env::var(MNEMONIC_ENV).ok().map(Zeroizing::new),
    };
    if let Some(phrase) = phrase {
        let passphrase = match &args.passphrase_env {
            Some(name) => Zeroizing::new(std::env::var(name).map_err(|_| {
                SignerError::invalid_input(format!("Passphrase variable {} is not set", name))
            })?),
            None => Zeroizing::new(String::new()),
        };
        return Ok(KeyMaterial::mnemonic(&phrase, &passphrase));
    }

    if let Ok(encoded) = std::env::var(BECH32_ENV) {
        let encoded = Zeroizing::new(encoded);
        return Ok(KeyMaterial::bech32(&encoded));
    }

    Err(SignerError::invalid_input("No key source given").with_details(format!(
        "use --mnemonic-file, --bech32-file, --skey-file, {} or {}",
        MNEMONIC_ENV, BECH32_ENV
    )))
}

fn path_spec(args: &PathArgs, material: &KeyMaterial) -> PathSpec {
    match (&args.path, args.account, args.index) {
        (Some(path), _, _) => PathSpec::from(path.as_str()),
        (None, Some(account), Some(index)) => PathSpec::from((account, index)),
        _ => material.default_path(),
    }
}

fn read_secret_file(path: &Path) -> SignerResult<Zeroizing<String>> {
    let text = fs::read_to_string(path).map_err(|e| {
        SignerError::invalid_input(format!("Cannot read {}", path.display())).with_details(e.to_string())
    })?;
    Ok(Zeroizing::new(text))
}

fn read_transaction(tx: Option<String>, tx_file: Option<&Path>) -> SignerResult<String> {
    if let Some(tx) = tx {
        return Ok(tx);
    }
    if let Some(path) = tx_file {
        return fs::read_to_string(path).map_err(|e| {
            SignerError::invalid_input(format!("Cannot read {}", path.display()))
                .with_details(e.to_string())
        });
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;

use mpw::algorithm::SiteType;
use mpw::catalog::Catalog;
use mpw::config;
use mpw::error::{DerivationError, DerivationErrorKind};
use mpw::secret::Secret;
use mpw::{derive, DerivationRequest};

const TYPE_HELP: &str = "The password's template (defaults to 'long')

x, max, maximum   20 characters, contains symbols.
l, long           Copy-friendly, 14 characters, contains symbols.
m, med, medium    Copy-friendly, 8 characters, contains symbols.
b, basic          8 characters, no symbols.
s, short          Copy-friendly, 4 characters, no symbols.
i, pin            4 numbers.
n, name           9 letter name.
p, phrase         20 character sentence.";

/// A stateless password management solution.
#[derive(Parser, Debug)]
#[command(name = "Master Password", about = "A stateless password management solution.")]
struct Cli {
    /// The site to derive a password for.
    site_name: String,

    /// The full name of the user.
    #[arg(short = 'u', long = "user", env = "MP_USERNAME")]
    user: Option<String>,

    /// The password's template.
    #[arg(
        short = 't',
        long = "type",
        env = "MP_SITETYPE",
        help = TYPE_HELP,
        value_parser = [
            "x", "max", "maximum",
            "l", "long",
            "m", "med", "medium",
            "b", "basic",
            "s", "short",
            "i", "pin",
            "n", "name",
            "p", "phrase",
        ]
    )]
    site_type: Option<String>,

    /// The value of the site counter.
    #[arg(short = 'c', long = "counter", env = "MP_SITECOUNTER", default_value_t = 1)]
    counter: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(password) => {
            println!("{password}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, DerivationError> {
    let user_name = cli
        .user
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DerivationError::new(DerivationErrorKind::MissingUser, "missing user name"))?;

    let site_type = cli
        .site_type
        .as_deref()
        .map(|tag| {
            SiteType::from_str(tag).ok_or_else(|| {
                DerivationError::new(
                    DerivationErrorKind::UnknownType,
                    format!("unknown password type: {tag}"),
                )
            })
        })
        .transpose()?
        .unwrap_or_default();

    let master_password = resolve_master_password(&user_name)?;

    let request = DerivationRequest::new(
        user_name,
        master_password,
        cli.site_name,
        cli.counter,
        site_type,
    )?;

    let catalog = Catalog::default_catalog();
    derive(request, &catalog)
}

/// Find the master password in `$HOME/.mpw`, falling back to an
/// interactive, echo-suppressed prompt if there is no matching entry.
fn resolve_master_password(user_name: &str) -> Result<Secret<String>, DerivationError> {
    if let Some(path) = config::config_path() {
        if let Some(password) = config::load_master_password(&path, user_name)? {
            return Ok(password);
        }
    }

    if !std::io::stdin().is_terminal() {
        return Err(DerivationError::new(
            DerivationErrorKind::DerivationFailed,
            format!("missing master password for user: {user_name}"),
        ));
    }

    let prompt = format!("Master password for {user_name}: ");
    let password = rpassword::prompt_password(prompt).map_err(|e| {
        DerivationError::new(
            DerivationErrorKind::DerivationFailed,
            format!("couldn't read master password: {e}"),
        )
    })?;
    Ok(Secret::new(password))
}

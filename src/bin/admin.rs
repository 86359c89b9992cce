use std::collections::VecDeque;

use chrono::Utc;

use rejs::auth::{ApiKeyValidator, StaffKeyRecord};
use rejs::crypto::generate_key;
use rejs::infra::sqlite::StaffKeys;
use rejs::infra::{Database, FieldEncryption};
use rejs::services::{load_sample_data, SensitiveDataService, DEFAULT_RETENTION_DAYS};

fn print_help() {
    eprintln!(
        "\
rejs-admin

USAGE:
  rejs-admin <command> [options]

COMMANDS:
  migrate                         Run database migrations
  load-sample-data                Insert demo trips, watches and registrations
  create-staff-key                Create an API key for the staff API
  revoke-staff-key                Deactivate a staff API key
  purge-sensitive-data            Delete supplementary data of finished trips
  reencrypt-sensitive-data        Re-encrypt supplementary data with the current key
  generate-key                    Print a new random field encryption key

COMMON OPTIONS:
  --database-url <sqlite_url>     (defaults to env DATABASE_URL)

create-staff-key OPTIONS:
  --username <name>               (required)

revoke-staff-key OPTIONS:
  --key <rz_...>                  (required)

purge-sensitive-data OPTIONS:
  --retention-days <n>            (default: env SENSITIVE_DATA_RETENTION_DAYS or 30)
  --dry-run

reencrypt-sensitive-data OPTIONS:
  --dry-run

ENV (encryption at rest):
  FIELD_ENCRYPTION_KEYS / FIELD_ENCRYPTION_KEY
"
    );
}

fn require_database_url(database_url: Option<String>) -> anyhow::Result<String> {
    database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required (or pass --database-url)"))
}

fn take_value(args: &mut VecDeque<String>, flag: &str) -> anyhow::Result<String> {
    args.pop_front()
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

/// Options shared by every command plus the command's own flags.
#[derive(Debug, Default)]
struct Options {
    database_url: Option<String>,
    username: Option<String>,
    key: Option<String>,
    retention_days: Option<i64>,
    dry_run: bool,
    help: bool,
}

fn parse_options(mut args: VecDeque<String>, allowed: &[&str]) -> anyhow::Result<Options> {
    let mut options = Options::default();
    while let Some(arg) = args.pop_front() {
        if arg.starts_with("--") && arg != "--help" && !allowed.contains(&arg.as_str()) {
            anyhow::bail!("unexpected argument: {arg}");
        }
        match arg.as_str() {
            "--database-url" => options.database_url = Some(take_value(&mut args, &arg)?),
            "--username" => options.username = Some(take_value(&mut args, &arg)?),
            "--key" => options.key = Some(take_value(&mut args, &arg)?),
            "--retention-days" => {
                let raw = take_value(&mut args, &arg)?;
                let days: i64 = raw.parse()?;
                if days < 0 {
                    anyhow::bail!("--retention-days must not be negative");
                }
                options.retention_days = Some(days);
            }
            "--dry-run" => options.dry_run = true,
            "-h" | "--help" => options.help = true,
            other => anyhow::bail!("unexpected argument: {other}"),
        }
    }
    Ok(options)
}

async fn open_database(database_url: Option<String>) -> anyhow::Result<Database> {
    let database_url = require_database_url(database_url)?;
    let db = Database::connect(&database_url, 5).await?;
    db.migrate().await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    match command.as_str() {
        "migrate" => {
            let options = parse_options(args, &["--database-url"])?;
            if options.help {
                print_help();
                return Ok(());
            }

            open_database(options.database_url).await?;
            println!("ok: migrations applied");
            Ok(())
        }
        "load-sample-data" => {
            let options = parse_options(args, &["--database-url"])?;
            if options.help {
                print_help();
                return Ok(());
            }

            let db = open_database(options.database_url).await?;
            let summary = load_sample_data(&db, Utc::now().date_naive()).await?;
            println!(
                "ok: {} future trips, {} past trips, {} registrations, {} payments, {} announcements",
                summary.future_trips,
                summary.past_trips,
                summary.registrations,
                summary.payments,
                summary.announcements
            );
            Ok(())
        }
        "create-staff-key" => {
            let options = parse_options(args, &["--database-url", "--username"])?;
            if options.help {
                print_help();
                return Ok(());
            }
            let username = options
                .username
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("--username is required"))?;

            let db = open_database(options.database_url).await?;
            let (key, key_hash) = ApiKeyValidator::generate_key();
            let mut conn = db.acquire().await?;
            StaffKeys::new(&mut conn)
                .insert(&StaffKeyRecord::new(key_hash, username.trim()))
                .await?;

            println!("ok: staff key created for {}", username.trim());
            println!("{key}");
            eprintln!("store this key now; it cannot be shown again");
            Ok(())
        }
        "purge-sensitive-data" => {
            let options =
                parse_options(args, &["--database-url", "--retention-days", "--dry-run"])?;
            if options.help {
                print_help();
                return Ok(());
            }
            let retention_days = match options.retention_days {
                Some(days) => days,
                None => std::env::var("SENSITIVE_DATA_RETENTION_DAYS")
                    .ok()
                    .map(|v| v.trim().parse::<i64>())
                    .transpose()?
                    .unwrap_or(DEFAULT_RETENTION_DAYS),
            };

            let db = open_database(options.database_url).await?;
            let service = SensitiveDataService::new(db, FieldEncryption::from_env()?);
            let report = service
                .purge_expired(Utc::now().date_naive(), retention_days, options.dry_run)
                .await?;

            let verb = if report.dry_run { "would delete" } else { "deleted" };
            println!(
                "ok: {verb} supplementary data of {} registrations (trips ended before {})",
                report.purged.len(),
                report.cutoff
            );
            for id in &report.purged {
                println!("  registration {id}");
            }
            Ok(())
        }
        "reencrypt-sensitive-data" => {
            let options = parse_options(args, &["--database-url", "--dry-run"])?;
            if options.help {
                print_help();
                return Ok(());
            }

            let db = open_database(options.database_url).await?;
            let encryption = FieldEncryption::from_env()?;
            if encryption.key_count() < 2 {
                eprintln!("warning: only one key configured; nothing can be rotated away from");
            }
            let service = SensitiveDataService::new(db, encryption);
            let report = service.reencrypt_all(options.dry_run).await?;

            println!(
                "ok: scanned={} {}={} skipped_current_key={}",
                report.scanned,
                if options.dry_run { "would_update" } else { "updated" },
                report.updated,
                report.skipped_current_key
            );
            Ok(())
        }
        "revoke-staff-key" => {
            let options = parse_options(args, &["--database-url", "--key"])?;
            if options.help {
                print_help();
                return Ok(());
            }
            let key = options
                .key
                .ok_or_else(|| anyhow::anyhow!("--key is required"))?;

            let db = open_database(options.database_url).await?;
            let mut conn = db.acquire().await?;
            let revoked = StaffKeys::new(&mut conn)
                .revoke(&ApiKeyValidator::hash_key(key.trim()))
                .await?;
            if !revoked {
                anyhow::bail!("no such staff key");
            }
            println!("ok: staff key revoked");
            Ok(())
        }
        "generate-key" => {
            let options = parse_options(args, &[])?;
            if options.help {
                print_help();
                return Ok(());
            }
            println!("{}", hex::encode(generate_key()));
            Ok(())
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}")
        }
    }
}

use std::{path::Path, time::Duration};

use tracing::{error, info, span, Level};

use ossdisk::{config, disk, model};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().json().init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let matches = clap::Command::new("ossdisk")
        .arg(clap::Arg::new("CONFIG").required(true).index(1))
        .arg(clap::Arg::new("COMMAND").required(true).index(2))
        .arg(clap::Arg::new("PATH").index(3))
        .arg(clap::Arg::new("DEST").index(4))
        .arg(
            clap::Arg::new("RECURSIVE")
                .long("recursive")
                .short('r')
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("CONFIG").unwrap();
    let command = matches.get_one::<String>("COMMAND").unwrap();
    let path = matches
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("");
    let dest = matches.get_one::<String>("DEST").map(String::as_str);
    let recursive = matches.get_flag("RECURSIVE");
    info!(command = command, path = path, "args");

    let config = match config::DiskConfig::from_file(Path::new(config_path)) {
        Err(err) => {
            error!(error_message=%err, error_group="load_config");
            std::process::exit(1);
        }
        Ok(config) => config,
    };

    let disk = disk::OssDisk::from_config(&config);

    match disk.bucket_exists() {
        Err(err) => {
            error!(error_message=%err, error_group="head_bucket");
            std::process::exit(1);
        }
        Ok(false) => {
            error!(
                error_message = "bucket not found",
                error_group = "head_bucket",
                bucket = config.bucket
            );
            std::process::exit(1);
        }
        Ok(true) => {}
    }

    if let Err(err) = run(&disk, command, path, dest, recursive) {
        error!(error_message=%err, error_group="run_command");
        std::process::exit(1);
    }
}

fn run(
    disk: &disk::OssDisk,
    command: &str,
    path: &str,
    dest: Option<&str>,
    recursive: bool,
) -> model::error::Result<()> {
    match command {
        "ls" => {
            let entries = disk.list_contents(path, recursive)?;
            for entry in entries {
                match entry.kind {
                    model::entry::EntryKind::Directory => println!("{}/", entry.path),
                    model::entry::EntryKind::File => {
                        println!("{}\t{}", entry.path, entry.size.unwrap_or(0))
                    }
                }
            }
        }
        "cat" => {
            let bytes = disk.read(path)?;
            print!("{}", String::from_utf8_lossy(&bytes));
        }
        "put" => {
            let dest = require_dest(dest);
            let bytes = match std::fs::read(path) {
                Err(err) => {
                    error!(error_message=%err, error_group="read_local_file");
                    std::process::exit(1);
                }
                Ok(bytes) => bytes,
            };

            disk.write(dest, &bytes)?;
        }
        "rm" => disk.delete(path)?,
        "rmdir" => disk.delete_dir(path)?,
        "mkdir" => disk.create_dir(path)?,
        "cp" => disk.copy(path, require_dest(dest))?,
        "mv" => disk.rename(path, require_dest(dest))?,
        "stat" => {
            let entry = disk.metadata(path)?;
            println!("{:#?}", entry);
        }
        "acl" => match dest {
            None => {
                let visibility = disk.visibility(path)?;
                println!("{}", visibility.as_str());
            }
            Some("public") => disk.set_visibility(path, model::entry::Visibility::Public)?,
            Some("private") => disk.set_visibility(path, model::entry::Visibility::Private)?,
            Some(other) => {
                error!(
                    error_message = "unknown visibility",
                    error_group = "args",
                    visibility = other
                );
                std::process::exit(2);
            }
        },
        "url" => {
            let url = disk.signed_url(path, Duration::from_secs(disk::DEFAULT_SIGN_TTL_SECS))?;
            println!("{}", url);
        }
        other => {
            error!(
                error_message = "unknown command",
                error_group = "args",
                command = other
            );
            std::process::exit(2);
        }
    }

    Ok(())
}

fn require_dest<'a>(dest: Option<&'a str>) -> &'a str {
    match dest {
        None => {
            error!(error_message = "missing destination argument", error_group = "args");
            std::process::exit(2);
        }
        Some(dest) => dest,
    }
}

// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use clap::{Parser, Subcommand};
use filestore::{FileStore, JsonConfigFile};
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "filestore")]
#[command(about = "Read, write and manage files on the configured storage driver")]
struct Args {
    /// JSON storage configuration, re-read for every operation
    #[arg(short, long, default_value = "filestore.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the configured driver is usable
    TestConnection,

    /// Print a file, or save it with --output
    Read {
        path: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a local file to `path`
    Write { path: String, source: PathBuf },

    /// Move a file
    Mv { old_path: String, new_path: String },

    /// Remove a file
    Rm { path: String },

    /// List the entries below a directory
    Ls {
        #[arg(default_value = "")]
        path: String,
    },

    /// Remove a directory recursively
    Rmdir { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("Using storage config={}", args.config.display());

    let store = FileStore::new(JsonConfigFile::new(&args.config));

    match args.command {
        Command::TestConnection => {
            store.test_connection().await?;
            println!("Connection OK");
        }
        Command::Read { path, output } => {
            let data = store.read_file(&path).await?;
            match output {
                Some(output) => {
                    tokio::fs::write(&output, &data).await?;
                    info!(
                        "Saved path={} to file={}, size={} bytes",
                        path,
                        output.display(),
                        data.len()
                    );
                }
                None => std::io::stdout().write_all(&data)?,
            }
        }
        Command::Write { path, source } => {
            let data = tokio::fs::read(&source).await?;
            store.write_file(&data, &path).await?;
            info!(
                "Wrote file={} to path={}, size={} bytes",
                source.display(),
                path,
                data.len()
            );
        }
        Command::Mv { old_path, new_path } => {
            store.move_file(&old_path, &new_path).await?;
        }
        Command::Rm { path } => {
            store.remove_file(&path).await?;
        }
        Command::Ls { path } => {
            for entry in store.list_directory(&path).await? {
                println!("{}", entry);
            }
        }
        Command::Rmdir { path } => {
            store.remove_directory(&path).await?;
        }
    }

    Ok(())
}

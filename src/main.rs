use anyhow::Result;
use dotenvy::dotenv;

use solsentry::cli::{Interrupted, RootCommand};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    match RootCommand::execute().await {
        Err(e) if e.is::<Interrupted>() => {
            eprintln!("\nInterrupted by user");
            std::process::exit(130);
        }
        result => result,
    }
}

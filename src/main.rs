use clap::Parser;
use preletter::server::{run, ServeArgs};

#[tokio::main]
async fn main() {
    let args = ServeArgs::parse();
    if let Err(err) = run(args).await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

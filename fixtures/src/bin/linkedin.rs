use clap::Parser;
use fixtures::{linkedin, run_server, FixtureArgs};

/// Stub LinkedIn API fixture server
#[derive(Parser, Debug)]
#[clap(name = "linkedin-fixture")]
struct Cli {
    #[clap(flatten)]
    common: FixtureArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let base_url = format!("http://{}:{}", args.common.host, args.common.port);
    let app = linkedin::router(base_url);

    run_server(args.common, app).await
}

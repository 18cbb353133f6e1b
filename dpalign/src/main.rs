use clap::Parser;

mod align;

fn main() -> anyhow::Result<()> {
    align::cli(align::Cli::parse())
}

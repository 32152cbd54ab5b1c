use anyhow::Result;

fn main() -> Result<()> {
    konstruct::cli::run()
}

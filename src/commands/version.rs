use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("tubegrab version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

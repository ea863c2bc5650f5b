use anyhow::Result;

fn main() -> Result<()> {
    let spec = depozit::api::openapi();
    println!("{}", spec.to_pretty_json()?);
    Ok(())
}

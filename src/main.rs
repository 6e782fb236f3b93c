use anyhow::Context;
use log::debug;

use stream_gunzip::{extract::{self, ExtractConfig}, logger};

fn main() -> anyhow::Result<()> {
    logger::try_init()?;

    let config = ExtractConfig::default();

    let summary = extract::extract_with(&config)
        .with_context(|| format!("failed to extract {}", config.input_path.display()))?;

    if let Some(first) = summary.members.first() {
        debug!(
            "wrote {} bytes from {} member(s) (original name {:?}, modified {:?})",
            summary.decompressed_size(),
            summary.members.len(),
            first.header.filename,
            first.header.modification_time()
        );
    }

    println!("{}", extract::success_message(&config.input_path, &config.output_path));

    Ok(())
}

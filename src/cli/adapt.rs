use crate::cli::AdaptArgs;
use crate::transform::{rendered_word_count, transform_depth, transform_voice};
use tracing::info;

pub fn execute(args: AdaptArgs) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.file)?;
    let condensed = transform_depth(&content, args.depth);
    let adapted = transform_voice(&condensed, args.voice, None, args.content_type);
    info!(
        "Adapted {:?} to {}/{}: {} words",
        args.file,
        args.depth,
        args.voice,
        rendered_word_count(&adapted)
    );
    println!("{}", adapted);
    Ok(())
}

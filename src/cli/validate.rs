use crate::assessment;
use crate::cli::ValidateArgs;
use tracing::info;

pub fn execute(args: ValidateArgs) -> anyhow::Result<()> {
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&args.input)?)?;
    let report = assessment::preflight(&raw);

    if report.valid {
        info!("Submission {:?} passed pre-flight", args.input);
        println!("OK");
        Ok(())
    } else {
        println!("{} error(s):", report.errors.len());
        for e in &report.errors {
            println!("  - {}", e);
        }
        std::process::exit(1);
    }
}

use anyhow::Result;
use fileharvest::scanning::classify;

/// Print the category for each URL or extension
pub async fn classify_inputs(inputs: Vec<String>) -> Result<()> {
    let width = inputs.iter().map(|i| i.len()).max().unwrap_or(0);
    for input in &inputs {
        println!("{:<width$}  {}", input, classify(input), width = width);
    }
    Ok(())
}

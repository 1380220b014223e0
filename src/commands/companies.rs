//! List focal company choices and the benchmark rules the data supports

use anyhow::Result;
use serde_json::json;

use peerbench::config::Config;
use peerbench::peer;

pub fn execute(config: &Config, json: bool) -> Result<()> {
    let dataset = super::load_dataset(config)?;
    let companies = dataset.company_names();
    let rules = peer::available_rules(&dataset);

    if json {
        let output = json!({
            "companies": companies,
            "rules": rules.iter().map(|r| r.key()).collect::<Vec<_>>(),
            "words_available": dataset.columns().words,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "📋 {} companies in {}",
        companies.len(),
        config.data.path.display()
    );
    for name in &companies {
        println!("   {}", name);
    }
    println!();
    println!("Benchmark rules:");
    for rule in &rules {
        println!("   {:<12} {}", rule.key(), rule.label());
    }
    if !dataset.columns().words {
        println!("\n   (no words column, only page counts will be charted)");
    }
    Ok(())
}

use anyhow::Result;

use crate::config::Config;

/// Print configured brands and whether their files are present.
pub fn list_sources(config: &Config) -> Result<()> {
    if config.brands.is_empty() {
        println!("No brands configured. Add [brands.<name>] sections or pass --file to ingest.");
        return Ok(());
    }

    println!("{:<16} {:<20} {:<10} PATH", "BRAND", "NAME", "STATUS");
    for (brand, cfg) in &config.brands {
        let (status, path) = match &cfg.path {
            Some(p) if p.is_file() => ("OK", p.display().to_string()),
            Some(p) => ("MISSING", p.display().to_string()),
            None => ("NO PATH", "-".to_string()),
        };
        println!(
            "{:<16} {:<20} {:<10} {}",
            brand,
            config.brand_label(brand),
            status,
            path
        );
    }

    Ok(())
}

use crate::app::dumper::DumpResult;
use crate::app::models::{
    Classification, ConfigLayer, ConnectionProfile, ExcludeConfig, TableInfo,
};
use std::path::Path;

pub struct OutputGenerator;

/// Human-readable size with binary units, e.g. `1.5 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const SUFFIXES: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < SUFFIXES.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}", bytes as f64 / div as f64, SUFFIXES[exp])
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "  (none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("  - {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

impl OutputGenerator {
    pub fn generate_table_list(database: &str, tables: &[TableInfo]) -> String {
        let mut output = format!("Tables in database '{}':\n\n", database);
        output.push_str(&format!("{:<40} {:>12} {:>15}\n", "Table Name", "Size", "Rows"));
        output.push_str(&"-".repeat(69));
        output.push('\n');

        for table in tables {
            output.push_str(&format!(
                "{:<40} {:>12} {:>15}\n",
                table.name,
                format_bytes(table.total_size),
                table.row_count
            ));
        }

        output.push_str(&format!("\nTotal: {} tables", tables.len()));
        output
    }

    pub fn generate_dry_run(classification: &Classification, output_file: &Path) -> String {
        format!(
            "Dry run - would exclude data from {} of {} tables:\n{}\n\nWould create dump file: {}",
            classification.excluded.len(),
            classification.total(),
            bullet_list(&classification.excluded),
            output_file.display()
        )
    }

    /// Per-layer contributions followed by the merged result.
    pub fn generate_config_report(layers: &[ConfigLayer], effective: &ExcludeConfig) -> String {
        let mut blocks = Vec::new();

        if layers.is_empty() {
            blocks.push("No configuration layers loaded.".to_string());
        }
        for layer in layers {
            let config = layer.config();
            let header = match layer.name() {
                Some(name) => format!("{}: {}", layer.source(), name),
                None => layer.source().to_string(),
            };
            blocks.push(format!(
                "[{}]\nexact:\n{}\npatterns:\n{}",
                header,
                bullet_list(&config.exact),
                bullet_list(&config.patterns)
            ));
        }

        blocks.push(format!(
            "[effective]\nexact:\n{}\npatterns:\n{}",
            bullet_list(&effective.exact),
            bullet_list(&effective.patterns)
        ));

        blocks.join("\n\n")
    }

    pub fn generate_summary(result: &DumpResult) -> String {
        format!(
            "Dump complete\n  File:     {}\n  Size:     {}\n  Excluded: {} tables\n  Duration: {:.1}s",
            result.output_file.display(),
            format_bytes(result.file_size),
            result.excluded_tables.len(),
            result.duration.as_secs_f64()
        )
    }

    pub fn generate_profiles(profiles: &[ConnectionProfile]) -> String {
        if profiles.is_empty() {
            return "No saved profiles found".to_string();
        }

        let mut blocks = Vec::new();
        for profile in profiles {
            let mut block = format!(
                "  {}\n    Host: {}:{}",
                profile.name,
                profile.host.as_deref().unwrap_or("-"),
                profile
                    .port
                    .map_or_else(|| "-".to_string(), |p| p.to_string())
            );
            if let Some(user) = &profile.user {
                block.push_str(&format!("\n    User: {}", user));
            }
            if let Some(database) = &profile.database {
                block.push_str(&format!("\n    Database: {}", database));
            }
            blocks.push(block);
        }

        format!("Saved connection profiles:\n\n{}", blocks.join("\n\n"))
    }
}

//! Command implementations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tabcat_core::{
    assign_categories, encode_table, parse_csv, suggest_categories, CategorySet, CellFlag,
    EncodeBudget, TabcatConfig, Table, TextGenerator,
};

/// Read and parse a CSV file into a table.
pub fn read_table(path: &Path) -> Result<Table> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed = parse_csv(&text).with_context(|| format!("parsing {}", path.display()))?;
    Table::new(parsed.headers, parsed.rows)
        .with_context(|| format!("loading {}", path.display()))
}

/// Serialize a table and write it out. Export is not budget-limited.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let text = encode_table(table, &EncodeBudget::unbounded())
        .context("serializing categorized table")?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Build the vocabulary from a file (one label per line) or repeated
/// `--category` flags. The last label is the fallback.
pub fn read_categories(file: Option<&Path>, flags: &[String]) -> Result<CategorySet> {
    if let Some(path) = file {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        CategorySet::from_lines(&text)
            .with_context(|| format!("loading categories from {}", path.display()))
    } else if !flags.is_empty() {
        CategorySet::new(flags.to_vec()).context("loading categories from --category flags")
    } else {
        bail!("no categories given: use --categories-file or --category");
    }
}

/// Output path convention: `categorized_<input name>` beside the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("categorized_{name}"))
}

pub async fn suggest<G: TextGenerator>(
    gateway: &G,
    config: &TabcatConfig,
    file: &Path,
) -> Result<()> {
    let table = read_table(file)?;
    let set = suggest_categories(gateway, &table, config).await?;
    for label in set.labels() {
        println!("{label}");
    }
    Ok(())
}

pub async fn assign<G: TextGenerator>(
    gateway: &G,
    config: &TabcatConfig,
    file: &Path,
    categories: CategorySet,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let table = read_table(file)?;
    let result = assign_categories(gateway, &table, &categories, config).await?;

    for flag in &result.flags {
        match flag {
            CellFlag::UnknownCategory { row, value } => {
                eprintln!(
                    "row {}: category {:?} is not in the vocabulary",
                    row + 1,
                    value
                );
            }
            CellFlag::ContentDrift {
                row,
                column,
                expected,
                found,
            } => {
                eprintln!(
                    "row {}: column {} changed from {:?} to {:?}",
                    row + 1,
                    column,
                    expected,
                    found
                );
            }
        }
    }

    let output = output.unwrap_or_else(|| default_output_path(file));
    write_table(&result.table, &output)?;
    println!("wrote {}", output.display());
    Ok(output)
}

/// Offline sanity check: parse the file and encode it against the prompt
/// budget without calling the model.
pub fn check(config: &TabcatConfig, file: &Path) -> Result<()> {
    let table = read_table(file)?;
    let text = encode_table(&table, &config.budget())?;
    println!(
        "{}: {} rows, {} columns, {} characters encoded",
        file.display(),
        table.row_count(),
        table.column_count(),
        text.chars().count()
    );
    Ok(())
}

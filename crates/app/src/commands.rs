use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;

use reckon_core::recat::{recategorise, Resolver};
use reckon_core::reconcile::commit;
use reckon_core::{Mapping, Ruleset};
use reckon_import::{bom, categorise_statement, hsbc, nab, StatementRecord};
use reckon_storage::{pull_mapping, push_mapping, SheetsStore};

use crate::cli::{Cli, Command, MappingCommand, TargetSheet};
use crate::config::Settings;
use crate::prompt::PromptResolver;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load()?;

    match cli.command {
        Command::Credit { file } => {
            let records = hsbc::parse(open(&file)?)?;
            import(&settings, &records, hsbc::PROVIDER, hsbc::WORKSHEET)
        }
        Command::Current { file } => {
            let records = bom::parse(open(&file)?)?;
            import(&settings, &records, bom::PROVIDER, "offset")
        }
        Command::Nab { file } => {
            let records = nab::parse(open(&file)?)?;
            import(&settings, &records, nab::PROVIDER, nab::WORKSHEET)
        }
        Command::Recat { sheet, interactive } => recat(&settings, sheet, interactive),
        Command::Mapping { command } => mapping(&settings, command),
    }
}

fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file =
        File::open(path).with_context(|| format!("cannot open statement: {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn sheets_store(settings: &Settings) -> anyhow::Result<SheetsStore> {
    Ok(SheetsStore::new(&settings.spreadsheet_id, settings.token()?))
}

fn import(
    settings: &Settings,
    records: &[StatementRecord],
    provider: &str,
    worksheet: &str,
) -> anyhow::Result<()> {
    let mapping = Mapping::load(&settings.mapping_path)?;
    let ruleset = Ruleset::compile(&mapping);

    let batch = categorise_statement(records, &ruleset);
    let mut store = sheets_store(settings)?;
    let summary = commit(batch, provider, worksheet, &mut store)?;

    println!(
        "{provider} → {worksheet}: {} imported, {} new, {} total",
        summary.imported, summary.added, summary.total
    );
    Ok(())
}

fn recat(
    settings: &Settings,
    sheet: Option<TargetSheet>,
    interactive: bool,
) -> anyhow::Result<()> {
    let mut mapping = Mapping::load(&settings.mapping_path)?;
    let mut store = sheets_store(settings)?;

    let worksheets: Vec<&str> = match sheet {
        Some(target) => vec![target.worksheet()],
        None => vec!["credit", "offset"],
    };

    let mut resolver = interactive.then(PromptResolver::stdio);
    let mut mapping_changed = false;

    for worksheet in worksheets {
        let resolver = resolver.as_mut().map(|r| r as &mut dyn Resolver);
        let summary = recategorise(&mut store, worksheet, &mut mapping, resolver)?;
        mapping_changed |= summary.mapping_changed;
        println!(
            "{worksheet}: {} newly matched, {} resolved, {} rows",
            summary.newly_matched, summary.resolved, summary.total
        );
    }

    if mapping_changed {
        std::fs::write(&settings.mapping_path, mapping.to_yaml())
            .with_context(|| format!("cannot write {}", settings.mapping_path.display()))?;
        println!("mapping updated; run `reckon mapping push` to sync the sheet");
    }
    Ok(())
}

fn mapping(settings: &Settings, command: MappingCommand) -> anyhow::Result<()> {
    match command {
        MappingCommand::Push => {
            let mapping = Mapping::load(&settings.mapping_path)?;
            let mut store = sheets_store(settings)?;
            let rows = push_mapping(&mut store, &mapping)?;
            println!("pushed {rows} mapping rows");
        }
        MappingCommand::Pull => {
            let store = sheets_store(settings)?;
            let mapping = pull_mapping(&store)?;
            std::fs::write(&settings.mapping_path, mapping.to_yaml())
                .with_context(|| format!("cannot write {}", settings.mapping_path.display()))?;
            println!("pulled mapping into {}", settings.mapping_path.display());
        }
    }
    Ok(())
}

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use colored::Colorize;
use serde_json::json;

use rtsl_library::{read_library, scan, ShardHandle};
use rtsl_scene::BuiltinAssets;
use rtsl_sdk::{Codec, FsShardStore, SaveLoad, SaveLoadConfig, SdkError, World};
use rtsl_types::{FieldValue, Identity, Primitive, SurrogateRecord};

use crate::cli::*;
use crate::demo;

type Facade = SaveLoad<FsShardStore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => SaveLoadConfig::load(path)?,
        None => SaveLoadConfig::default(),
    };
    let store = FsShardStore::open(&cli.root)
        .with_context(|| format!("opening shard store at {}", cli.root.display()))?;
    let codec = Codec::with_builtin_surrogates().map_err(SdkError::from)?;
    let mut sl = SaveLoad::new(Arc::new(codec), store, config)?;
    let format = cli.format;

    match cli.command {
        Command::Ls(args) => cmd_ls(&sl, args, format),
        Command::Show(args) => cmd_show(&sl, args, format),
        Command::Verify(args) => cmd_verify(&sl, args, format),
        Command::Demo(args) => cmd_demo(&mut sl, args, format),
        Command::Load(args) => cmd_load(&mut sl, args, format),
    }
}

fn cmd_ls(sl: &Facade, args: LsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let folder = args.folder.unwrap_or_default();
    let mut shards = scan(sl.store(), &folder).map_err(SdkError::from)?;
    shards.sort_by_key(|(lib, _)| lib.ordinal);

    if format == OutputFormat::Json {
        let rows: Vec<_> = shards
            .iter()
            .map(|(lib, handle)| {
                let range = lib.identity_range();
                json!({
                    "key": handle.key,
                    "ordinal": handle.ordinal,
                    "records": handle.records,
                    "next_identity": lib.next_identity,
                    "first": range.map(|(a, _)| a.to_string()),
                    "last": range.map(|(_, b)| b.to_string()),
                    "checksum": handle.checksum,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if shards.is_empty() {
        println!("No shards.");
        return Ok(());
    }
    for (lib, handle) in &shards {
        let range = match lib.identity_range() {
            Some((a, b)) => format!("{a}..{b}"),
            None => "empty".into(),
        };
        println!(
            "{:>4}  {}  {} records  {}",
            handle.ordinal.to_string().yellow(),
            handle.key.bold(),
            handle.records,
            range.dimmed()
        );
    }
    Ok(())
}

fn cmd_show(sl: &Facade, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (library, handle) = read_library(sl.store(), &args.key)
        .map_err(SdkError::from)?
        .ok_or_else(|| anyhow!("shard not found: {}", args.key))?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&library)?);
        return Ok(());
    }

    println!(
        "{}  ordinal {}  next identity {}  {} records",
        handle.key.bold(),
        library.ordinal.to_string().yellow(),
        library.next_identity,
        library.len()
    );
    println!("  checksum {}", handle.checksum.dimmed());
    for record in &library.entries {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &SurrogateRecord) {
    println!(
        "{} {}",
        record.identity.to_string().yellow().bold(),
        record.type_tag.to_string().cyan()
    );
    for (name, value) in &record.fields {
        println!("    {name} = {}", format_value(value));
    }
}

fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Primitive(Primitive::Str(s)) => format!("{s:?}"),
        FieldValue::Primitive(Primitive::Bool(b)) => b.to_string(),
        FieldValue::Primitive(Primitive::Int(i)) => i.to_string(),
        FieldValue::Primitive(Primitive::Float(f)) => f.to_string(),
        FieldValue::Primitive(Primitive::Bytes(b)) => format!("<{} bytes>", b.len()),
        FieldValue::Primitive(other) => format!("{other:?}"),
        FieldValue::Value(v) => format!("{v:?}"),
        FieldValue::Ref(id) => format_identity(*id),
        FieldValue::RefList(ids) => {
            let items: Vec<_> = ids.iter().map(|id| format_identity(*id)).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

fn format_identity(id: Identity) -> String {
    if id.is_null() {
        "null".dimmed().to_string()
    } else {
        format!("&{id}").blue().to_string()
    }
}

fn handles_for(sl: &Facade, keys: &[String]) -> anyhow::Result<Vec<ShardHandle>> {
    if keys.is_empty() {
        return Ok(sl.shards("")?);
    }
    keys.iter()
        .map(|key| {
            let (_, handle) = read_library(sl.store(), key)
                .map_err(SdkError::from)?
                .ok_or_else(|| anyhow!("shard not found: {key}"))?;
            Ok(handle)
        })
        .collect()
}

fn cmd_verify(sl: &Facade, args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let handles = handles_for(sl, &args.keys)?;
    let report = sl.verify_shards(&handles)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} {} shards, {} records, {} references resolved",
            "✓".green().bold(),
            report.shards,
            report.records,
            report.references
        );
    }
    Ok(())
}

fn cmd_demo(sl: &mut Facade, args: DemoArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut world = World::new();
    let builtins = BuiltinAssets::install(&mut world);
    let roots = demo::build_scene(&mut world, &builtins, args.objects)?;

    let builtin_handles = sl.save_builtins(&world, &builtins)?;
    let scene_handles = sl.collect_and_save(&world, &roots, &args.scene)?;
    let root_ids: Vec<Identity> = roots
        .iter()
        .filter_map(|r| sl.identity_of(&args.scene, *r))
        .collect();

    if format == OutputFormat::Json {
        let out = json!({
            "builtins": builtin_handles,
            "scene": scene_handles,
            "roots": root_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} Saved demo scene to {}", "✓".green().bold(), args.scene.bold());
    for handle in builtin_handles.iter().chain(&scene_handles) {
        println!("  {} ({} records)", handle.key, handle.records);
    }
    let roots: Vec<_> = root_ids.iter().map(|id| id.to_string()).collect();
    println!("  roots: {}", roots.join(" ").yellow());
    Ok(())
}

fn cmd_load(sl: &mut Facade, args: LoadArgs, format: OutputFormat) -> anyhow::Result<()> {
    let handles = handles_for(sl, &args.keys)?;
    let mut world = World::new();
    let roots = sl.load_shards(&mut world, &handles, &args.identities)?;

    let mut by_type: BTreeMap<&'static str, usize> = BTreeMap::new();
    for id in world.ids() {
        if let Some(ty) = world.runtime_type(id) {
            *by_type.entry(ty.short_name()).or_default() += 1;
        }
    }
    let root_names: Vec<String> = roots
        .iter()
        .filter_map(|r| world.get(*r).map(|o| o.name().to_string()))
        .collect();

    if format == OutputFormat::Json {
        let out = json!({
            "objects": world.len(),
            "types": by_type,
            "roots": root_names,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{} Loaded {} objects from {} shards",
        "✓".green().bold(),
        world.len(),
        handles.len()
    );
    for (ty, count) in &by_type {
        println!("  {count:>5}  {ty}");
    }
    println!("  roots: {}", root_names.join(", ").yellow());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(root: &std::path::Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["rtsl", "--root", root.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn demo_then_inspect_verify_and_load() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["demo", "--objects", "3"]).unwrap();
        run(dir.path(), &["ls"]).unwrap();
        run(dir.path(), &["ls", "Scenes", "--format", "json"]).unwrap();
        run(dir.path(), &["show", "Scenes/Demo/SceneAssetLibrary"]).unwrap();
        run(dir.path(), &["verify"]).unwrap();
        run(
            dir.path(),
            &[
                "load",
                "BuiltInAssets/BuiltInAssetLibrary",
                "Scenes/Demo/SceneAssetLibrary",
                "--identity",
                "1:1",
            ],
        )
        .unwrap();
    }

    #[test]
    fn verify_without_builtins_reports_dangling_reference() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["demo"]).unwrap();
        let err = run(dir.path(), &["verify", "Scenes/Demo/SceneAssetLibrary"]).unwrap_err();
        let kind = err.downcast_ref::<SdkError>().map(|e| e.kind());
        assert_eq!(kind, Some(rtsl_sdk::ErrorKind::DanglingReference));
    }

    #[test]
    fn missing_shard_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["show", "Nope/Lib"]).is_err());
    }

    #[test]
    fn config_file_limits_shards() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("rtsl.toml");
        std::fs::write(&config, "max_assets = 1").unwrap();
        let err = run(
            dir.path(),
            &["demo", "--config", config.to_str().unwrap()],
        )
        .unwrap_err();
        let kind = err.downcast_ref::<SdkError>().map(|e| e.kind());
        assert_eq!(kind, Some(rtsl_sdk::ErrorKind::CapacityExceeded));
    }
}

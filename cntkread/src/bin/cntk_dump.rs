use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use cntkread::{critical, Model, ModelLoader, RootRole, Settings};

#[derive(Debug, Default)]
struct Args {
    model: PathBuf,
    settings: Option<PathBuf>,
    limit: Option<usize>,
    values: bool,
}

fn usage() -> String {
    "usage: cntk-dump <model> [--settings FILE] [--limit N] [--values]".to_string()
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut model = None;
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--settings" => {
                let path = raw.next().ok_or_else(|| anyhow!("--settings needs a path"))?;
                args.settings = Some(PathBuf::from(path));
            }
            "--limit" => {
                let value = raw.next().ok_or_else(|| anyhow!("--limit needs a value"))?;
                let limit = value
                    .parse::<usize>()
                    .with_context(|| format!("parse --limit {}", value))?;
                args.limit = Some(limit);
            }
            "--values" => args.values = true,
            "-h" | "--help" => return Err(anyhow!(usage())),
            other if other.starts_with("--") => return Err(anyhow!("unknown flag {}", other)),
            other => {
                if model.replace(PathBuf::from(other)).is_some() {
                    return Err(anyhow!("only one model path is accepted"));
                }
            }
        }
    }
    args.model = model.ok_or_else(|| anyhow!(usage()))?;
    Ok(args)
}

#[derive(Serialize)]
struct NodeSummary<'a> {
    name: &'a str,
    operator: &'a str,
    inputs: Vec<String>,
    attributes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct InitializerSummary<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    tensor_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Summary<'a> {
    format: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    roots: serde_json::Map<String, serde_json::Value>,
    nodes: Vec<NodeSummary<'a>>,
    initializers: Vec<InitializerSummary<'a>>,
}

fn summarize<'a>(model: &'a Model, settings: &Settings) -> Result<Summary<'a>> {
    let graph = model.graph();
    let mut roots = serde_json::Map::new();
    for role in RootRole::ALL {
        let names = model.network().roots(role);
        if !names.is_empty() {
            roots.insert(serde_json::to_string(&role)?.trim_matches('"').to_string(), names.into());
        }
    }
    let nodes = graph
        .nodes
        .iter()
        .map(|node| -> Result<NodeSummary<'a>> {
            let mut attributes = serde_json::Map::new();
            for attr in node.attributes.iter().filter(|attr| attr.visible) {
                attributes.insert(attr.name.clone(), serde_json::to_value(&attr.value)?);
            }
            Ok(NodeSummary {
                name: &node.name,
                operator: &node.operator,
                inputs: node
                    .inputs
                    .iter()
                    .flat_map(|arg| arg.connections.iter().map(|conn| conn.id.clone()))
                    .collect(),
                attributes,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut values = if settings.include_values {
        model.materialize_initializers(settings.display_limit)
    } else {
        Vec::new()
    }
    .into_iter();
    let mut initializers = Vec::with_capacity(graph.initializers.len());
    for tensor in &graph.initializers {
        let value = match values.next() {
            Some((_, Ok(decoded))) => Some(serde_json::to_value(&decoded.value)?),
            _ => None,
        };
        initializers.push(InitializerSummary {
            name: tensor.name(),
            tensor_type: tensor.tensor_type().to_string(),
            state: tensor.state().map(|state| state.to_string()),
            value,
        });
    }

    Ok(Summary {
        format: model.format(),
        inputs: graph.inputs.iter().map(|arg| arg.name.clone()).collect(),
        outputs: graph.outputs.iter().map(|arg| arg.name.clone()).collect(),
        roots,
        nodes,
        initializers,
    })
}

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let mut settings = Settings::load(args.settings.as_deref())?;
    if let Some(limit) = args.limit {
        settings.display_limit = limit;
    }
    settings.include_values |= args.values;

    let loader = ModelLoader::open(&args.model)?;
    let summary = summarize(loader.model(), &settings)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            critical!("cntk-dump: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
